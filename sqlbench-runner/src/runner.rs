//! Orchestration of a benchmark run across transports.
//!
//! A run loads the dataset once, then opens a fresh connection per transport and runs the
//! configured drivers over it in order. A failure only ends the transport it happened on: the
//! connection is released and the run continues with the next transport.

use sqlbench_store::{ConnectTarget, Connector, Transport};
use sqlbench_workload::{Dataset, Schema, Throughput};

use crate::driver::{DriverContext, DriverKind, DriverReport, Lookup, generate_lookups, run_driver};
use crate::error::{BenchError, BenchResult};
use crate::load::load_dataset;

/// How to load the dataset before benchmarking.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadPlan {
    /// The transport used for loading.
    pub transport: Transport,
    /// Records per `INSERT` statement.
    pub batch_size: usize,
}

/// What a run does.
#[derive(Clone, Debug, PartialEq)]
pub struct Plan {
    /// Loads the dataset first if set.
    pub load: Option<LoadPlan>,
    /// Transports to benchmark, in order.
    pub transports: Vec<Transport>,
    /// Drivers to run over each transport, in order.
    pub drivers: Vec<DriverKind>,
    /// Iterations of the `SELECT 1` drivers.
    pub small_tx_iterations: u64,
    /// Requests issued by the lookup driver.
    pub lookup_count: usize,
    /// Skew of the lookup key distribution.
    pub zipf_skew: f64,
    /// Seed of the lookup requests.
    pub seed: u64,
}

/// Results of the drivers run over one transport.
#[derive(Debug)]
pub struct TransportReport {
    /// The transport.
    pub transport: Transport,
    /// Drivers that completed, in the order they ran.
    pub drivers: Vec<DriverReport>,
    /// The failure that ended this transport early, if any.
    pub error: Option<BenchError>,
}

impl TransportReport {
    /// Returns `true` if every driver completed.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Results of a whole run.
#[derive(Debug)]
pub struct RunReport {
    /// Outcome of the load phase, if it ran.
    pub load: Option<BenchResult<Throughput>>,
    /// Drivers skipped for the whole run, and why.
    pub skipped: Vec<(DriverKind, String)>,
    /// One report per benchmarked transport, in order.
    pub transports: Vec<TransportReport>,
}

/// Runs `plan` against the database reachable through `connector`.
///
/// `dataset` must be the dataset described by `schema`. It is inserted by the load phase and
/// serves as the oracle for lookups.
pub fn run(
    connector: &dyn Connector,
    target: &ConnectTarget,
    dataset: &Dataset,
    schema: &Schema,
    plan: &Plan,
) -> RunReport {
    let mut drivers = plan.drivers.clone();
    let mut skipped = Vec::new();

    let load = plan.load.map(|load| {
        let result = load_over(connector, target, dataset, schema, load);
        if let Err(ref error) = result {
            tracing::error!(
                error = error as &dyn std::error::Error,
                "failed to load the dataset, skipping drivers that read it"
            );
            drivers.retain(|kind| {
                let keep = !kind.needs_dataset();
                if !keep {
                    skipped.push((*kind, "the dataset could not be loaded".to_owned()));
                }
                keep
            });
        }
        result
    });

    let lookups = prepare_lookups(dataset, plan, &mut drivers, &mut skipped);
    let ctx = DriverContext {
        dataset,
        schema,
        small_tx_iterations: plan.small_tx_iterations,
        lookups: &lookups,
    };

    let transports = plan
        .transports
        .iter()
        .map(|&transport| run_transport(connector, target, transport, &drivers, &ctx))
        .collect();

    RunReport {
        load,
        skipped,
        transports,
    }
}

fn load_over(
    connector: &dyn Connector,
    target: &ConnectTarget,
    dataset: &Dataset,
    schema: &Schema,
    load: LoadPlan,
) -> BenchResult<Throughput> {
    tracing::info!(
        transport = %load.transport,
        rows = dataset.len(),
        "loading the dataset"
    );

    let mut conn = connector.connect(load.transport, target)?;
    let throughput = load_dataset(conn.as_mut(), dataset, schema, load.batch_size)?;
    conn.close()?;

    Ok(throughput)
}

fn prepare_lookups(
    dataset: &Dataset,
    plan: &Plan,
    drivers: &mut Vec<DriverKind>,
    skipped: &mut Vec<(DriverKind, String)>,
) -> Vec<Lookup> {
    if !drivers.contains(&DriverKind::Lookup) {
        return Vec::new();
    }

    match generate_lookups(dataset, plan.zipf_skew, plan.seed, plan.lookup_count) {
        Ok(lookups) => lookups,
        Err(error) => {
            tracing::error!(
                error = &error as &dyn std::error::Error,
                "failed to generate lookup keys"
            );
            drivers.retain(|&kind| kind != DriverKind::Lookup);
            skipped.push((DriverKind::Lookup, error.to_string()));
            Vec::new()
        }
    }
}

fn run_transport(
    connector: &dyn Connector,
    target: &ConnectTarget,
    transport: Transport,
    drivers: &[DriverKind],
    ctx: &DriverContext<'_>,
) -> TransportReport {
    let mut report = TransportReport {
        transport,
        drivers: Vec::with_capacity(drivers.len()),
        error: None,
    };

    let mut conn = match connector.connect(transport, target) {
        Ok(conn) => conn,
        Err(error) => {
            tracing::warn!(
                %transport,
                error = &error as &dyn std::error::Error,
                "failed to connect, skipping transport"
            );
            report.error = Some(error.into());
            return report;
        }
    };

    for &kind in drivers {
        match run_driver(kind, conn.as_mut(), ctx) {
            Ok(driver) => report.drivers.push(driver),
            Err(error) => {
                tracing::error!(
                    %transport,
                    driver = %kind,
                    error = &error as &dyn std::error::Error,
                    "benchmark failed, skipping transport"
                );
                report.error = Some(error);
                break;
            }
        }
    }

    if let Err(error) = conn.close() {
        tracing::warn!(
            %transport,
            error = &error as &dyn std::error::Error,
            "failed to close connection"
        );
    }

    report
}
