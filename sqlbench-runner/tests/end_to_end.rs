use std::sync::Arc;

use sqlbench_runner::driver::{DriverKind, generate_lookups, lookup};
use sqlbench_runner::runner::LoadPlan;
use sqlbench_runner::{BenchError, Plan, ValidationError, run};
use sqlbench_store::{ConnectTarget, Connector, MemoryConnector, StoreError, Transport};
use sqlbench_workload::{Dataset, DatasetParams, Prng, Schema, ZipfSampler};

const TUPLES: u64 = 1000;

fn dataset() -> (Arc<Dataset>, Schema) {
    sqlbench_test::tracing::init();

    let dataset = Dataset::build(DatasetParams {
        tuple_count: TUPLES,
        field_count: 10,
        field_width: 20,
        seed: 2024,
    })
    .unwrap();
    let schema = Schema::for_dataset("usertable", &dataset);
    (Arc::new(dataset), schema)
}

fn plan() -> Plan {
    Plan {
        load: Some(LoadPlan {
            transport: Transport::Tcp,
            batch_size: 100,
        }),
        transports: Transport::ALL.to_vec(),
        drivers: DriverKind::ALL.to_vec(),
        small_tx_iterations: 1000,
        lookup_count: 10_000,
        zipf_skew: 0.99,
        seed: 77,
    }
}

fn target() -> ConnectTarget {
    ConnectTarget::new("bench", "secret")
}

#[test]
fn zipf_keys_concentrate_on_hot_key() {
    let (dataset, _) = dataset();
    assert_eq!(dataset.len(), TUPLES);

    let mut sampler = ZipfSampler::new(dataset.len(), 0.99, Prng::new(1)).unwrap();
    let keys = sampler.generate_zipf_lookup_keys(100_000);

    let mut counts = vec![0usize; TUPLES as usize];
    for key in keys {
        counts[key as usize] += 1;
    }
    let hottest = counts.iter().copied().max().unwrap();
    assert!(hottest >= 5_000, "hottest key drawn {hottest} times");
}

#[test]
fn lookups_match_dataset() {
    let (dataset, schema) = dataset();
    let connector = MemoryConnector::new(Arc::clone(&dataset), schema.clone());
    let lookups = generate_lookups(&dataset, 0.99, 5, 100_000).unwrap();

    let mut conn = connector.connect(Transport::Tcp, &target()).unwrap();
    let throughput = lookup(conn.as_mut(), &dataset, &schema, &lookups).unwrap();
    conn.close().unwrap();

    assert_eq!(throughput.operations, 100_000);
    assert!(throughput.ops_per_second() > 0.0);
    assert_eq!(connector.open_statements(), 0);
}

#[test]
fn full_run_survives_unavailable_transport() {
    let (dataset, schema) = dataset();
    let connector = MemoryConnector::new(Arc::clone(&dataset), schema.clone())
        .without_transport(Transport::SharedMemory);

    let report = run(&connector, &target(), &dataset, &schema, &plan());

    assert!(matches!(report.load, Some(Ok(_))));
    assert_eq!(report.transports.len(), 4);
    for transport in &report.transports {
        if transport.transport == Transport::SharedMemory {
            assert!(matches!(
                transport.error,
                Some(BenchError::Store(StoreError::Connection(_)))
            ));
            assert!(transport.drivers.is_empty());
        } else {
            assert!(transport.is_ok(), "{:?}", transport.error);
            assert_eq!(transport.drivers.len(), DriverKind::ALL.len());
        }
    }

    assert_eq!(connector.open_connections(), 0);
    assert_eq!(connector.open_statements(), 0);
}

#[test]
fn corrupted_store_fails_validation() {
    let (dataset, schema) = dataset();
    let plan = plan();
    let first = generate_lookups(&dataset, plan.zipf_skew, plan.seed, 1).unwrap()[0];
    let connector = MemoryConnector::new(Arc::clone(&dataset), schema.clone())
        .corrupt(first.key, first.field);

    let report = run(&connector, &target(), &dataset, &schema, &plan);

    assert!(matches!(report.load, Some(Ok(_))));
    for transport in &report.transports {
        assert!(matches!(
            transport.error,
            Some(BenchError::Validation(ValidationError::Mismatch { key, field }))
                if key == first.key && field == first.field
        ));
    }

    assert_eq!(connector.open_connections(), 0);
    assert_eq!(connector.open_statements(), 0);
}
