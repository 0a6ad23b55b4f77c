//! The `sqlbench` command line.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use argh::FromArgs;
use sqlbench_store::{Connector, MemoryConnector, MysqlConnector};
use sqlbench_workload::{Dataset, Schema};

use crate::config::{Backend, Config};
use crate::{observability, runner};

/// Database client microbenchmark.
///
/// Loads a synthetic dataset and measures round trips, zipfian point lookups and table scans over
/// every configured transport.
#[derive(Debug, FromArgs)]
struct Args {
    /// path to the YAML configuration file
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    /// database user
    #[argh(positional)]
    user: String,

    /// password of the database user
    #[argh(positional)]
    password: String,

    /// default database
    #[argh(positional)]
    database: Option<String>,

    /// server host for TCP connections
    #[argh(positional)]
    host: Option<String>,
}

/// Parses the command line and runs the benchmark.
///
/// Fails only if the configuration or the dataset are invalid. Failures of individual transports
/// are part of the printed report.
pub fn execute() -> Result<()> {
    let args: Args = argh::from_env();
    let config = Config::load(args.config.as_deref())?;

    observability::init_tracing(&config.logging);
    tracing::debug!(?config);

    let dataset = Arc::new(Dataset::build(config.dataset_params())?);
    let schema = Schema::for_dataset(config.table.as_str(), &dataset);
    let target = config.connect_target(args.user, args.password, args.database, args.host);

    let connector: Box<dyn Connector> = match config.backend {
        Backend::Mysql { .. } => Box::new(MysqlConnector),
        Backend::Memory => Box::new(MemoryConnector::new(Arc::clone(&dataset), schema.clone())),
    };
    tracing::info!(backend = connector.name(), "starting benchmark");

    let report = runner::run(
        connector.as_ref(),
        &target,
        &dataset,
        &schema,
        &config.plan(),
    );
    report.print();

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn parses_positionals() {
        let args = Args::from_args(
            &["sqlbench"],
            &["-c", "bench.yml", "root", "hunter2", "ycsb", "db.local"],
        )
        .unwrap();

        assert_eq!(args.config.as_deref(), Some(Path::new("bench.yml")));
        assert_eq!(args.user, "root");
        assert_eq!(args.password, "hunter2");
        assert_eq!(args.database.as_deref(), Some("ycsb"));
        assert_eq!(args.host.as_deref(), Some("db.local"));
    }

    #[test]
    fn database_and_host_are_optional() {
        let args = Args::from_args(&["sqlbench"], &["root", ""]).unwrap();

        assert_eq!(args.config, None);
        assert_eq!(args.password, "");
        assert_eq!(args.database, None);
        assert_eq!(args.host, None);
    }

    #[test]
    fn requires_user_and_password() {
        let exit = Args::from_args(&["sqlbench"], &["root"]).unwrap_err();
        assert_eq!(exit.status, Err(()));

        let exit = Args::from_args(&["sqlbench"], &[]).unwrap_err();
        assert_eq!(exit.status, Err(()));
    }

    #[test]
    fn help_exits_successfully() {
        let exit = Args::from_args(&["sqlbench"], &["--help"]).unwrap_err();
        assert_eq!(exit.status, Ok(()));
        assert!(exit.output.contains("database user"));
    }
}
