use tracing_subscriber::EnvFilter;

/// Targets that log at full verbosity unless `RUST_LOG` says otherwise.
const TARGETS: &[&str] = &["sqlbench_runner", "sqlbench_store", "sqlbench_workload"];

/// Installs a test-friendly subscriber once per test binary.
///
/// Output goes through the test harness's capture, so it only shows up for failing tests or with
/// `--nocapture`. `RUST_LOG` replaces the default filter when set.
///
/// # Example
///
/// ```
/// sqlbench_test::tracing::init();
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        TARGETS
            .iter()
            .filter_map(|target| format!("{target}=TRACE").parse().ok())
            .fold(EnvFilter::new("WARN"), EnvFilter::add_directive)
    });

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_test_writer()
        .compact()
        .try_init()
        .ok();
}
