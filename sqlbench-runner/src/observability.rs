//! Log output setup.

use std::env;
use std::io::{self, IsTerminal};

use tracing::level_filters::LevelFilter;
use tracing_subscriber::registry::Registry;
use tracing_subscriber::{EnvFilter, Layer, prelude::*};

use crate::config::{LogFormat, Logging};

/// Installs the global subscriber, writing to stderr.
pub fn init_tracing(logging: &Logging) {
    let (level, env_filter) = parse_rust_log(logging.level);

    tracing_subscriber::registry()
        .with(format_layer(logging.format).with_filter(level))
        .with(env_filter)
        .init();
}

fn format_layer(format: LogFormat) -> Box<dyn Layer<Registry> + Send + Sync> {
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(true);

    let format = match format {
        LogFormat::Auto if io::stderr().is_terminal() => LogFormat::Pretty,
        LogFormat::Auto => LogFormat::Simplified,
        format => format,
    };

    match format {
        LogFormat::Pretty | LogFormat::Auto => layer.compact().boxed(),
        LogFormat::Simplified => layer.with_ansi(false).boxed(),
        LogFormat::Json => layer.json().flatten_event(true).boxed(),
    }
}

/// Returns the level to log at and the per-target filter.
///
/// A plain level in `RUST_LOG` overrides the configured level. Anything else in `RUST_LOG` is used
/// as the filter verbatim.
fn parse_rust_log(configured: LevelFilter) -> (LevelFilter, EnvFilter) {
    let level = match env::var(EnvFilter::DEFAULT_ENV) {
        Ok(value) => match value.parse::<LevelFilter>() {
            Ok(level) => level,
            Err(_) => return (LevelFilter::TRACE, EnvFilter::new(value)),
        },
        Err(_) => configured,
    };

    // This is the maximum verbosity that will be logged, we filter this down to `level`.
    let env_filter = EnvFilter::new(
        "INFO,\
        mysql=WARN,\
        sqlbench_runner=TRACE,\
        sqlbench_store=TRACE,\
        sqlbench_workload=TRACE,\
        ",
    );

    (level, env_filter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rust_log_overrides_level() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("RUST_LOG", "warn");
            let (level, _) = parse_rust_log(LevelFilter::DEBUG);
            assert_eq!(level, LevelFilter::WARN);

            jail.set_env("RUST_LOG", "sqlbench_store=debug");
            let (level, _) = parse_rust_log(LevelFilter::INFO);
            assert_eq!(level, LevelFilter::TRACE);

            Ok(())
        });
    }

    #[test]
    fn configured_level_without_rust_log() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            let (level, _) = parse_rust_log(LevelFilter::ERROR);
            assert_eq!(level, LevelFilter::ERROR);
            Ok(())
        });
    }
}
