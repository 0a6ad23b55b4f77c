//! Configuration for benchmark runs.
//!
//! Configuration can be loaded from multiple sources with the following precedence (highest to
//! lowest):
//!
//! 1. Environment variables (prefixed with `SQLBENCH__`)
//! 2. YAML configuration file (specified via `-c` or `--config` flag)
//! 3. Defaults
//!
//! Connection credentials are not part of the configuration, they are passed on the command line.
//!
//! # Environment Variables
//!
//! Environment variables use `SQLBENCH__` as a prefix and double underscores (`__`) to denote
//! nested configuration structures. For example:
//!
//! - `SQLBENCH__TUPLE_COUNT=1000` shrinks the dataset
//! - `SQLBENCH__BACKEND__TYPE=memory` benchmarks the in-memory loopback store
//! - `SQLBENCH__LOGGING__LEVEL=debug` enables debug logs
//!
//! # YAML Configuration File
//!
//! ```yaml
//! tuple_count: 1000
//! transports: [tcp, socket]
//!
//! backend:
//!   type: mysql
//!   port: 3307
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::Result;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};
use sqlbench_store::{ConnectTarget, Transport};
use sqlbench_workload::DatasetParams;
use sqlbench_workload::rng::DEFAULT_SEED;
use sqlbench_workload::schema::DEFAULT_TABLE;
use sqlbench_workload::zipf::DEFAULT_SKEW;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::driver::DriverKind;
use crate::runner::{LoadPlan, Plan};

/// Environment variable prefix for all configuration options.
const ENV_PREFIX: &str = "SQLBENCH__";

/// The database to benchmark.
///
/// The `type` field in YAML or `__TYPE` in environment variables determines which variant is used.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Backend {
    /// A MySQL server (type `"mysql"`).
    ///
    /// The host is given on the command line. The port and socket default to the client's
    /// defaults.
    Mysql {
        /// TCP port of the server.
        port: Option<u16>,
        /// Path of the Unix socket, or name of the Windows named pipe.
        socket: Option<String>,
    },

    /// The in-memory loopback store (type `"memory"`).
    ///
    /// Serves the generated dataset from memory without a server. Useful to measure the overhead
    /// of the harness itself.
    Memory,
}

impl Default for Backend {
    fn default() -> Self {
        Self::Mysql {
            port: None,
            socket: None,
        }
    }
}

/// Log output format.
///
/// Parsed case-insensitively. The format can be explicitly specified or auto-detected based on
/// whether stderr is a TTY.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum LogFormat {
    /// Auto detect the best format.
    ///
    /// This chooses [`LogFormat::Pretty`] for TTY, otherwise [`LogFormat::Simplified`].
    Auto,

    /// Compact output with colors.
    Pretty,

    /// Plain text output without colors.
    Simplified,

    /// JSON lines.
    Json,
}

impl LogFormat {
    const ALL: [LogFormat; 4] = [
        LogFormat::Auto,
        LogFormat::Pretty,
        LogFormat::Simplified,
        LogFormat::Json,
    ];

    fn as_str(self) -> &'static str {
        match self {
            LogFormat::Auto => "auto",
            LogFormat::Pretty => "pretty",
            LogFormat::Simplified => "simplified",
            LogFormat::Json => "json",
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A log format name that is not one of [`LogFormat`]'s variants.
#[derive(Debug, Error)]
#[error("unknown log format {0:?}, expected auto, pretty, simplified or json")]
pub struct UnknownLogFormat(String);

impl FromStr for LogFormat {
    type Err = UnknownLogFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|format| s.eq_ignore_ascii_case(format.as_str()))
            .ok_or_else(|| UnknownLogFormat(s.to_owned()))
    }
}

mod display_fromstr {
    pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
        T: std::fmt::Display,
    {
        serializer.collect_str(&value)
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        D: serde::Deserializer<'de>,
        T: std::str::FromStr,
        <T as std::str::FromStr>::Err: std::fmt::Display,
    {
        use serde::Deserialize;
        let s = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Logging configuration.
///
/// Logs are always written to stderr, benchmark results to stdout.
#[derive(Debug, Deserialize, Serialize)]
pub struct Logging {
    /// Minimum log level to output.
    ///
    /// The `RUST_LOG` environment variable provides more granular control per module if needed.
    /// Progress of the dataset load is logged at `INFO`.
    ///
    /// # Default
    ///
    /// `INFO`
    ///
    /// # Environment Variable
    ///
    /// `SQLBENCH__LOGGING__LEVEL`
    #[serde(with = "display_fromstr")]
    pub level: LevelFilter,

    /// Log output format, see [`LogFormat`].
    ///
    /// # Default
    ///
    /// `Auto`
    ///
    /// # Environment Variable
    ///
    /// `SQLBENCH__LOGGING__FORMAT`
    #[serde(with = "display_fromstr")]
    pub format: LogFormat,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: LevelFilter::INFO,
            format: LogFormat::Auto,
        }
    }
}

/// Benchmark configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Number of records in the dataset.
    ///
    /// # Default
    ///
    /// `100000`
    pub tuple_count: u64,

    /// Number of payload columns per record.
    ///
    /// # Default
    ///
    /// `10`
    pub field_count: usize,

    /// Width of every payload column in bytes.
    ///
    /// # Default
    ///
    /// `100`
    pub field_width: usize,

    /// Seed for dataset generation and lookup keys.
    ///
    /// Runs with the same seed and dataset shape issue identical operations.
    pub seed: u64,

    /// Skew of the zipfian key distribution used for lookups. `0` is uniform.
    ///
    /// # Default
    ///
    /// `0.99`
    pub zipf_skew: f64,

    /// Iterations of the `SELECT 1` round trip benchmarks.
    ///
    /// # Default
    ///
    /// `1000000`
    pub small_tx_iterations: u64,

    /// Number of keyed lookups per transport.
    ///
    /// # Default
    ///
    /// `100000`
    pub lookup_count: usize,

    /// Number of records per `INSERT` statement when loading the dataset.
    ///
    /// # Default
    ///
    /// `1000`
    pub insert_batch_size: usize,

    /// Name of the benchmark table.
    ///
    /// # Default
    ///
    /// `"usertable"`
    pub table: String,

    /// Whether to (re)create and load the benchmark table before running.
    ///
    /// When disabled, the table is expected to hold the dataset of a previous run with the same
    /// seed and shape.
    ///
    /// # Default
    ///
    /// `true`
    pub load: bool,

    /// The transport used to load the dataset.
    ///
    /// # Default
    ///
    /// `tcp`
    pub load_transport: Transport,

    /// Transports to benchmark, in order.
    ///
    /// # Default
    ///
    /// `[tcp, shared_memory, named_pipe, socket]`
    pub transports: Vec<Transport>,

    /// Benchmarks to run over each transport, in order.
    ///
    /// # Default
    ///
    /// `[small_query, prepared, lookup, scan]`
    pub drivers: Vec<DriverKind>,

    /// The database to benchmark, see [`Backend`].
    pub backend: Backend,

    /// Logging configuration, see [`Logging`].
    pub logging: Logging,
}

impl Default for Config {
    fn default() -> Self {
        let dataset = DatasetParams::default();

        Self {
            tuple_count: dataset.tuple_count,
            field_count: dataset.field_count,
            field_width: dataset.field_width,
            seed: DEFAULT_SEED,
            zipf_skew: DEFAULT_SKEW,
            small_tx_iterations: 1_000_000,
            lookup_count: 100_000,
            insert_batch_size: 1000,
            table: DEFAULT_TABLE.to_owned(),
            load: true,
            load_transport: Transport::Tcp,
            transports: Transport::ALL.to_vec(),
            drivers: DriverKind::ALL.to_vec(),
            backend: Backend::default(),
            logging: Logging::default(),
        }
    }
}

impl Config {
    /// Loads configuration from the provided arguments.
    ///
    /// Configuration is merged in the following order (later sources override earlier ones):
    /// 1. Default values
    /// 2. YAML configuration file (if provided)
    /// 3. Environment variables (prefixed with `SQLBENCH__`)
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = figment::Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        let config = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        Ok(config)
    }

    /// Shape and seed of the dataset.
    pub fn dataset_params(&self) -> DatasetParams {
        DatasetParams {
            tuple_count: self.tuple_count,
            field_count: self.field_count,
            field_width: self.field_width,
            seed: self.seed,
        }
    }

    /// What to run, independent of where.
    pub fn plan(&self) -> Plan {
        Plan {
            load: self.load.then_some(LoadPlan {
                transport: self.load_transport,
                batch_size: self.insert_batch_size,
            }),
            transports: self.transports.clone(),
            drivers: self.drivers.clone(),
            small_tx_iterations: self.small_tx_iterations,
            lookup_count: self.lookup_count,
            zipf_skew: self.zipf_skew,
            seed: self.seed,
        }
    }

    /// Combines the credentials from the command line with the backend's connection settings.
    ///
    /// Empty strings are treated as absent.
    pub fn connect_target(
        &self,
        user: String,
        password: String,
        database: Option<String>,
        host: Option<String>,
    ) -> ConnectTarget {
        let mut target = ConnectTarget::new(user, password);
        target.database = database.filter(|database| !database.is_empty());
        target.host = host.filter(|host| !host.is_empty());

        if let Backend::Mysql { port, socket } = &self.backend {
            target.port = *port;
            target.socket = socket.clone();
        }

        target
    }
}
