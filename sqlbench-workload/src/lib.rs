//! Synthetic workload generation for database client microbenchmarks.
//!
//! This crate contains everything that decides *what* a benchmark run sends to the database and
//! how long it took, independent of the client library used to talk to it:
//!
//! - [`Prng`](rng::Prng), a seedable generator shared by all components,
//! - [`ZipfSampler`](zipf::ZipfSampler), which draws keys with a *zipfian* skew so that a few
//!   "hot" keys receive most of the lookups,
//! - [`Dataset`](dataset::Dataset), a YCSB-style table of fixed-width records that is loaded into
//!   the database and later serves as the oracle for validating what the database returns,
//! - [`Schema`](schema::Schema), the table layout and statement texts,
//! - [`measure`](bench::measure), the timing harness.
//!
//! All generation is deterministic for a given seed, so two runs with the same configuration issue
//! the same operations against the same data.
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod bench;
pub mod dataset;
pub mod rng;
pub mod schema;
pub mod zipf;

pub use crate::bench::{Throughput, measure, try_measure};
pub use crate::dataset::{Dataset, DatasetParams, Record};
pub use crate::rng::Prng;
pub use crate::schema::Schema;
pub use crate::zipf::ZipfSampler;

/// Identifier of a record, dense in `[0, tuple_count)`.
pub type Key = u64;
