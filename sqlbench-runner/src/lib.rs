//! Benchmark orchestration.
//!
//! This crate wires the workload generators of `sqlbench-workload` to a store from
//! `sqlbench-store`:
//!
//! - [`load`] inserts the generated dataset in batches,
//! - [`driver`] contains the individual benchmarks, from `SELECT 1` round trips to zipfian point
//!   lookups validated against the dataset,
//! - [`runner`] runs the drivers over every configured transport and collects a [`RunReport`],
//! - [`config`] and [`cli`] provide the `sqlbench` binary.
//!
//! Everything runs on the calling thread, one connection at a time.
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod cli;
pub mod config;
pub mod driver;
pub mod error;
pub mod load;
pub mod observability;
pub mod report;
pub mod runner;

pub use crate::error::{BenchError, BenchResult, ValidationError};
pub use crate::runner::{Plan, RunReport, run};
