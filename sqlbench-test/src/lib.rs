//! Test utilities for the sqlbench crates.
//!
//! See the modules for all available utilities.

pub mod tracing;
