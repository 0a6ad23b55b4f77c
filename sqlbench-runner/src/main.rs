//! Command line entry point of the benchmark.
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

use anyhow::Result;

fn main() -> Result<()> {
    sqlbench_runner::cli::execute()
}
