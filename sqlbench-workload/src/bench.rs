//! Wall-clock timing of benchmark phases.
//!
//! The harness times exactly one invocation of an operation. Callers loop inside the operation
//! when they want the amortized cost per iteration, or time a single bulk operation when they want
//! bandwidth.

use std::time::Instant;

/// Runs `op` once on the calling thread and returns the elapsed seconds.
///
/// Uses the monotonic clock, so adjustments of the system time do not affect the result.
pub fn measure<F>(op: F) -> f64
where
    F: FnOnce(),
{
    let start = Instant::now();
    op();
    start.elapsed().as_secs_f64()
}

/// Runs the fallible `op` once and returns the elapsed seconds if it succeeded.
///
/// An error aborts the measurement and is returned as is.
pub fn try_measure<F, E>(op: F) -> Result<f64, E>
where
    F: FnOnce() -> Result<(), E>,
{
    let start = Instant::now();
    op()?;
    Ok(start.elapsed().as_secs_f64())
}

/// Operation and byte counts of a timed phase.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Throughput {
    /// The number of operations performed.
    pub operations: u64,
    /// The number of payload bytes transferred.
    pub bytes: u64,
    /// Elapsed wall-clock seconds.
    pub elapsed: f64,
}

impl Throughput {
    /// Operations per second, or `0.0` if no time elapsed.
    pub fn ops_per_second(&self) -> f64 {
        per_second(self.operations, self.elapsed)
    }

    /// Bytes per second, or `0.0` if no time elapsed.
    pub fn bytes_per_second(&self) -> f64 {
        per_second(self.bytes, self.elapsed)
    }
}

fn per_second(count: u64, elapsed: f64) -> f64 {
    if elapsed > 0.0 {
        count as f64 / elapsed
    } else {
        0.0
    }
}
