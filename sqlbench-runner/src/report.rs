//! Human readable output of benchmark results.

use std::time::Duration;

use bytesize::ByteSize;
use sqlbench_workload::Throughput;
use yansi::Paint;

use crate::runner::{RunReport, TransportReport};

impl RunReport {
    /// Prints the results of the run to stdout.
    pub fn print(&self) {
        if let Some(load) = &self.load {
            println!();
            println!("{}", "## LOAD".bold());
            match load {
                Ok(throughput) => {
                    println!("{} ({} rows)", "INSERT:".bold().green(), throughput.operations.bold());
                    print_throughput(throughput);
                }
                Err(error) => println!("{}", format!("FAILED: {error}").bold().red()),
            }
        }

        for (kind, reason) in &self.skipped {
            println!("{}", format!("skipped {kind}: {reason}").yellow());
        }

        for transport in &self.transports {
            print_transport(transport);
        }

        let failed = self.transports.iter().filter(|t| !t.is_ok()).count();
        println!();
        println!(
            "{} {} of {} transports completed",
            "## TOTALS".bold(),
            (self.transports.len() - failed).bold(),
            self.transports.len()
        );
    }
}

fn print_transport(report: &TransportReport) {
    println!();
    println!("{} {}", "## Transport".bold(), report.transport.bold().blue());

    for driver in &report.drivers {
        println!(
            "{} ({} ops)",
            format!("{}:", driver.kind).bold().green(),
            driver.throughput.operations.bold()
        );
        print_throughput(&driver.throughput);
    }

    if let Some(error) = &report.error {
        println!("{}", format!("FAILED: {error}").bold().red());
    }
}

fn print_throughput(throughput: &Throughput) {
    let elapsed = Duration::from_secs_f64(throughput.elapsed.max(0.0));
    print!(
        "  {:.2?}, {:.2} operations/s",
        elapsed.bold(),
        throughput.ops_per_second().bold()
    );
    if throughput.bytes > 0 {
        let bytes_per_second = ByteSize::b(throughput.bytes_per_second() as u64);
        print!(", {:.2}/s", bytes_per_second.bold());
    }
    println!();
}
