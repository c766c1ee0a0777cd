//! Final statistics printing.

use anyhow::{Context, Result};
use log::info;

use super::simulation::SimulationReport;

/// Prints the outcome of a simulation run.
///
/// JSON goes to stdout as a single document so it can be piped; the plain
/// format goes through the logger.
pub fn print_final_statistics(report: &SimulationReport, json: bool) -> Result<()> {
    if json {
        let rendered =
            serde_json::to_string_pretty(report).context("Failed to serialize statistics")?;
        println!("{rendered}");
        return Ok(());
    }

    info!(
        "Run statistics: admitted={}, succeeded={}, failed={}{}",
        report.admitted,
        report.succeeded,
        report.failed,
        if report.cancelled { " (cancelled)" } else { "" }
    );
    info!("Limiter: {}", report.stats);

    if !report.stats.errors_by_category.is_empty() {
        info!("Errors by category:");
        for (category, count) in &report.stats.errors_by_category {
            info!("   {}: {}", category, count);
        }
    }

    let rate = if report.elapsed_seconds > 0.0 {
        report.admitted as f64 / report.elapsed_seconds
    } else {
        0.0
    };
    println!(
        "✅ Admitted {} request{} in {:.1}s (~{:.2} req/sec), final interval {:?}",
        report.admitted,
        if report.admitted == 1 { "" } else { "s" },
        report.elapsed_seconds,
        rate,
        report.stats.current_interval
    );
    Ok(())
}
