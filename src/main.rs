//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `adaptive_throttle` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - User-facing output formatting
//!
//! The binary drives a limiter with synthetic traffic so its strategies can be
//! compared from the command line.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;
use tokio_util::sync::CancellationToken;

use adaptive_throttle::initialization::{init_logger_with, init_rate_limiter};
use adaptive_throttle::{
    cancel_on_ctrl_c, print_final_statistics, run_simulation, LimiterConfig, Opt, SimulationPlan,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Settings can also come from THROTTLE_* variables in a .env file
    if dotenvy::dotenv().is_err() {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    let opt = Opt::parse();

    init_logger_with(opt.log_level.clone().into(), opt.log_format.clone())
        .context("Failed to initialize logger")?;

    let limiter = init_rate_limiter(LimiterConfig::from(&opt));
    let plan = SimulationPlan {
        requests: opt.requests,
        concurrency: opt.concurrency,
        failure_rate: opt.failure_rate,
    };

    let cancel = CancellationToken::new();
    let signal_task = cancel_on_ctrl_c(cancel.clone());

    let report = run_simulation(limiter, plan, cancel.clone()).await;

    // Release the signal listener
    cancel.cancel();
    let _ = signal_task.await;

    if let Err(e) = print_final_statistics(&report, opt.json) {
        eprintln!("adaptive_throttle error: {:#}", e);
        process::exit(1);
    }
    Ok(())
}
