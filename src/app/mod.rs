//! Simulator application modules.
//!
//! This module provides the synthetic load driver, progress logging, shutdown
//! handling, and statistics printing used by the CLI binary.

pub mod logging;
pub mod shutdown;
pub mod simulation;
pub mod statistics;

// Re-export public API
pub use shutdown::cancel_on_ctrl_c;
pub use simulation::{run_simulation, SimulationPlan, SimulationReport};
pub use statistics::print_final_statistics;
