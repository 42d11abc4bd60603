//! mpchain - runner for the Millepede detector-alignment calibration chain

pub mod cli;
pub mod core;
pub mod execution;

// Re-export commonly used types
pub use core::config::ChainConfig;
pub use core::workspace::seed_workspace;
pub use core::{millepede_chain, ChainError, ChainRun, RunPaths, RunState, RunStatus};
pub use core::{CommandSpec, OutputRedirect, StepAction, StepDescriptor, StepStatus};
pub use execution::{EventHandler, ExecutionEngine, ExecutionEvent};
pub use execution::{ProcessStepRunner, StepOutcome, StepRunner};
