//! Chain error taxonomy

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Error types for a calibration chain run
#[derive(Debug, Error)]
pub enum ChainError {
    /// The input directory named on the command line does not exist
    #[error("input directory not found: {}", .path.display())]
    InputNotFound { path: PathBuf },

    /// Copying steering templates into the workspace failed
    #[error("failed to seed workspace from {}: {source}", .path.display())]
    Seed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A step was launched and did not finish with exit status zero.
    ///
    /// `exit_code` is `None` when the step died without one (killed by a
    /// signal, spawn failure, timeout, or a failed native copy).
    #[error("step {} `{name}` failed ({}): {stderr}", step_number(.index), describe_exit(.exit_code))]
    StepFailed {
        index: usize,
        name: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    /// A file a step declares as input was absent when the step was due
    #[error("step {} `{name}` requires missing input file: {}", step_number(.index), .path.display())]
    MissingInput {
        index: usize,
        name: String,
        path: PathBuf,
    },

    /// Ambient filesystem failure outside any particular step
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ChainError {
    /// Process exit status for this failure.
    ///
    /// A failed step's own exit code is passed through so schedulers see the
    /// same status the tool reported. Everything else maps to 1, except the
    /// usage error for a missing input directory which maps to 2.
    pub fn exit_code(&self) -> i32 {
        match self {
            ChainError::InputNotFound { .. } => 2,
            ChainError::StepFailed {
                exit_code: Some(code),
                ..
            } => *code,
            _ => 1,
        }
    }
}

// Steps are numbered from 1 in diagnostics, matching the tool names
fn step_number(index: &usize) -> usize {
    index + 1
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code".to_string(),
    }
}
