//! Run and step state models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Overall run status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// Chain has not started
    Pending,
    /// Step `step` (0-based) is currently active
    Running { step: usize },
    /// Every step finished with exit status zero
    Succeeded,
    /// Chain stopped at `step`; later steps never ran
    Failed {
        step: usize,
        exit_code: Option<i32>,
        stderr: String,
    },
}

/// State of a single step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StepStatus {
    /// Step has not run yet
    Pending,
    /// Step is currently running
    Running { started_at: DateTime<Utc> },
    /// Step finished with exit status zero
    Succeeded {
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        stdout: String,
    },
    /// Step failed; the chain stopped here
    Failed {
        started_at: DateTime<Utc>,
        failed_at: DateTime<Utc>,
        exit_code: Option<i32>,
        stderr: String,
    },
}

/// Overall run state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    /// Unique run ID
    pub run_id: Uuid,

    /// Current run status
    pub status: RunStatus,

    /// When execution started
    pub started_at: Option<DateTime<Utc>>,

    /// When execution succeeded or failed
    pub completed_at: Option<DateTime<Utc>>,

    /// Total number of steps in the chain
    pub total_steps: usize,
}

impl RunState {
    /// Create a new run state
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            status: RunStatus::Pending,
            started_at: None,
            completed_at: None,
            total_steps: 0,
        }
    }

    /// Mark the run as started
    pub fn start(&mut self, total_steps: usize) {
        self.status = RunStatus::Running { step: 0 };
        self.started_at = Some(Utc::now());
        self.total_steps = total_steps;
    }

    /// Record that step `step` is now active
    pub fn start_step(&mut self, step: usize) {
        self.status = RunStatus::Running { step };
    }

    /// Mark the run as succeeded
    pub fn complete(&mut self) {
        self.status = RunStatus::Succeeded;
        self.completed_at = Some(Utc::now());
    }

    /// Mark the run as failed at `step`
    pub fn fail(&mut self, step: usize, exit_code: Option<i32>, stderr: String) {
        self.status = RunStatus::Failed {
            step,
            exit_code,
            stderr,
        };
        self.completed_at = Some(Utc::now());
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}
