//! Execution engine - walks the chain in order and stops at the first failure

use crate::core::{
    chain::ChainRun,
    error::ChainError,
    paths::resolve_in,
    state::{RunStatus, StepStatus},
};
use crate::execution::executor::{StepOutcome, StepRunner};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

/// Events that occur during a chain run
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    RunStarted {
        run_id: Uuid,
        work_dir: PathBuf,
        total_steps: usize,
    },
    StepStarted {
        index: usize,
        name: String,
        command: String,
    },
    StepOutput {
        index: usize,
        name: String,
        stdout: String,
    },
    StepCompleted {
        index: usize,
        name: String,
    },
    StepFailed {
        index: usize,
        name: String,
        error: String,
    },
    RunCompleted {
        run_id: Uuid,
        status: RunStatus,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(ExecutionEvent) + Send + Sync>;

/// Chain execution engine.
///
/// Steps run strictly one at a time, in order. The first failure stops the
/// run; partial results stay in the working directory untouched so they can
/// be inspected, and a later run overwrites them.
pub struct ExecutionEngine<R> {
    runner: R,
    event_handlers: Vec<EventHandler>,
}

impl<R: StepRunner> ExecutionEngine<R> {
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            event_handlers: Vec::new(),
        }
    }

    /// Add an event handler. Handlers registered here see every event of any
    /// later `execute` call.
    pub fn add_event_handler<F>(&mut self, handler: F)
    where
        F: Fn(ExecutionEvent) + Send + Sync + 'static,
    {
        self.event_handlers.push(Arc::new(handler));
    }

    fn emit_event(&self, event: ExecutionEvent) {
        for handler in &self.event_handlers {
            handler(event.clone());
        }
    }

    /// Execute the whole chain
    pub async fn execute(&self, run: &mut ChainRun) -> Result<(), ChainError> {
        let run_id = run.state.run_id;

        info!(
            "starting calibration chain in {} ({})",
            run.work_dir.display(),
            run_id
        );
        self.emit_event(ExecutionEvent::RunStarted {
            run_id,
            work_dir: run.work_dir.clone(),
            total_steps: run.steps.len(),
        });

        run.state.start(run.steps.len());

        for index in 0..run.steps.len() {
            if let Err(err) = self.execute_step(run, index).await {
                self.emit_event(ExecutionEvent::RunCompleted {
                    run_id,
                    status: run.state.status.clone(),
                });
                return Err(err);
            }
        }

        run.state.complete();
        info!("calibration chain finished ({})", run_id);
        self.emit_event(ExecutionEvent::RunCompleted {
            run_id,
            status: run.state.status.clone(),
        });

        Ok(())
    }

    /// Execute a single step
    async fn execute_step(&self, run: &mut ChainRun, index: usize) -> Result<(), ChainError> {
        run.state.start_step(index);
        let step = match run.step(index).cloned() {
            Some(step) => step,
            None => {
                return Err(ChainError::StepFailed {
                    index,
                    name: format!("#{}", index + 1),
                    exit_code: None,
                    stderr: "step index out of range".to_string(),
                })
            }
        };

        // Every declared input must exist before the tool is launched;
        // failing here beats letting a tool grind on absent data.
        for input in &step.inputs {
            if !resolve_in(&run.work_dir, input).exists() {
                let err = ChainError::MissingInput {
                    index,
                    name: step.name.clone(),
                    path: input.clone(),
                };
                error!("{}", err);
                self.mark_step_failed(run, index, None, err.to_string());
                self.emit_event(ExecutionEvent::StepFailed {
                    index,
                    name: step.name.clone(),
                    error: err.to_string(),
                });
                return Err(err);
            }
        }

        info!(
            "step {}/{} {}: {}",
            index + 1,
            run.steps.len(),
            step.name,
            step.display_command()
        );
        if let Some(current) = run.step_mut(index) {
            current.state = StepStatus::Running {
                started_at: chrono::Utc::now(),
            };
        }
        self.emit_event(ExecutionEvent::StepStarted {
            index,
            name: step.name.clone(),
            command: step.display_command(),
        });

        match self.runner.run_step(&step, &run.work_dir).await {
            StepOutcome::Success { stdout } => {
                self.mark_step_success(run, index, stdout.clone());
                if !stdout.is_empty() {
                    self.emit_event(ExecutionEvent::StepOutput {
                        index,
                        name: step.name.clone(),
                        stdout,
                    });
                }
                self.emit_event(ExecutionEvent::StepCompleted {
                    index,
                    name: step.name.clone(),
                });
                Ok(())
            }
            StepOutcome::Failed { exit_code, stderr } => {
                let err = ChainError::StepFailed {
                    index,
                    name: step.name.clone(),
                    exit_code,
                    stderr: stderr.clone(),
                };
                error!("{}", err);
                self.mark_step_failed(run, index, exit_code, stderr);
                self.emit_event(ExecutionEvent::StepFailed {
                    index,
                    name: step.name.clone(),
                    error: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Mark a step as succeeded
    fn mark_step_success(&self, run: &mut ChainRun, index: usize, stdout: String) {
        if let Some(step) = run.step_mut(index) {
            let started_at = match &step.state {
                StepStatus::Running { started_at } => *started_at,
                _ => chrono::Utc::now(),
            };
            step.state = StepStatus::Succeeded {
                started_at,
                completed_at: chrono::Utc::now(),
                stdout,
            };
        }
    }

    /// Mark a step as failed and stop the run there
    fn mark_step_failed(
        &self,
        run: &mut ChainRun,
        index: usize,
        exit_code: Option<i32>,
        stderr: String,
    ) {
        if let Some(step) = run.step_mut(index) {
            let started_at = match &step.state {
                StepStatus::Running { started_at } => *started_at,
                _ => chrono::Utc::now(),
            };
            step.state = StepStatus::Failed {
                started_at,
                failed_at: chrono::Utc::now(),
                exit_code,
                stderr: stderr.clone(),
            };
        }
        run.state.fail(index, exit_code, stderr);
    }
}
