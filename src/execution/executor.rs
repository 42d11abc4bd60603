//! Step executor - spawns the external Millepede tools

use crate::core::paths::resolve_in;
use crate::core::step::{CommandSpec, OutputRedirect, StepAction, StepDescriptor};
use async_trait::async_trait;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Outcome of running a single step
#[derive(Debug, Clone)]
pub enum StepOutcome {
    /// Exit status zero; `stdout` is whatever the tool printed, uninspected
    Success { stdout: String },
    /// Anything else: non-zero exit, spawn failure, timeout, failed copy.
    /// `exit_code` is `None` when the step died without one.
    Failed {
        exit_code: Option<i32>,
        stderr: String,
    },
}

/// Trait for running one step; lets tests swap out the process launcher
#[async_trait]
pub trait StepRunner: Send + Sync {
    /// Run `step` with `work_dir` as its working directory.
    ///
    /// Success is decided by exit status alone; the step's output text is
    /// captured but never interpreted.
    async fn run_step(&self, step: &StepDescriptor, work_dir: &Path) -> StepOutcome;
}

/// Runs steps as real subprocesses inside the working directory
#[derive(Debug, Clone, Default)]
pub struct ProcessStepRunner {
    /// Optional wall-clock limit per step
    step_timeout: Option<Duration>,
}

impl ProcessStepRunner {
    pub fn new() -> Self {
        Self { step_timeout: None }
    }

    /// Fail any step that runs longer than `limit`; the child is killed
    pub fn with_timeout(mut self, limit: Duration) -> Self {
        self.step_timeout = Some(limit);
        self
    }

    async fn run_command(&self, spec: &CommandSpec, work_dir: &Path) -> StepOutcome {
        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .current_dir(work_dir)
            .kill_on_drop(true);

        // Wire `<`, `>` and `>>` as real file descriptors. Redirected stdout
        // bypasses capture entirely, exactly as a shell would arrange it.
        if let Some(path) = &spec.stdin {
            match File::open(resolve_in(work_dir, path)) {
                Ok(file) => {
                    command.stdin(Stdio::from(file));
                }
                Err(err) => return redirect_failure("stdin", path, err),
            }
        }
        match &spec.stdout {
            Some(OutputRedirect::Truncate(path)) => {
                match File::create(resolve_in(work_dir, path)) {
                    Ok(file) => {
                        command.stdout(Stdio::from(file));
                    }
                    Err(err) => return redirect_failure("stdout", path, err),
                }
            }
            Some(OutputRedirect::Append(path)) => {
                let opened = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(resolve_in(work_dir, path));
                match opened {
                    Ok(file) => {
                        command.stdout(Stdio::from(file));
                    }
                    Err(err) => return redirect_failure("stdout", path, err),
                }
            }
            None => {
                command.stdout(Stdio::piped());
            }
        }
        // No tool reads the terminal; without a `<` the child sees EOF
        if spec.stdin.is_none() {
            command.stdin(Stdio::null());
        }
        command.stderr(Stdio::piped());

        debug!("spawning {} in {}", spec.program.display(), work_dir.display());

        // Spawn and wait directly; Command::output() would re-pipe stdout
        // unconditionally and disconnect the redirect files
        let child = match command.spawn() {
            Ok(child) => child,
            Err(err) => {
                return StepOutcome::Failed {
                    exit_code: None,
                    stderr: format!("failed to launch {}: {}", spec.program.display(), err),
                }
            }
        };

        let waited = match self.step_timeout {
            Some(limit) => match timeout(limit, child.wait_with_output()).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(
                        "{} exceeded the step timeout of {}s",
                        spec.program.display(),
                        limit.as_secs()
                    );
                    return StepOutcome::Failed {
                        exit_code: None,
                        stderr: format!("timed out after {} seconds", limit.as_secs()),
                    };
                }
            },
            None => child.wait_with_output().await,
        };

        let output = match waited {
            Ok(output) => output,
            Err(err) => {
                return StepOutcome::Failed {
                    exit_code: None,
                    stderr: format!("failed to collect {}: {}", spec.program.display(), err),
                }
            }
        };

        if output.status.success() {
            StepOutcome::Success {
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            }
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(
                "{} exited with {:?}: {}",
                spec.program.display(),
                output.status.code(),
                stderr
            );
            StepOutcome::Failed {
                exit_code: output.status.code(),
                stderr,
            }
        }
    }

    fn run_copy(&self, from: &Path, to: &Path, work_dir: &Path) -> StepOutcome {
        let source = resolve_in(work_dir, from);
        let dest = resolve_in(work_dir, to);
        match fs::copy(&source, &dest) {
            Ok(bytes) => {
                debug!("copied {} bytes to {}", bytes, dest.display());
                StepOutcome::Success {
                    stdout: String::new(),
                }
            }
            Err(err) => StepOutcome::Failed {
                exit_code: None,
                stderr: format!(
                    "cannot copy {} to {}: {}",
                    from.display(),
                    to.display(),
                    err
                ),
            },
        }
    }
}

fn redirect_failure(stream: &str, path: &Path, err: io::Error) -> StepOutcome {
    StepOutcome::Failed {
        exit_code: None,
        stderr: format!("cannot open {} file {}: {}", stream, path.display(), err),
    }
}

#[async_trait]
impl StepRunner for ProcessStepRunner {
    async fn run_step(&self, step: &StepDescriptor, work_dir: &Path) -> StepOutcome {
        match &step.action {
            StepAction::Command(spec) => self.run_command(spec, work_dir).await,
            StepAction::CopyFile { from, to } => self.run_copy(from, to, work_dir),
        }
    }
}
