//! Step domain model

use crate::core::state::StepStatus;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where a command's stdout goes when redirected to a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputRedirect {
    /// `> file`: create or truncate
    Truncate(PathBuf),
    /// `>> file`: create or append
    Append(PathBuf),
}

/// An external program invocation with explicit file redirections.
///
/// Arguments go to the program verbatim; no shell is involved anywhere.
/// `stdin` and `stdout` reproduce `<`, `>` and `>>` at the file-descriptor
/// level, with relative paths resolved against the working directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Program to spawn, bare name (PATH lookup) or absolute path
    pub program: PathBuf,

    /// Plain arguments, in order
    pub args: Vec<String>,

    /// File fed to the program's stdin, if any
    pub stdin: Option<PathBuf>,

    /// Where the program's stdout goes; captured when `None`
    pub stdout: Option<OutputRedirect>,
}

impl CommandSpec {
    /// Create a command with no arguments and no redirections
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin: None,
            stdout: None,
        }
    }

    /// Append a plain argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append a path argument
    pub fn arg_path(self, path: impl AsRef<Path>) -> Self {
        self.arg(path.as_ref().display().to_string())
    }

    /// Feed stdin from a file (`< path`)
    pub fn stdin_from(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdin = Some(path.into());
        self
    }

    /// Redirect stdout to a file, truncating it (`> path`)
    pub fn stdout_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdout = Some(OutputRedirect::Truncate(path.into()));
        self
    }

    /// Redirect stdout to a file, appending (`>> path`)
    pub fn stdout_append(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdout = Some(OutputRedirect::Append(path.into()));
        self
    }
}

/// What a step does when it runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StepAction {
    /// Spawn an external program
    Command(CommandSpec),
    /// Copy a file natively; failures surface as I/O errors, not exit codes
    CopyFile { from: PathBuf, to: PathBuf },
}

/// A single step of the calibration chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepDescriptor {
    /// Short identifier used in logs and diagnostics
    pub name: String,

    /// What to run
    pub action: StepAction,

    /// Files the step reads, asserted to exist before it is launched.
    /// Relative paths resolve against the working directory.
    pub inputs: Vec<PathBuf>,

    /// Files the step is expected to produce
    pub outputs: Vec<PathBuf>,

    /// Runtime state
    pub state: StepStatus,
}

impl StepDescriptor {
    /// Create a command step
    pub fn command(name: impl Into<String>, spec: CommandSpec) -> Self {
        Self {
            name: name.into(),
            action: StepAction::Command(spec),
            inputs: Vec::new(),
            outputs: Vec::new(),
            state: StepStatus::Pending,
        }
    }

    /// Create a native file-copy step
    pub fn copy(
        name: impl Into<String>,
        from: impl Into<PathBuf>,
        to: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            action: StepAction::CopyFile {
                from: from.into(),
                to: to.into(),
            },
            inputs: Vec::new(),
            outputs: Vec::new(),
            state: StepStatus::Pending,
        }
    }

    /// Declare a file this step reads
    pub fn reads(mut self, path: impl Into<PathBuf>) -> Self {
        self.inputs.push(path.into());
        self
    }

    /// Declare a file this step produces
    pub fn writes(mut self, path: impl Into<PathBuf>) -> Self {
        self.outputs.push(path.into());
        self
    }

    /// Shell-style rendering of the action, for logs only
    pub fn display_command(&self) -> String {
        match &self.action {
            StepAction::Command(spec) => {
                let mut line = spec.program.display().to_string();
                for arg in &spec.args {
                    line.push(' ');
                    line.push_str(arg);
                }
                if let Some(stdin) = &spec.stdin {
                    line.push_str(&format!(" <{}", stdin.display()));
                }
                match &spec.stdout {
                    Some(OutputRedirect::Truncate(path)) => {
                        line.push_str(&format!(" >{}", path.display()));
                    }
                    Some(OutputRedirect::Append(path)) => {
                        line.push_str(&format!(" >>{}", path.display()));
                    }
                    None => {}
                }
                line
            }
            StepAction::CopyFile { from, to } => {
                format!("cp {} {}", from.display(), to.display())
            }
        }
    }
}
