//! The fixed Millepede calibration chain

use crate::core::{
    config::ChainConfig,
    paths::RunPaths,
    state::{RunState, RunStatus},
    step::{CommandSpec, StepDescriptor},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Stem passed to the converter's `-o`; the converter appends `.bin` itself
pub const MP2INPUT_STEM: &str = "mp2input";
/// Binary track file the converter actually produces
pub const MP2INPUT_FILE: &str = "mp2input.bin";

/// Result file pede writes into the current directory on every pass
pub const PEDE_RESULT_FILE: &str = "millepede.res";

/// Steering template for the first pede pass (two reference layers fixed)
pub const STEERING_PASS1: &str = "mp2str-noIFT-2layersfixed_v2_ss.txt";
/// Steering template for the second pede pass (remaining layers fixed)
pub const STEERING_PASS2: &str = "mp2str-noIFT-anotherlayersfixed_v2_ss.txt";

/// Constraint list derived from the first pass, consumed by the second
pub const FIXED_LAYERS_FILE: &str = "Fixanotherlayers.txt";
/// Accumulator the database update and parameter defaults are built in
pub const ALIGN_TEMP_FILE: &str = "inputforalign_temp.txt";
/// Completed constants before publication
pub const ALIGN_NEW_FILE: &str = "inputforalign_new.txt";

/// Alignment constants from the upstream reconstruction stage, expected in
/// the sibling `1reco` directory. Produced before this chain ever runs.
pub const RECO_INPUT_FILE: &str = "../1reco/inputforalign.txt";

/// Converter from reconstructed tracks to the Millepede binary format
pub const CONVERT_TOOL: &str = "1convert";
/// Filter turning pede pass-1 results into layer-fixing constraints
pub const FIX_LAYERS_TOOL: &str = "3fixanotherlayers";
/// Translator from pede results to database update lines
pub const PEDE_TO_DB_TOOL: &str = "5.1PedetoDB_ss";
/// Appends defaults for parameters pede left untouched
pub const ADD_PARAM_TOOL: &str = "5.2add_param";

/// Build the eight calibration steps in execution order.
///
/// Relative paths resolve against the working directory at run time, so the
/// step list itself is position independent.
pub fn millepede_chain(config: &ChainConfig, paths: &RunPaths) -> Vec<StepDescriptor> {
    let mp2input_arg = paths.work_dir.join(MP2INPUT_STEM);

    vec![
        // 1. Convert the reconstructed tracks into pede's binary record format.
        StepDescriptor::command(
            "convert",
            CommandSpec::new(config.tool(CONVERT_TOOL))
                .arg("-i")
                .arg_path(&paths.input_dir)
                .arg("-o")
                .arg_path(&mp2input_arg),
        )
        .reads(&paths.input_dir)
        .writes(MP2INPUT_FILE),
        // 2. First minimization with the two reference layers held fixed.
        StepDescriptor::command(
            "pede-pass1",
            CommandSpec::new(&config.pede_program).arg(STEERING_PASS1),
        )
        .reads(STEERING_PASS1)
        .reads(MP2INPUT_FILE)
        .writes(PEDE_RESULT_FILE),
        // 3. Derive the constraints that pin the remaining layers.
        StepDescriptor::command(
            "fix-layers",
            CommandSpec::new(config.tool(FIX_LAYERS_TOOL))
                .stdin_from(PEDE_RESULT_FILE)
                .stdout_to(FIXED_LAYERS_FILE),
        )
        .reads(PEDE_RESULT_FILE)
        .writes(FIXED_LAYERS_FILE),
        // 4. Second minimization against the derived constraints; rewrites
        //    millepede.res with the final parameters.
        StepDescriptor::command(
            "pede-pass2",
            CommandSpec::new(&config.pede_program).arg(STEERING_PASS2),
        )
        .reads(STEERING_PASS2)
        .reads(FIXED_LAYERS_FILE)
        .reads(MP2INPUT_FILE)
        .writes(PEDE_RESULT_FILE),
        // 5. Start the output from the upstream reconstruction constants.
        StepDescriptor::copy("copy-reco-input", RECO_INPUT_FILE, ALIGN_TEMP_FILE)
            .reads(RECO_INPUT_FILE)
            .writes(ALIGN_TEMP_FILE),
        // 6. Append the database update derived from the final pede results.
        StepDescriptor::command(
            "pede-to-db",
            CommandSpec::new(config.tool(PEDE_TO_DB_TOOL))
                .stdin_from(PEDE_RESULT_FILE)
                .stdout_append(ALIGN_TEMP_FILE),
        )
        .reads(PEDE_RESULT_FILE)
        .reads(ALIGN_TEMP_FILE)
        .writes(ALIGN_TEMP_FILE),
        // 7. Fill in defaults for parameters the minimization left untouched.
        StepDescriptor::command(
            "add-param",
            CommandSpec::new(config.tool(ADD_PARAM_TOOL))
                .stdin_from(ALIGN_TEMP_FILE)
                .stdout_to(ALIGN_NEW_FILE),
        )
        .reads(ALIGN_TEMP_FILE)
        .writes(ALIGN_NEW_FILE),
        // 8. Publish next to the stage directories for the next campaign pass.
        StepDescriptor::copy("publish", ALIGN_NEW_FILE, &paths.output_path)
            .reads(ALIGN_NEW_FILE)
            .writes(&paths.output_path),
    ]
}

/// One run of the calibration chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainRun {
    /// Working directory the steps execute in
    pub work_dir: PathBuf,

    /// Ordered steps
    pub steps: Vec<StepDescriptor>,

    /// Run-level state
    pub state: RunState,
}

impl ChainRun {
    /// Assemble the standard chain from the installation config and the
    /// resolved run paths
    pub fn new(config: &ChainConfig, paths: &RunPaths) -> Self {
        Self {
            work_dir: paths.work_dir.clone(),
            steps: millepede_chain(config, paths),
            state: RunState::new(),
        }
    }

    /// Assemble a run over an arbitrary step list
    pub fn with_steps(work_dir: impl Into<PathBuf>, steps: Vec<StepDescriptor>) -> Self {
        Self {
            work_dir: work_dir.into(),
            steps,
            state: RunState::new(),
        }
    }

    /// Get a step by index
    pub fn step(&self, index: usize) -> Option<&StepDescriptor> {
        self.steps.get(index)
    }

    /// Get a mutable step by index
    pub fn step_mut(&mut self, index: usize) -> Option<&mut StepDescriptor> {
        self.steps.get_mut(index)
    }

    /// Check if the run finished with every step succeeding
    pub fn is_complete(&self) -> bool {
        matches!(self.state.status, RunStatus::Succeeded)
    }

    /// Check if the run stopped on a failure
    pub fn has_failed(&self) -> bool {
        matches!(self.state.status, RunStatus::Failed { .. })
    }
}
