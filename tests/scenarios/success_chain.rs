//! Test: Success chain - all eight steps run in order

use crate::helpers::*;
use mpchain::{ChainConfig, ChainRun};

const STEP_NAMES: [&str; 8] = [
    "convert",
    "pede-pass1",
    "fix-layers",
    "pede-pass2",
    "copy-reco-input",
    "pede-to-db",
    "add-param",
    "publish",
];

/// A run over the real chain definition, with every declared input on disk
fn seeded_run() -> (tempfile::TempDir, ChainRun) {
    let (scratch, paths) = scratch_layout();
    seed_all_artifacts(&paths);
    let run = ChainRun::new(&ChainConfig::default(), &paths);
    (scratch, run)
}

/// Test that the chain executes every step, in declaration order
#[tokio::test]
async fn test_chain_runs_all_eight_steps_in_order() {
    let (_scratch, run) = seeded_run();

    let result = run_chain_with_mock(run, all_ok(8)).await;

    assert_chain_succeeded(&result);
    assert_executed(&result, &STEP_NAMES);
}

/// Test that a clean run leaves every step marked succeeded
#[tokio::test]
async fn test_every_step_ends_up_succeeded() {
    let (_scratch, run) = seeded_run();

    let result = run_chain_with_mock(run, all_ok(8)).await;

    for index in 0..result.run.steps.len() {
        assert_step_succeeded(&result.run, index);
    }
    assert!(result.run.is_complete());
    assert!(!result.run.has_failed());
}

/// Test that captured tool stdout is kept on the step state
#[tokio::test]
async fn test_captured_stdout_is_kept_on_the_step() {
    let (_scratch, run) = seeded_run();

    let mut outcomes = all_ok(8);
    outcomes[0] = ok("4117 tracks converted");
    outcomes[1] = ok("pede: solution converged");
    let result = run_chain_with_mock(run, outcomes).await;

    assert_chain_succeeded(&result);
    assert_eq!(
        result.step_stdout(0).as_deref(),
        Some("4117 tracks converted")
    );
    assert_eq!(
        result.step_stdout(1).as_deref(),
        Some("pede: solution converged")
    );
    assert_eq!(result.step_stdout(2).as_deref(), Some(""));
}

/// Test the JSON report produced for `--json`
#[tokio::test]
async fn test_run_report_serializes_to_json() {
    let (_scratch, run) = seeded_run();

    let result = run_chain_with_mock(run, all_ok(8)).await;

    let report = serde_json::to_value(&result.run).unwrap();
    assert_eq!(report["state"]["status"], "Succeeded");
    assert_eq!(report["state"]["total_steps"], 8);

    let steps = report["steps"].as_array().unwrap();
    assert_eq!(steps.len(), 8);
    for (step, name) in steps.iter().zip(STEP_NAMES) {
        assert_eq!(step["name"], name);
    }
}
