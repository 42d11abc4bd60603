//! Test: Failure handling - the chain stops at the first broken step

use crate::helpers::*;
use mpchain::core::chain;
use mpchain::{ChainConfig, ChainError, ChainRun, RunStatus};
use std::fs;

/// Test that a failing tool stops the chain and leaves later steps pending
#[tokio::test]
async fn test_chain_stops_at_first_failing_step() {
    let (_scratch, paths) = scratch_layout();
    seed_all_artifacts(&paths);
    let run = ChainRun::new(&ChainConfig::default(), &paths);

    // pede-pass2 breaks
    let outcomes = vec![ok(""), ok(""), ok(""), exit(11, "singular matrix")];
    let result = run_chain_with_mock(run, outcomes).await;

    assert_chain_failed_at(&result, 3);
    assert_executed(
        &result,
        &["convert", "pede-pass1", "fix-layers", "pede-pass2"],
    );

    // Nothing after the failure ever started
    for index in 4..result.run.steps.len() {
        assert_step_pending(&result.run, index);
    }
}

/// Test that the tool's own exit code survives into the run state
#[tokio::test]
async fn test_failure_preserves_the_tool_exit_code() {
    let (_scratch, paths) = scratch_layout();
    seed_all_artifacts(&paths);
    let run = ChainRun::new(&ChainConfig::default(), &paths);

    let outcomes = vec![ok(""), ok(""), ok(""), exit(11, "singular matrix")];
    let result = run_chain_with_mock(run, outcomes).await;

    assert_eq!(
        result.run.state.status,
        RunStatus::Failed {
            step: 3,
            exit_code: Some(11),
            stderr: "singular matrix".to_string(),
        }
    );
    match &result.outcome {
        Err(err) => assert_eq!(err.exit_code(), 11),
        Ok(()) => panic!("Chain should have failed"),
    }
}

/// Test that a missing steering file stops the chain before pede launches
#[tokio::test]
async fn test_missing_steering_file_fails_before_pede_runs() {
    let (_scratch, paths) = scratch_layout();
    seed_all_artifacts(&paths);
    fs::remove_file(paths.work_dir.join(chain::STEERING_PASS1)).unwrap();
    let run = ChainRun::new(&ChainConfig::default(), &paths);

    let result = run_chain_with_mock(run, all_ok(8)).await;

    assert_chain_failed_at(&result, 1);
    // Only the convert step reached the runner
    assert_executed(&result, &["convert"]);

    match &result.outcome {
        Err(ChainError::MissingInput { index, name, path }) => {
            assert_eq!(*index, 1);
            assert_eq!(name, "pede-pass1");
            assert!(path.ends_with(chain::STEERING_PASS1));
        }
        other => panic!("Expected MissingInput, got {:?}", other),
    }
}

/// Test that absent reconstruction constants stop the copy step
#[tokio::test]
async fn test_missing_reco_constants_stop_the_copy_step() {
    let (_scratch, paths) = scratch_layout();
    seed_all_artifacts(&paths);
    let campaign_root = paths.work_dir.parent().unwrap();
    fs::remove_file(campaign_root.join("1reco").join("inputforalign.txt")).unwrap();
    let run = ChainRun::new(&ChainConfig::default(), &paths);

    let result = run_chain_with_mock(run, all_ok(8)).await;

    assert_chain_failed_at(&result, 4);
    assert_executed(
        &result,
        &["convert", "pede-pass1", "fix-layers", "pede-pass2"],
    );

    match &result.outcome {
        Err(ChainError::MissingInput { index, path, .. }) => {
            assert_eq!(*index, 4);
            assert_eq!(path, &std::path::PathBuf::from(chain::RECO_INPUT_FILE));
        }
        other => panic!("Expected MissingInput, got {:?}", other),
    }
}

/// Test exit code mapping for the non-tool failure classes
#[tokio::test]
async fn test_missing_input_maps_to_generic_exit_code() {
    let (_scratch, paths) = scratch_layout();
    seed_all_artifacts(&paths);
    fs::remove_file(paths.work_dir.join(chain::STEERING_PASS2)).unwrap();
    let run = ChainRun::new(&ChainConfig::default(), &paths);

    let result = run_chain_with_mock(run, all_ok(8)).await;

    assert_chain_failed_at(&result, 3);
    match &result.outcome {
        Err(err) => assert_eq!(err.exit_code(), 1),
        Ok(()) => panic!("Chain should have failed"),
    }
}
