//! Test: End-to-end runs with stub tools standing in for the Millepede
//! binaries. Each stub writes recognizable content so the final constants
//! file proves which tool touched it, and in what order.

use crate::helpers::*;
use mpchain::core::chain;
use mpchain::{ChainConfig, ChainError, ChainRun, ExecutionEngine, ProcessStepRunner, RunPaths};
use mpchain::{seed_workspace, StepStatus};
use std::fs;
use std::path::PathBuf;

/// Campaign scratch with stub tools, steering templates, reco constants and
/// a seeded workspace
fn stub_campaign() -> (tempfile::TempDir, ChainConfig, RunPaths) {
    let (scratch, paths) = scratch_layout();

    let campaign_root = paths.work_dir.parent().unwrap().to_path_buf();
    let reco_dir = campaign_root.join("1reco");
    fs::create_dir_all(&reco_dir).unwrap();
    write_file(&reco_dir.join("inputforalign.txt"), "reco constants\n");

    let templates = scratch.path().join("templates");
    fs::create_dir(&templates).unwrap();
    write_file(&templates.join(chain::STEERING_PASS1), "pass1 steering\n");
    write_file(&templates.join(chain::STEERING_PASS2), "pass2 steering\n");

    let bin_dir = scratch.path().join("stub-bin");
    // The converter appends `.bin` to whatever -o names, so the stub does too
    install_stub_tool(&bin_dir, "1convert", r#"printf 'binary-tracks\n' > "$4.bin""#);
    install_stub_tool(
        &bin_dir,
        "pede",
        r#"printf 'pede results for %s\n' "$1" > millepede.res"#,
    );
    install_stub_tool(&bin_dir, "3fixanotherlayers", r#"sed 's/^/fixed:/'"#);
    install_stub_tool(&bin_dir, "5.1PedetoDB_ss", r#"printf 'db:'; cat"#);
    install_stub_tool(&bin_dir, "5.2add_param", r#"cat; printf 'param-defaults\n'"#);

    let config = ChainConfig::from_build_env()
        .with_bin_dir(&bin_dir)
        .with_template_dir(&templates)
        .with_pede_program(bin_dir.join("pede"));

    seed_workspace(&config.template_dir, &paths.work_dir).unwrap();

    (scratch, config, paths)
}

/// Test a complete run: every artifact appears and the published constants
/// are layered reco, then database update, then parameter defaults
#[tokio::test]
async fn test_stubbed_chain_produces_the_published_constants() {
    let (_scratch, config, paths) = stub_campaign();
    let mut run = ChainRun::new(&config, &paths);
    let engine = ExecutionEngine::new(ProcessStepRunner::new());

    engine.execute(&mut run).await.unwrap();

    assert!(run.is_complete());
    assert!(paths.work_dir.join(chain::MP2INPUT_FILE).exists());
    assert!(paths.work_dir.join(chain::ALIGN_TEMP_FILE).exists());
    assert!(paths.work_dir.join(chain::ALIGN_NEW_FILE).exists());

    // Pass 1 results went through the fix filter via `<` and `>`
    assert_eq!(
        read_file(&paths.work_dir.join(chain::FIXED_LAYERS_FILE)),
        format!("fixed:pede results for {}\n", chain::STEERING_PASS1)
    );

    // The reco line survives the `>>` append, and pass 2 overwrote the
    // pass 1 results before the database update read them
    assert_eq!(
        read_file(&paths.output_path),
        format!(
            "reco constants\ndb:pede results for {}\nparam-defaults\n",
            chain::STEERING_PASS2
        )
    );
}

/// Test that file-redirected stdout bypasses capture entirely
#[tokio::test]
async fn test_redirected_stdout_is_not_captured() {
    let (_scratch, config, paths) = stub_campaign();
    let mut run = ChainRun::new(&config, &paths);
    let engine = ExecutionEngine::new(ProcessStepRunner::new());

    engine.execute(&mut run).await.unwrap();

    // fix-layers wrote through `>`, so nothing reached the capture pipe
    match &run.steps[2].state {
        StepStatus::Succeeded { stdout, .. } => assert_eq!(stdout, ""),
        other => panic!("Expected fix-layers to succeed, got {:?}", other),
    }
}

/// Test that a failing pede stops the chain with its own exit code
#[tokio::test]
async fn test_failing_pede_stops_the_chain_with_its_exit_code() {
    let (scratch, config, paths) = stub_campaign();
    install_stub_tool(
        &scratch.path().join("stub-bin"),
        "pede",
        r#"printf 'matrix is singular\n' >&2; exit 7"#,
    );

    let mut run = ChainRun::new(&config, &paths);
    let engine = ExecutionEngine::new(ProcessStepRunner::new());

    let err = engine.execute(&mut run).await.unwrap_err();

    assert_eq!(err.exit_code(), 7);
    match &err {
        ChainError::StepFailed {
            index,
            name,
            stderr,
            ..
        } => {
            assert_eq!(*index, 1);
            assert_eq!(name, "pede-pass1");
            assert!(stderr.contains("matrix is singular"));
        }
        other => panic!("Expected StepFailed, got {:?}", other),
    }
    assert!(run.has_failed());

    // The first pass never produced results, and nothing was published
    assert!(!paths.work_dir.join(chain::PEDE_RESULT_FILE).exists());
    assert!(!paths.output_path.exists());
}

/// Test that a failed run can be rerun without manual cleanup
#[tokio::test]
async fn test_rerun_after_a_failure_needs_no_cleanup() {
    let (scratch, config, paths) = stub_campaign();
    let bin_dir = scratch.path().join("stub-bin");
    // First attempt dies mid-chain, after the reco constants were copied in
    install_stub_tool(
        &bin_dir,
        "5.1PedetoDB_ss",
        r#"printf 'db is down\n' >&2; exit 3"#,
    );

    let engine = ExecutionEngine::new(ProcessStepRunner::new());
    let mut first = ChainRun::new(&config, &paths);
    let err = engine.execute(&mut first).await.unwrap_err();

    assert_eq!(err.exit_code(), 3);
    assert!(paths.work_dir.join(chain::ALIGN_TEMP_FILE).exists());
    assert!(!paths.work_dir.join(chain::ALIGN_NEW_FILE).exists());
    assert!(!paths.output_path.exists());

    // Fix the tool and rerun the way the binary would: reseed, fresh run.
    // The copy step overwrites the leftover temp file, so the append lands
    // on a single copy of the reco line.
    install_stub_tool(&bin_dir, "5.1PedetoDB_ss", r#"printf 'db:'; cat"#);
    seed_workspace(&config.template_dir, &paths.work_dir).unwrap();
    let mut second = ChainRun::new(&config, &paths);
    engine.execute(&mut second).await.unwrap();

    assert!(second.is_complete());
    assert_eq!(
        read_file(&paths.output_path),
        format!(
            "reco constants\ndb:pede results for {}\nparam-defaults\n",
            chain::STEERING_PASS2
        )
    );
}

/// Test that the converter sees the campaign input directory as `-i`
#[tokio::test]
async fn test_convert_receives_the_input_directory() {
    let (scratch, config, paths) = stub_campaign();
    // Record the argument list instead of converting
    install_stub_tool(
        &scratch.path().join("stub-bin"),
        "1convert",
        r#"printf '%s\n' "$@" > convert-args.txt; printf 'x\n' > "$4.bin""#,
    );

    let mut run = ChainRun::new(&config, &paths);
    let engine = ExecutionEngine::new(ProcessStepRunner::new());
    engine.execute(&mut run).await.unwrap();

    let args: Vec<String> = read_file(&paths.work_dir.join("convert-args.txt"))
        .lines()
        .map(String::from)
        .collect();
    assert_eq!(args[0], "-i");
    assert_eq!(PathBuf::from(&args[1]), paths.input_dir);
    assert_eq!(args[2], "-o");
    assert_eq!(
        PathBuf::from(format!("{}.bin", args[3])),
        paths.work_dir.join(chain::MP2INPUT_FILE)
    );
}
