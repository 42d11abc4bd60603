use anyhow::{Context, Result};
use mpchain::cli::output::*;
use mpchain::cli::Cli;
use mpchain::{seed_workspace, ChainConfig, ChainRun, RunPaths};
use mpchain::{ExecutionEngine, ExecutionEvent, ProcessStepRunner};
use std::time::Duration;
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    run_chain(&cli).await
}

async fn run_chain(cli: &Cli) -> Result<()> {
    let config = ChainConfig::from_build_env();

    // Resolve the campaign layout around the input directory
    let paths = match RunPaths::resolve(&cli.input_dir) {
        Ok(paths) => paths,
        Err(err) => {
            let code = err.exit_code();
            println!("{} {}", CROSS, style(err).red());
            std::process::exit(code);
        }
    };

    println!(
        "{} Input directory: {}",
        INFO,
        style(paths.input_dir.display()).bold()
    );
    println!(
        "{} Workspace: {}",
        INFO,
        style(paths.work_dir.display()).bold()
    );

    // Seed the workspace with the steering templates
    match seed_workspace(&config.template_dir, &paths.work_dir) {
        Ok(count) => println!(
            "{} Seeded {} steering file(s) from {}",
            INFO,
            style(count).cyan(),
            style(config.template_dir.display()).dim()
        ),
        Err(err) => {
            let code = err.exit_code();
            println!("{} {}", CROSS, style(err).red());
            std::process::exit(code);
        }
    }

    let mut run = ChainRun::new(&config, &paths);

    // Create the execution engine
    let mut runner = ProcessStepRunner::new();
    if let Some(secs) = cli.step_timeout_secs {
        runner = runner.with_timeout(Duration::from_secs(secs));
    }
    let mut engine = ExecutionEngine::new(runner);

    // Set up event handler for console output
    let progress = create_progress_bar(run.steps.len());
    let progress_handle = progress.clone();
    let verbose = cli.verbose;
    engine.add_event_handler(move |event| {
        match &event {
            ExecutionEvent::StepStarted { name, .. } => {
                progress_handle.set_message(name.clone());
                progress_handle.println(format_execution_event(&event));
            }
            ExecutionEvent::StepOutput { stdout, .. } => {
                // Step stdout is only surfaced in verbose runs
                if verbose {
                    progress_handle.println(format_execution_event(&event));
                    progress_handle.println(format_output(stdout, 20));
                }
            }
            ExecutionEvent::StepCompleted { .. } => {
                progress_handle.inc(1);
                progress_handle.println(format_execution_event(&event));
            }
            _ => progress_handle.println(format_execution_event(&event)),
        }
    });

    // Execute the chain
    println!();
    let result = engine.execute(&mut run).await;
    progress.finish_and_clear();

    if cli.json {
        let json = serde_json::to_string_pretty(&run)?;
        println!("\n{}", json);
    }

    // Print final status
    match result {
        Ok(()) => {
            println!(
                "\n{} Alignment constants written to {}",
                CHECK,
                style(paths.output_path.display()).bold()
            );
            Ok(())
        }
        Err(err) => {
            println!(
                "\n{} Calibration chain {}",
                CROSS,
                style("failed").red()
            );
            error!("{}", err);
            std::process::exit(err.exit_code());
        }
    }
}
