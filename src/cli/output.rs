//! CLI output formatting

use crate::core::RunStatus;
use crate::execution::ExecutionEvent;
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// Create a progress bar over the chain's steps
pub fn create_progress_bar(total: usize) -> ProgressBar {
    let progress = ProgressBar::new(total as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}

/// Format an execution event for display
pub fn format_execution_event(event: &ExecutionEvent) -> String {
    match event {
        ExecutionEvent::RunStarted {
            run_id,
            work_dir,
            total_steps,
        } => format!(
            "{} Starting calibration chain in {} ({} steps, {})",
            ROCKET,
            style(work_dir.display()).bold(),
            total_steps,
            style(&run_id.to_string()[..8]).dim()
        ),
        ExecutionEvent::StepStarted {
            index,
            name,
            command,
        } => format!(
            "{} [{}] {}: {}",
            SPINNER,
            index + 1,
            style(name).cyan(),
            style(command).dim()
        ),
        ExecutionEvent::StepOutput { name, .. } => {
            format!("{} Output from {}:", INFO, style(name).dim())
        }
        ExecutionEvent::StepCompleted { index, name } => {
            format!("{} [{}] {}", CHECK, index + 1, style(name).green())
        }
        ExecutionEvent::StepFailed { index, name, error } => format!(
            "{} [{}] {}: {}",
            CROSS,
            index + 1,
            style(name).red(),
            style(error).dim()
        ),
        ExecutionEvent::RunCompleted { run_id, status } => {
            let status_str = match status {
                RunStatus::Succeeded => {
                    format!("completed {}", style("successfully").green())
                }
                RunStatus::Failed { .. } => style("failed").red().to_string(),
                _ => format!("{:?}", status),
            };
            format!(
                "{} Chain ({}) {}",
                INFO,
                style(&run_id.to_string()[..8]).dim(),
                status_str
            )
        }
    }
}

/// Format captured tool output with truncation
pub fn format_output(output: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = output.lines().collect();

    if lines.len() <= max_lines {
        output.to_string()
    } else {
        let truncated = lines[..max_lines].join("\n");
        format!(
            "{}\n{}... ({} more lines)",
            truncated,
            style("[truncated]").dim(),
            lines.len() - max_lines
        )
    }
}
