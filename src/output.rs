//! Spinner progress, colored output, and outcome formatting.

use crate::config::Config;
use crate::constants::PROGRESS_TICK_MS;
use crate::deploy::{DeployCallbacks, DeployOutcome, DeployResult, DeployStep};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

/// No-op callbacks for when progress tracking is not needed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoOpCallbacks;

impl DeployCallbacks for NoOpCallbacks {
    fn on_start(&self, _root: &Path) {}
    fn on_step(&self, _step: &DeployStep) {}
    fn on_complete(&self, _result: &DeployResult) {}
}

/// Prints a step progress line in verbose mode.
pub fn print_step(config: &Config, step: &DeployStep) {
    if !config.is_verbose() {
        return;
    }
    eprintln!("  {}...", step.to_string().dimmed());
}

/// Spinner wrapper for the deploy run.
/// Uses `Option` so quiet/verbose modes carry no progress bar at all.
pub struct DeployProgress {
    spinner: Option<ProgressBar>,
}

impl DeployProgress {
    pub fn update(&self, step: &DeployStep) {
        if let Some(spinner) = &self.spinner {
            spinner.set_message(format_step_message(step));
        }
    }

    pub fn finish_success(&self, commit: &str) {
        if let Some(spinner) = &self.spinner {
            spinner.finish_with_message(format!(
                "{} deployed {}",
                "✓".green(),
                short_commit(commit)
            ));
        }
    }

    pub fn finish_failed(&self, step: &DeployStep, error: &str) {
        if let Some(spinner) = &self.spinner {
            spinner.finish_with_message(format!("{} {} failed: {}", "✗".red(), step, error));
        }
    }
}

/// Callbacks combining spinner updates with verbose step tracing.
pub struct ProgressCallbacks {
    progress: DeployProgress,
    config: Config,
}

impl ProgressCallbacks {
    pub fn new(progress: DeployProgress, config: Config) -> Self {
        Self { progress, config }
    }

    /// Finish the spinner with the final outcome.
    pub fn finish(&self, result: &DeployResult) {
        match &result.outcome {
            DeployOutcome::Success(success) => {
                self.progress.finish_success(&success.deployed_commit);
            }
            DeployOutcome::Failed(failure) => {
                self.progress.finish_failed(&failure.step, &failure.error);
            }
        }
    }
}

impl DeployCallbacks for ProgressCallbacks {
    fn on_start(&self, root: &Path) {
        print_root(root, &self.config);
    }

    fn on_step(&self, step: &DeployStep) {
        self.progress.update(step);
        print_step(&self.config, step);
    }

    fn on_complete(&self, _result: &DeployResult) {
        // the summary is printed by main.rs from the result
    }
}

/// Creates a spinner-based progress tracker.
/// Carries no spinner in quiet or verbose mode to avoid allocation.
#[must_use]
pub fn create_progress(config: &Config) -> DeployProgress {
    let spinner = if config.is_quiet() || config.is_verbose() {
        None
    } else {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
                .template("{spinner:.cyan} {msg}")
                .unwrap(),
        );
        spinner.enable_steady_tick(Duration::from_millis(PROGRESS_TICK_MS));
        Some(spinner)
    };

    DeployProgress { spinner }
}

pub fn print_root(path: &Path, config: &Config) {
    if config.is_quiet() {
        return;
    }
    println!(
        "{} {}",
        "Deploying in:".cyan(),
        path.display().to_string().white().bold()
    )
}

pub fn print_summary(result: &DeployResult, config: &Config) {
    if config.is_quiet() {
        print_quiet_summary(result);
    } else {
        print_normal_summary(result);
    }
}

fn print_quiet_summary(result: &DeployResult) {
    match &result.outcome {
        DeployOutcome::Success(success) => {
            println!("deployed {}", success.deployed_commit);
        }
        DeployOutcome::Failed(failure) => {
            eprintln!("error: at {}: {}", failure.step, failure.error);
        }
    }
}

fn print_normal_summary(result: &DeployResult) {
    match &result.outcome {
        DeployOutcome::Success(success) => {
            println!(
                "{} {} {} (scowl at {}) in {}",
                "OK".green().bold(),
                "deployed".white(),
                short_commit(&success.deployed_commit).cyan(),
                short_commit(&success.nested_commit).cyan(),
                format_duration(result.duration).dimmed(),
            );
        }
        DeployOutcome::Failed(failure) => {
            println!(
                "{} {} in {}",
                "FAIL".red().bold(),
                format!("at {}: {}", failure.step, failure.error).red(),
                format_duration(result.duration).dimmed(),
            );
        }
    }
}

fn short_commit(commit: &str) -> &str {
    if commit.len() >= 12 {
        &commit[..12]
    } else {
        commit
    }
}

fn format_duration(duration: Duration) -> String {
    format!("{:.2}s", duration.as_secs_f32())
}

fn format_step_message(step: &DeployStep) -> &'static str {
    match step {
        DeployStep::Started => "Starting deploy...",
        DeployStep::AcquiringLock => "Acquiring deploy lock...",
        DeployStep::CleaningStaging => "Removing leftover staging checkout...",
        DeployStep::CopyingWorking => "Copying working checkout into staging...",
        DeployStep::FetchingPrimary => "Fetching master from origin...",
        DeployStep::ResettingStaging => "Resetting staging to origin/master...",
        DeployStep::CleaningNested => "Cleaning the scowl checkout...",
        DeployStep::FetchingSecondary => "Fetching v2 into the scowl checkout...",
        DeployStep::MergingSecondary => "Fast-forwarding scowl to origin/v2...",
        DeployStep::BuildingArtifact => "Rebuilding scowl.db...",
        DeployStep::DroppingRetired => "Deleting previous retired checkout...",
        DeployStep::StoppingService => "Stopping the service...",
        DeployStep::PromotingStaging => "Swapping staging into place...",
        DeployStep::StartingService => "Starting the service...",
        DeployStep::Completed => "Completed",
    }
}
