//! The update-and-swap procedure: step definitions, result types, and the
//! orchestrating `run`.

use crate::build;
use crate::config::Config;
use crate::constants::{
    ARTIFACT_TARGET, NESTED_DIR, PRIMARY_BRANCH, REMOTE, RETIRED_DIR, SECONDARY_BRANCH,
    STAGING_DIR, WORKING_DIR,
};
use crate::git;
use crate::lock::DeployLock;
use crate::service::ServiceManager;
use crate::stage;
use anyhow::Context;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployStep {
    Started,
    AcquiringLock,
    CleaningStaging,
    CopyingWorking,
    FetchingPrimary,
    ResettingStaging,
    CleaningNested,
    FetchingSecondary,
    MergingSecondary,
    BuildingArtifact,
    DroppingRetired,
    StoppingService,
    PromotingStaging,
    StartingService,
    Completed,
}

impl fmt::Display for DeployStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeployStep::Started => "starting",
            DeployStep::AcquiringLock => "acquiring deploy lock",
            DeployStep::CleaningStaging => "removing leftover staging checkout",
            DeployStep::CopyingWorking => "copying working checkout",
            DeployStep::FetchingPrimary => "fetching primary branch",
            DeployStep::ResettingStaging => "resetting staging checkout",
            DeployStep::CleaningNested => "cleaning nested checkout",
            DeployStep::FetchingSecondary => "fetching secondary branch",
            DeployStep::MergingSecondary => "fast-forwarding nested checkout",
            DeployStep::BuildingArtifact => "rebuilding artifact",
            DeployStep::DroppingRetired => "deleting retired checkout",
            DeployStep::StoppingService => "stopping service",
            DeployStep::PromotingStaging => "promoting staging checkout",
            DeployStep::StartingService => "starting service",
            DeployStep::Completed => "completed",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub struct DeployResult {
    pub root: PathBuf,
    pub outcome: DeployOutcome,
    pub duration: Duration,
}

#[derive(Debug)]
pub enum DeployOutcome {
    Success(DeploySuccess),
    Failed(DeployFailure),
}

#[derive(Debug)]
pub struct DeploySuccess {
    /// Superproject commit now backing the application.
    pub deployed_commit: String,
    /// Commit the nested checkout ended up on after the fast-forward.
    pub nested_commit: String,
}

#[derive(Debug)]
pub struct DeployFailure {
    pub error: String,
    pub step: DeployStep,
}

/// Observer hooks for progress reporting.
pub trait DeployCallbacks {
    fn on_start(&self, root: &Path);
    fn on_step(&self, step: &DeployStep);
    fn on_complete(&self, result: &DeployResult);
}

#[derive(Debug)]
struct StepError {
    source: anyhow::Error,
    step: DeployStep,
}

fn at_step<T>(step: DeployStep, result: anyhow::Result<T>) -> Result<T, StepError> {
    result.map_err(|e| StepError { source: e, step })
}

/// Runs the whole procedure against the deployment root, driving `service`
/// around the swap. Never panics; the outcome carries the failing step.
pub fn run<S, C>(root: &Path, service: &S, callbacks: &C, config: &Config) -> DeployResult
where
    S: ServiceManager,
    C: DeployCallbacks,
{
    let started = Instant::now();
    callbacks.on_start(root);

    let outcome = match do_run(root, service, callbacks, config) {
        Ok(success) => DeployOutcome::Success(success),
        Err(e) => DeployOutcome::Failed(DeployFailure {
            error: format!("{:#}", e.source),
            step: e.step,
        }),
    };

    let result = DeployResult {
        root: root.to_path_buf(),
        outcome,
        duration: started.elapsed(),
    };
    callbacks.on_complete(&result);
    result
}

fn do_run<S, C>(
    root: &Path,
    service: &S,
    callbacks: &C,
    config: &Config,
) -> Result<DeploySuccess, StepError>
where
    S: ServiceManager,
    C: DeployCallbacks,
{
    let log = config.command_logger();
    let working = root.join(WORKING_DIR);
    let staging = root.join(STAGING_DIR);
    let retired = root.join(RETIRED_DIR);
    let nested = staging.join(NESTED_DIR);
    let primary_ref = format!("{}/{}", REMOTE, PRIMARY_BRANCH);
    let secondary_ref = format!("{}/{}", REMOTE, SECONDARY_BRANCH);

    callbacks.on_step(&DeployStep::Started);

    callbacks.on_step(&DeployStep::AcquiringLock);
    let _lock = at_step(DeployStep::AcquiringLock, DeployLock::acquire(root))?;

    callbacks.on_step(&DeployStep::CleaningStaging);
    at_step(DeployStep::CleaningStaging, remove_dir_if_present(&staging))?;

    callbacks.on_step(&DeployStep::CopyingWorking);
    at_step(
        DeployStep::CopyingWorking,
        stage::clone_tree(&working, &staging),
    )?;

    callbacks.on_step(&DeployStep::FetchingPrimary);
    at_step(
        DeployStep::FetchingPrimary,
        git::fetch_with_submodules(&staging, REMOTE, PRIMARY_BRANCH, log),
    )?;

    callbacks.on_step(&DeployStep::ResettingStaging);
    at_step(
        DeployStep::ResettingStaging,
        git::reset_hard_with_submodules(&staging, &primary_ref, log),
    )?;
    at_step(
        DeployStep::ResettingStaging,
        git::clean_untracked(&staging, log),
    )?;
    let deployed_commit = at_step(
        DeployStep::ResettingStaging,
        git::current_commit(&staging, log),
    )?;

    callbacks.on_step(&DeployStep::CleaningNested);
    at_step(DeployStep::CleaningNested, git::clean_untracked(&nested, log))?;

    callbacks.on_step(&DeployStep::FetchingSecondary);
    at_step(
        DeployStep::FetchingSecondary,
        git::fetch_branch(&nested, REMOTE, SECONDARY_BRANCH, log),
    )?;

    callbacks.on_step(&DeployStep::MergingSecondary);
    at_step(
        DeployStep::MergingSecondary,
        git::merge_ff_only(&nested, &secondary_ref, log),
    )?;
    let nested_commit = at_step(
        DeployStep::MergingSecondary,
        git::current_commit(&nested, log),
    )?;

    callbacks.on_step(&DeployStep::BuildingArtifact);
    at_step(
        DeployStep::BuildingArtifact,
        build::make_target(&nested, ARTIFACT_TARGET, log),
    )?;

    // Everything up to here mutated staging only; from here on the live
    // checkout and the service are touched.

    callbacks.on_step(&DeployStep::DroppingRetired);
    at_step(DeployStep::DroppingRetired, remove_dir_if_present(&retired))?;

    callbacks.on_step(&DeployStep::StoppingService);
    at_step(DeployStep::StoppingService, service.stop())?;

    callbacks.on_step(&DeployStep::PromotingStaging);
    at_step(
        DeployStep::PromotingStaging,
        promote(&working, &staging, &retired),
    )?;

    callbacks.on_step(&DeployStep::StartingService);
    at_step(DeployStep::StartingService, service.start())?;

    callbacks.on_step(&DeployStep::Completed);

    Ok(DeploySuccess {
        deployed_commit,
        nested_commit,
    })
}

fn remove_dir_if_present(path: &Path) -> anyhow::Result<()> {
    if path.symlink_metadata().is_ok() {
        fs::remove_dir_all(path)
            .with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Two back-to-back renames: working becomes retired, staging becomes
/// working. Not atomic; a crash between them leaves no working checkout.
fn promote(working: &Path, staging: &Path, retired: &Path) -> anyhow::Result<()> {
    fs::rename(working, retired).with_context(|| {
        format!(
            "Failed to retire {} to {}",
            working.display(),
            retired.display()
        )
    })?;
    fs::rename(staging, working).with_context(|| {
        format!(
            "Failed to promote {} to {}",
            staging.display(),
            working.display()
        )
    })?;
    Ok(())
}
