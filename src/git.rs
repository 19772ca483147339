//! Git command wrappers.
//!
//! Thin wrappers around the git CLI, handling command execution, error
//! formatting, and optional command tracing.

use anyhow::Context;
use std::path::Path;

/// Hook invoked with every external command (full argv) before it runs.
pub type CommandLogger = fn(&Path, &[&str]);

/// Traces the command line to stderr (verbose mode).
pub fn verbose_logger(dir: &Path, argv: &[&str]) {
    eprintln!("+ {} ({})", argv.join(" "), dir.display());
}

pub fn no_op_logger(_dir: &Path, _argv: &[&str]) {}

pub fn run_git(repo: &Path, args: &[&str], log: CommandLogger) -> anyhow::Result<String> {
    let mut argv = Vec::with_capacity(args.len() + 1);
    argv.push("git");
    argv.extend_from_slice(args);
    log(repo, &argv);

    let output = std::process::Command::new("git")
        .current_dir(repo)
        .args(args)
        .output()
        .context("Failed to spawn git command")?;

    if output.status.success() {
        let result = String::from_utf8_lossy(&output.stdout);
        Ok(result.as_ref().trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("git {} failed: {}", args.join(" "), stderr.trim())
    }
}

fn validate_ref_name(name: &str) -> anyhow::Result<()> {
    if name.is_empty()
        || name.starts_with('-')
        || name.contains('\0')
        || name.contains('\n')
        || name.contains(' ')
    {
        anyhow::bail!("Invalid ref name: {:?}", name);
    }
    Ok(())
}

/// Fetches a branch from a remote, recursing into submodules so the nested
/// checkout's objects arrive in the same pass.
pub fn fetch_with_submodules(
    repo: &Path,
    remote: &str,
    branch: &str,
    log: CommandLogger,
) -> anyhow::Result<()> {
    validate_ref_name(remote)?;
    validate_ref_name(branch)?;
    run_git(repo, &["fetch", "--recurse-submodules", remote, branch], log)
        .with_context(|| format!("Failed to fetch '{}' from '{}'", branch, remote))?;
    Ok(())
}

/// Force-resets the working tree to `target`, recursing into submodules so
/// the nested checkout lands on the recorded pointer.
pub fn reset_hard_with_submodules(
    repo: &Path,
    target: &str,
    log: CommandLogger,
) -> anyhow::Result<()> {
    validate_ref_name(target)?;
    run_git(repo, &["reset", "--hard", "--recurse-submodules", target], log)
        .with_context(|| format!("Failed to reset to '{}'", target))?;
    Ok(())
}

/// Removes untracked and ignored files. Stale build output from a previous
/// generation must not survive into the rebuild.
pub fn clean_untracked(repo: &Path, log: CommandLogger) -> anyhow::Result<()> {
    run_git(repo, &["clean", "-fdx"], log).context("Failed to clean untracked files")?;
    Ok(())
}

pub fn fetch_branch(
    repo: &Path,
    remote: &str,
    branch: &str,
    log: CommandLogger,
) -> anyhow::Result<()> {
    validate_ref_name(remote)?;
    validate_ref_name(branch)?;
    run_git(repo, &["fetch", remote, branch], log)
        .with_context(|| format!("Failed to fetch '{}' from '{}'", branch, remote))?;
    Ok(())
}

/// Fast-forward-only merge. Fails without creating a merge commit when the
/// local history has diverged from `target`.
pub fn merge_ff_only(repo: &Path, target: &str, log: CommandLogger) -> anyhow::Result<()> {
    validate_ref_name(target)?;
    run_git(repo, &["merge", "--ff-only", target], log)
        .with_context(|| format!("Failed to fast-forward to '{}'", target))?;
    Ok(())
}

pub fn current_commit(repo: &Path, log: CommandLogger) -> anyhow::Result<String> {
    run_git(repo, &["rev-parse", "HEAD"], log).context("Failed to resolve HEAD")
}
