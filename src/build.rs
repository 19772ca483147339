//! Build tool invocation.

use crate::git::CommandLogger;
use anyhow::Context;
use std::path::Path;

/// Runs `make <target>` in `dir`. A non-zero exit fails the run with the
/// tool's stderr in the error.
pub fn make_target(dir: &Path, target: &str, log: CommandLogger) -> anyhow::Result<()> {
    log(dir, &["make", target]);
    let output = std::process::Command::new("make")
        .current_dir(dir)
        .arg(target)
        .output()
        .context("Failed to spawn make")?;

    if output.status.success() {
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("make {} failed: {}", target, stderr.trim())
    }
}
