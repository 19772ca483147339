//! Single-writer exclusion over the deployment root.
//!
//! Two simultaneous runs would race on every directory operation, so the
//! whole procedure holds an advisory exclusive lock on a file at the root.

use anyhow::Context;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::Path;

use crate::constants::LOCK_FILE;

/// Advisory exclusive lock held for the duration of a run.
/// Released when dropped.
pub struct DeployLock {
    _file: File,
}

impl DeployLock {
    /// Takes the lock, failing immediately if another run holds it.
    pub fn acquire(root: &Path) -> anyhow::Result<Self> {
        let path = root.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(&path)
            .with_context(|| format!("Failed to open lock file {}", path.display()))?;

        file.try_lock_exclusive()
            .with_context(|| format!("Another deploy is already running (lock: {})", path.display()))?;

        Ok(Self { _file: file })
    }
}
