//! Staging tree construction.
//!
//! The staging checkout starts life as a copy of the working checkout.
//! File content is shared via hard links (git replaces worktree files and
//! refs by write-then-rename, so the live tree is never written through),
//! and anything already present at the destination is left alone so an
//! interrupted copy can resume where it stopped.

use anyhow::Context;
use std::fs;
use std::path::Path;

/// Recursively copies `src` into `dst`, hard-linking file content and
/// skipping entries that already exist in `dst`.
pub fn clone_tree(src: &Path, dst: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(dst)
        .with_context(|| format!("Failed to create directory {}", dst.display()))?;

    let entries =
        fs::read_dir(src).with_context(|| format!("Failed to read directory {}", src.display()))?;

    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to read entry in {}", src.display()))?;
        let from = entry.path();
        let to = dst.join(entry.file_name());
        let file_type = entry
            .file_type()
            .with_context(|| format!("Failed to stat {}", from.display()))?;

        if file_type.is_dir() {
            clone_tree(&from, &to)?;
        } else if to.symlink_metadata().is_ok() {
            // already present from a prior partial copy
            continue;
        } else if file_type.is_symlink() {
            let target = fs::read_link(&from)
                .with_context(|| format!("Failed to read symlink {}", from.display()))?;
            std::os::unix::fs::symlink(&target, &to)
                .with_context(|| format!("Failed to create symlink {}", to.display()))?;
        } else if fs::hard_link(&from, &to).is_err() {
            fs::copy(&from, &to)
                .with_context(|| format!("Failed to copy {}", from.display()))?;
        }
    }

    Ok(())
}
