//! Deployment layout and upstream identifiers.
//!
//! Centralized names so the directory dance reads the same everywhere.

/// Deployment root holding the working, staging, and retired checkouts.
pub const DEPLOY_ROOT: &str = "/srv/app-aspell-net";

/// The checkout currently backing the running application.
pub const WORKING_DIR: &str = "git";

/// Transient checkout being updated during a run.
pub const STAGING_DIR: &str = "git-new";

/// Previous working checkout, kept as a single backup generation.
pub const RETIRED_DIR: &str = "git-old";

/// Nested checkout tracking the scowl release stream, inside the working
/// checkout.
pub const NESTED_DIR: &str = "scowl";

pub const REMOTE: &str = "origin";
pub const PRIMARY_BRANCH: &str = "master";
pub const SECONDARY_BRANCH: &str = "v2";

/// Make target (and file name) of the wordlist database consumed by the
/// application.
pub const ARTIFACT_TARGET: &str = "scowl.db";

/// systemd unit backing the running application.
pub const SERVICE_UNIT: &str = "app-aspell-net";

/// Advisory lock file taken for the duration of a run, at the deployment
/// root.
pub const LOCK_FILE: &str = ".deploy.lock";

/// Progress spinner tick interval in milliseconds.
pub const PROGRESS_TICK_MS: u64 = 80;
