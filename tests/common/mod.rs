//! Test infrastructure for scowl-deploy integration tests.

use anyhow::Result;
use scowl_deploy::config::{Config, Verbosity};
use scowl_deploy::constants::{
    ARTIFACT_TARGET, NESTED_DIR, RETIRED_DIR, SECONDARY_BRANCH, STAGING_DIR, WORKING_DIR,
};
use scowl_deploy::deploy::{DeployCallbacks, DeployResult, DeployStep};
use scowl_deploy::git::{no_op_logger, run_git};
use scowl_deploy::service::ServiceManager;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

/// Quiet configuration so test runs produce no progress output.
pub fn test_config() -> Config {
    Config {
        verbosity: Verbosity::Quiet,
    }
}

fn git(repo: &Path, args: &[&str]) -> Result<String> {
    run_git(repo, args, no_op_logger)
}

fn configure_identity(repo: &Path) -> Result<()> {
    git(repo, &["config", "user.email", "test@example.com"])?;
    git(repo, &["config", "user.name", "Test User"])?;
    Ok(())
}

/// Makefile whose build recipe records the commit it was built from, so
/// tests can assert the artifact was regenerated at the expected tip.
const MAKEFILE_OK: &str = "scowl.db:\n\tgit rev-parse HEAD > scowl.db\n\n.PHONY: scowl.db\n";

/// Makefile whose build recipe always fails.
const MAKEFILE_BROKEN: &str = "scowl.db:\n\tfalse\n\n.PHONY: scowl.db\n";

/// A minimal standalone git repository for wrapper-level tests.
/// Automatically cleaned up when dropped.
pub struct ScratchRepo {
    _temp_dir: TempDir,
    path: PathBuf,
}

impl ScratchRepo {
    /// Creates a repository with an initial commit on the master branch.
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().to_path_buf();

        git(&path, &["init", "-b", "master"])?;
        configure_identity(&path)?;

        std::fs::write(path.join("README.md"), "# Scratch Repo\n")?;
        git(&path, &["add", "README.md"])?;
        git(&path, &["commit", "-m", "Initial commit"])?;

        Ok(Self {
            _temp_dir: temp_dir,
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes `name`, commits it, and returns the new HEAD.
    pub fn commit_file(&self, name: &str, content: &str, message: &str) -> Result<String> {
        std::fs::write(self.path.join(name), content)?;
        git(&self.path, &["add", name])?;
        git(&self.path, &["commit", "-m", message])?;
        git(&self.path, &["rev-parse", "HEAD"])
    }
}

/// A full deployment root: a nested upstream on the v2 release branch, a
/// main upstream carrying it as a submodule, and a recursively-cloned
/// working checkout under `<root>/git`.
pub struct DeployFixture {
    _temp_dir: TempDir,
    pub root: PathBuf,
    pub main_upstream: PathBuf,
    pub nested_upstream: PathBuf,
}

impl DeployFixture {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let base = temp_dir.path().to_path_buf();

        // Nested upstream: the scowl checkout's origin, on its release branch.
        let nested_upstream = base.join("scowl-upstream");
        std::fs::create_dir(&nested_upstream)?;
        git(&nested_upstream, &["init", "-b", SECONDARY_BRANCH])?;
        configure_identity(&nested_upstream)?;
        std::fs::write(nested_upstream.join("Makefile"), MAKEFILE_OK)?;
        std::fs::write(nested_upstream.join("words.txt"), "aardvark\n")?;
        git(&nested_upstream, &["add", "-A"])?;
        git(&nested_upstream, &["commit", "-m", "Initial wordlist"])?;

        // Main upstream: the application repo, submodule pinned at the
        // current nested tip.
        let main_upstream = base.join("app-upstream");
        std::fs::create_dir(&main_upstream)?;
        git(&main_upstream, &["init", "-b", "master"])?;
        configure_identity(&main_upstream)?;
        std::fs::write(main_upstream.join("app.py"), "# wordlist app\n")?;
        git(&main_upstream, &["add", "-A"])?;
        git(&main_upstream, &["commit", "-m", "Initial app"])?;
        git(
            &main_upstream,
            &[
                "-c",
                "protocol.file.allow=always",
                "submodule",
                "add",
                "-b",
                SECONDARY_BRANCH,
                nested_upstream.to_str().unwrap(),
                NESTED_DIR,
            ],
        )?;
        git(&main_upstream, &["commit", "-m", "Add scowl submodule"])?;

        // Deployment root: working checkout is a recursive clone.
        let root = base.join("deploy");
        std::fs::create_dir(&root)?;
        let working = root.join(WORKING_DIR);
        git(
            &base,
            &[
                "-c",
                "protocol.file.allow=always",
                "clone",
                "--recurse-submodules",
                main_upstream.to_str().unwrap(),
                working.to_str().unwrap(),
            ],
        )?;
        configure_identity(&working)?;
        git(&working, &["config", "protocol.file.allow", "always"])?;
        let nested = working.join(NESTED_DIR);
        configure_identity(&nested)?;
        git(&nested, &["config", "protocol.file.allow", "always"])?;

        Ok(Self {
            _temp_dir: temp_dir,
            root,
            main_upstream,
            nested_upstream,
        })
    }

    pub fn working(&self) -> PathBuf {
        self.root.join(WORKING_DIR)
    }

    pub fn staging(&self) -> PathBuf {
        self.root.join(STAGING_DIR)
    }

    pub fn retired(&self) -> PathBuf {
        self.root.join(RETIRED_DIR)
    }

    pub fn working_nested(&self) -> PathBuf {
        self.working().join(NESTED_DIR)
    }

    pub fn artifact(&self) -> PathBuf {
        self.working_nested().join(ARTIFACT_TARGET)
    }

    pub fn head(&self, repo: &Path) -> Result<String> {
        git(repo, &["rev-parse", "HEAD"])
    }

    /// Advances the main upstream's master branch without touching the
    /// submodule pointer. Returns the new tip.
    pub fn advance_main(&self, note: &str) -> Result<String> {
        std::fs::write(
            self.main_upstream.join("app.py"),
            format!("# wordlist app\n# {}\n", note),
        )?;
        git(&self.main_upstream, &["add", "app.py"])?;
        git(&self.main_upstream, &["commit", "-m", "Update app"])?;
        self.head(&self.main_upstream)
    }

    /// Advances the nested upstream's release branch. Returns the new tip.
    pub fn advance_nested(&self, word: &str) -> Result<String> {
        let words = self.nested_upstream.join("words.txt");
        let mut content = std::fs::read_to_string(&words)?;
        content.push_str(word);
        content.push('\n');
        std::fs::write(&words, content)?;
        git(&self.nested_upstream, &["add", "words.txt"])?;
        git(&self.nested_upstream, &["commit", "-m", "Extend wordlist"])?;
        self.head(&self.nested_upstream)
    }

    /// Commits a Makefile whose build recipe fails, on the release branch.
    pub fn break_nested_build(&self) -> Result<String> {
        std::fs::write(self.nested_upstream.join("Makefile"), MAKEFILE_BROKEN)?;
        git(&self.nested_upstream, &["add", "Makefile"])?;
        git(&self.nested_upstream, &["commit", "-m", "Break build"])?;
        self.head(&self.nested_upstream)
    }

    /// Restores the working Makefile on the release branch.
    pub fn fix_nested_build(&self) -> Result<String> {
        std::fs::write(self.nested_upstream.join("Makefile"), MAKEFILE_OK)?;
        git(&self.nested_upstream, &["add", "Makefile"])?;
        git(&self.nested_upstream, &["commit", "-m", "Fix build"])?;
        self.head(&self.nested_upstream)
    }

    /// Moves the main upstream's submodule pointer to `commit`.
    pub fn pin_submodule_to(&self, commit: &str) -> Result<String> {
        let sub = self.main_upstream.join(NESTED_DIR);
        git(&sub, &["-c", "protocol.file.allow=always", "fetch", "origin"])?;
        git(&sub, &["checkout", commit])?;
        git(&self.main_upstream, &["add", NESTED_DIR])?;
        git(&self.main_upstream, &["commit", "-m", "Pin scowl"])?;
        self.head(&self.main_upstream)
    }

    /// Manufactures a diverged nested reference: the submodule pointer lands
    /// on a side commit while the release branch advances past it. Returns
    /// the pinned side commit.
    pub fn diverge_nested(&self) -> Result<String> {
        git(&self.nested_upstream, &["checkout", "-b", "hotfix"])?;
        std::fs::write(self.nested_upstream.join("hotfix.txt"), "patched\n")?;
        git(&self.nested_upstream, &["add", "hotfix.txt"])?;
        git(&self.nested_upstream, &["commit", "-m", "Hotfix"])?;
        let pinned = self.head(&self.nested_upstream)?;

        git(&self.nested_upstream, &["checkout", SECONDARY_BRANCH])?;
        self.advance_nested("abalone")?;
        self.pin_submodule_to(&pinned)?;
        Ok(pinned)
    }
}

/// What the deployment root looked like when the service manager was called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceEvent {
    Stopped {
        staging_built: bool,
        working_present: bool,
    },
    Started {
        staging_present: bool,
        artifact_live: bool,
    },
}

/// Service manager double that snapshots the filesystem at each call.
pub struct RecordingService {
    root: PathBuf,
    events: Mutex<Vec<ServiceEvent>>,
}

impl RecordingService {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<ServiceEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ServiceManager for RecordingService {
    fn stop(&self) -> anyhow::Result<()> {
        let staging_built = self
            .root
            .join(STAGING_DIR)
            .join(NESTED_DIR)
            .join(ARTIFACT_TARGET)
            .exists();
        let working_present = self.root.join(WORKING_DIR).exists();
        self.events.lock().unwrap().push(ServiceEvent::Stopped {
            staging_built,
            working_present,
        });
        Ok(())
    }

    fn start(&self) -> anyhow::Result<()> {
        let staging_present = self.root.join(STAGING_DIR).exists();
        let artifact_live = self
            .root
            .join(WORKING_DIR)
            .join(NESTED_DIR)
            .join(ARTIFACT_TARGET)
            .exists();
        self.events.lock().unwrap().push(ServiceEvent::Started {
            staging_present,
            artifact_live,
        });
        Ok(())
    }
}

/// Service manager double whose stop call always fails.
pub struct FailingStopService;

impl ServiceManager for FailingStopService {
    fn stop(&self) -> anyhow::Result<()> {
        anyhow::bail!("unit refused to stop")
    }

    fn start(&self) -> anyhow::Result<()> {
        anyhow::bail!("start must not be reached after a failed stop")
    }
}

/// Callbacks double recording the announced step sequence.
#[derive(Default)]
pub struct RecordingCallbacks {
    steps: Mutex<Vec<DeployStep>>,
}

impl RecordingCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> Vec<DeployStep> {
        self.steps.lock().unwrap().clone()
    }
}

impl DeployCallbacks for RecordingCallbacks {
    fn on_start(&self, _root: &Path) {}

    fn on_step(&self, step: &DeployStep) {
        self.steps.lock().unwrap().push(*step);
    }

    fn on_complete(&self, _result: &DeployResult) {}
}
