//! Service lifecycle control.
//!
//! The deploy procedure stops the application before the swap and starts it
//! again afterwards. The trait seam lets tests substitute a recorder for the
//! real service manager.

use anyhow::Context;

/// Stop/start control over the running application.
pub trait ServiceManager {
    fn stop(&self) -> anyhow::Result<()>;
    fn start(&self) -> anyhow::Result<()>;
}

/// A systemd unit driven through `systemctl`.
pub struct SystemdUnit {
    unit: String,
}

impl SystemdUnit {
    pub fn new(unit: impl Into<String>) -> Self {
        Self { unit: unit.into() }
    }

    fn systemctl(&self, verb: &str) -> anyhow::Result<()> {
        let output = std::process::Command::new("systemctl")
            .args([verb, &self.unit])
            .output()
            .context("Failed to spawn systemctl")?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("systemctl {} {} failed: {}", verb, self.unit, stderr.trim())
        }
    }
}

impl ServiceManager for SystemdUnit {
    fn stop(&self) -> anyhow::Result<()> {
        self.systemctl("stop")
    }

    fn start(&self) -> anyhow::Result<()> {
        self.systemctl("start")
    }
}
