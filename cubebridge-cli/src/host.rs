//! Host-side collaborators: page retrieval over HTTP, build verification
//! and editor launch.

use anyhow::{bail, Context};
use cubebridge::fetch::{is_url, FetchError, FilePageSource, PageSource};
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

const FETCH_TIMEOUT: Duration = Duration::from_secs(45);

/// Blocking HTTP retrieval; local paths are read from disk.
pub struct HttpPageSource {
    client: reqwest::blocking::Client,
}

impl HttpPageSource {
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(concat!("cubebridge/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client })
    }
}

impl PageSource for HttpPageSource {
    fn fetch_page(&self, location: &str) -> Result<String, FetchError> {
        if !is_url(location) {
            return FilePageSource.fetch_page(location);
        }
        tracing::debug!("GET {}", location);
        self.client
            .get(location)
            .send()
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.text())
            .map_err(|e| FetchError::unavailable(location, e))
    }
}

/// `pio run` in the migrated project. Its output goes to stderr so stdout
/// stays the migration report.
pub fn run_build(project: &Path) -> anyhow::Result<()> {
    tracing::info!("Running pio run in {}", project.display());
    let status = Command::new("pio")
        .arg("run")
        .current_dir(project)
        .stdout(Stdio::from(std::io::stderr()))
        .status()
        .context("failed to start `pio` (is PlatformIO installed?)")?;
    if !status.success() {
        bail!("`pio run` exited with {}", status);
    }
    Ok(())
}

pub fn open_editor(editor: &str, project: &Path) -> anyhow::Result<()> {
    Command::new(editor)
        .arg(project)
        .stdout(Stdio::from(std::io::stderr()))
        .spawn()
        .with_context(|| format!("failed to launch editor `{}`", editor))?;
    Ok(())
}
