use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

// Settings read from <config_dir>/dowser/config.json
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub user_agent: String,
    pub page_timeout_secs: u64,
    pub probe_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            user_agent: USER_AGENT.to_string(),
            page_timeout_secs: 10,
            probe_timeout_secs: 3,
        }
    }
}

impl Settings {
    /// Loads the settings file, falling back to defaults when it is missing
    /// or unusable. A broken file is worth a warning, not an abort.
    pub fn load() -> Self {
        match Self::try_load() {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Ignoring configuration file: {:#}", e);
                Self::default()
            }
        }
    }

    fn try_load() -> Result<Self> {
        let path = settings_path()?;

        if !path.exists() {
            debug!("No configuration at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        Self::from_json(&contents).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(contents)?)
    }

    // A zero timeout would fail every request, so one second is the floor.
    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs.max(1))
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs.max(1))
    }
}

fn settings_path() -> Result<PathBuf> {
    let mut path = dirs::config_dir().context("Could not determine the configuration directory")?;

    path.push("dowser");
    path.push("config.json");

    Ok(path)
}
