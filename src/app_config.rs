use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::status::ScmProvider;

/// Project-relative location of the optional settings file.
pub const CONFIG_RELATIVE_PATH: &str = ".scmwatch/config.json";
/// Environment override for the host-declared backend.
pub const PROVIDER_ENV: &str = "SCMWATCH_PROVIDER";

const MIN_DIRTY_CHECK_SECS: f64 = 0.1;
const MIN_STATUS_CHECK_SECS: f64 = 1.0;
const MIN_AUTO_FETCH_SECS: f64 = 10.0;
const MIN_TOAST_INTERVAL_SECS: f64 = 0.5;

/// Read-only settings snapshot handed to the engine at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub dirty_check_interval_seconds: f64,
    pub git_check_interval_seconds: f64,
    pub auto_fetch_enabled: bool,
    pub auto_fetch_interval_seconds: f64,
    pub toast_on_status_change: bool,
    pub status_toast_min_interval_seconds: f64,
    /// Explicit active backend declared by the host, e.g. "Git" or "Plastic SCM".
    pub preferred_provider: Option<String>,
    pub git_executable: String,
    pub plastic_executable: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dirty_check_interval_seconds: 1.0,
            git_check_interval_seconds: 5.0,
            auto_fetch_enabled: false,
            auto_fetch_interval_seconds: 120.0,
            toast_on_status_change: true,
            status_toast_min_interval_seconds: 4.0,
            preferred_provider: None,
            git_executable: "git".to_string(),
            plastic_executable: "cm".to_string(),
        }
    }
}

fn clamped(seconds: f64, min: f64) -> Duration {
    // NaN and negatives fall back to the minimum.
    let secs = if seconds.is_finite() { seconds.max(min) } else { min };
    Duration::from_secs_f64(secs)
}

impl EngineConfig {
    /// Load `<project_dir>/.scmwatch/config.json`, then apply the env override.
    pub fn load(project_dir: &Path) -> anyhow::Result<Self> {
        let mut config = Self::load_at(&Self::path_for(project_dir))?;
        if let Some(name) = std::env::var(PROVIDER_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
        {
            config.preferred_provider = Some(name);
        }
        Ok(config)
    }

    pub fn load_at(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn path_for(project_dir: &Path) -> PathBuf {
        project_dir.join(CONFIG_RELATIVE_PATH)
    }

    pub fn dirty_check_interval(&self) -> Duration {
        clamped(self.dirty_check_interval_seconds, MIN_DIRTY_CHECK_SECS)
    }

    pub fn status_check_interval(&self) -> Duration {
        clamped(self.git_check_interval_seconds, MIN_STATUS_CHECK_SECS)
    }

    pub fn auto_fetch_interval(&self) -> Duration {
        clamped(self.auto_fetch_interval_seconds, MIN_AUTO_FETCH_SECS)
    }

    pub fn status_toast_min_interval(&self) -> Duration {
        clamped(
            self.status_toast_min_interval_seconds,
            MIN_TOAST_INTERVAL_SECS,
        )
    }

    /// Backend the host declared, if it names one we support.
    pub fn preferred_backend(&self) -> Option<ScmProvider> {
        self.preferred_provider
            .as_deref()
            .and_then(ScmProvider::from_host_name)
    }
}
