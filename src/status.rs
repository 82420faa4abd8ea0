//! The normalized status record shared by every backend.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, SystemTime};

use crate::errors::ScmError;

/// Which backend produced a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScmProvider {
    #[default]
    None,
    Git,
    Plastic,
}

impl ScmProvider {
    pub fn label(&self) -> &'static str {
        match self {
            ScmProvider::None => "Source Control",
            ScmProvider::Git => "Git",
            ScmProvider::Plastic => "Plastic SCM",
        }
    }

    /// Interpret a host-declared backend name.
    ///
    /// "plastic"/"unity" map to Plastic, anything containing "git" to Git.
    pub fn from_host_name(name: &str) -> Option<ScmProvider> {
        let lower = name.to_lowercase();
        if lower.contains("plastic") || lower.contains("unity") {
            Some(ScmProvider::Plastic)
        } else if lower.contains("git") {
            Some(ScmProvider::Git)
        } else {
            None
        }
    }
}

impl fmt::Display for ScmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Complete status of one backend at one point in time.
///
/// Replaced wholesale on every refresh, never mutated after it is published.
/// Counts are unsigned so they can never go negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub provider: ScmProvider,
    pub client_available: bool,
    pub is_repo: bool,
    pub auth_required: bool,
    pub has_upstream: bool,
    pub has_conflicts: bool,
    pub ahead: u32,
    pub behind: u32,
    pub staged: u32,
    pub unstaged: u32,
    pub untracked: u32,
    pub branch: String,
    pub repo_root: String,
    pub workspace_name: String,
    pub last_error: String,
    pub last_update: SystemTime,
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        Self::new(ScmProvider::None)
    }
}

impl StatusSnapshot {
    pub fn new(provider: ScmProvider) -> Self {
        Self {
            provider,
            client_available: false,
            is_repo: false,
            auth_required: false,
            has_upstream: false,
            has_conflicts: false,
            ahead: 0,
            behind: 0,
            staged: 0,
            unstaged: 0,
            untracked: 0,
            branch: String::new(),
            repo_root: String::new(),
            workspace_name: String::new(),
            last_error: String::new(),
            last_update: SystemTime::now(),
        }
    }

    /// The backend's executable could not be launched.
    pub fn client_missing(provider: ScmProvider, error: impl Into<String>) -> Self {
        Self {
            last_error: error.into(),
            ..Self::new(provider)
        }
    }

    /// Client ran but the directory is not one of its working copies.
    pub fn not_a_repo(provider: ScmProvider, error: impl Into<String>) -> Self {
        Self {
            client_available: true,
            last_error: error.into(),
            ..Self::new(provider)
        }
    }

    pub fn change_count(&self) -> u32 {
        self.staged
            .saturating_add(self.unstaged)
            .saturating_add(self.untracked)
    }

    /// No staged, unstaged, or untracked changes.
    pub fn is_clean(&self) -> bool {
        self.change_count() == 0
    }

    pub fn is_diverged(&self) -> bool {
        self.ahead > 0 && self.behind > 0
    }

    /// Time elapsed since the snapshot was created; zero if the clock went backwards.
    pub fn age(&self, now: SystemTime) -> Duration {
        now.duration_since(self.last_update).unwrap_or_default()
    }

    /// Classify the snapshot's failure state, if any.
    pub fn error_kind(&self) -> Option<ScmError> {
        if !self.client_available {
            return Some(ScmError::ClientMissing(self.last_error.clone()));
        }
        if self.auth_required {
            return Some(ScmError::AuthRequired(self.last_error.clone()));
        }
        if !self.is_repo {
            return Some(ScmError::NotARepository(self.last_error.clone()));
        }
        None
    }
}
