use thiserror::Error;

use crate::status::ScmProvider;

/// The executable could not be found or started.
#[derive(Error, Debug)]
#[error("failed to launch {tool}: {source}")]
pub struct LaunchFailure {
    pub tool: String,
    pub source: std::io::Error,
}

impl LaunchFailure {
    pub fn new(tool: impl Into<String>, source: std::io::Error) -> Self {
        Self {
            tool: tool.into(),
            source,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScmError {
    /// Client binary not launchable. Terminal for that backend until installed.
    #[error("Client missing: {0}")]
    ClientMissing(String),

    #[error("Not a repository: {0}")]
    NotARepository(String),

    #[error("Authentication required: {0}")]
    AuthRequired(String),

    #[error("Command failed (exit code {exit_code}): {stderr}")]
    CommandFailed { exit_code: i32, stderr: String },

    #[error("{} is not available for this project.", .0.label())]
    Unavailable(ScmProvider),

    #[error("{0}")]
    ActionDisabled(String),
}

impl ScmError {
    /// Failures a later probe can clear without user reinstalling anything.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ScmError::ClientMissing(_))
    }
}
