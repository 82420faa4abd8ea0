use std::path::Path;
use std::sync::Arc;

pub mod git;
pub mod plastic;

pub use git::GitProvider;
pub use plastic::PlasticProvider;

use crate::app_config::EngineConfig;
use crate::errors::LaunchFailure;
use crate::plugins::{CommandOutput, Plugins};
use crate::status::{ScmProvider, StatusSnapshot};

/// Capability every backend exposes to the aggregator and executor.
///
/// Both methods block on child processes; call them from a worker thread.
pub trait Provider: Send + Sync {
    /// Which backend this is.
    fn kind(&self) -> ScmProvider;

    /// Best-effort status of `project_dir`. Never fails: every problem is
    /// folded into the snapshot.
    fn probe(&self, project_dir: &Path) -> StatusSnapshot;

    /// Run one client command (fetch, pull, update, ...) in `cwd`.
    fn run_command(&self, args: &[String], cwd: &Path) -> Result<CommandOutput, LaunchFailure>;
}

/// Backends in fallback order: Git first, then Plastic.
pub fn default_providers(plugins: Arc<Plugins>, config: &EngineConfig) -> Vec<Arc<dyn Provider>> {
    vec![
        Arc::new(GitProvider::with_executable(
            plugins.clone(),
            config.git_executable.clone(),
        )),
        Arc::new(PlasticProvider::with_executable(
            plugins,
            config.plastic_executable.clone(),
        )),
    ]
}
