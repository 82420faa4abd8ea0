mod binaries;
mod registry;
mod resolve;
mod runner;
mod tool;

use std::ffi::OsString;
use std::path::Path;
use std::sync::Arc;

pub use binaries::{Cm, Git};
pub use registry::{ToolRegistry, ToolResolver};
pub use resolve::{LiteralResolver, PathResolver, find_in_path};
pub use runner::{CommandOutput, MockRunner, OsRunner, RunCall, Runner};
pub use tool::NamedTool;

use crate::errors::LaunchFailure;

/// Central access point for the external VCS command-line clients.
///
/// Scope: resolve a client, run it in a working directory, capture its output.
/// Callers own argument construction and parsing.
pub struct Plugins {
    runner: Arc<dyn Runner>,
    registry: ToolRegistry,
}

impl Plugins {
    pub fn new(runner: Arc<dyn Runner>, resolver: Arc<dyn ToolResolver>) -> Self {
        Self {
            runner,
            registry: ToolRegistry::new(resolver),
        }
    }

    /// Real processes, tools resolved on PATH.
    pub fn os() -> Arc<Plugins> {
        Arc::new(Plugins::new(Arc::new(OsRunner), Arc::new(PathResolver)))
    }

    /// Resolve `tool` and run it in `cwd`.
    ///
    /// Blocking. A nonzero exit is returned as `Ok`; only a missing or
    /// unlaunchable executable is an error.
    pub fn run(
        &self,
        tool: &str,
        args: &[OsString],
        cwd: &Path,
    ) -> Result<CommandOutput, LaunchFailure> {
        let program = self
            .registry
            .require(tool)
            .map_err(|source| LaunchFailure::new(tool, source))?;
        log::debug!("running {} {:?} in {}", program.display(), args, cwd.display());
        self.runner
            .output(&program, args, cwd)
            .map_err(|source| LaunchFailure::new(tool, source))
    }
}
