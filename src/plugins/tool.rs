use std::ffi::OsString;
use std::path::Path;

use super::{CommandOutput, Plugins};
use crate::errors::LaunchFailure;

/// Common interface for a named external VCS client.
///
/// Each client provides a small adapter struct that implements this trait;
/// the providers build arguments and parse output on top of it.
pub trait NamedTool {
    /// Executable name or path handed to the registry.
    fn executable(&self) -> &str;

    fn plugins(&self) -> &Plugins;

    fn run<I, S>(&self, args: I, cwd: &Path) -> Result<CommandOutput, LaunchFailure>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
        self.plugins().run(self.executable(), &args, cwd)
    }
}
