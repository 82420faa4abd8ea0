use std::sync::Arc;

use super::{NamedTool, Plugins};

/// Thin adapters for the two VCS clients.
///
/// These only provide tool identity + execution. `providers::git` and
/// `providers::plastic` own argument construction and parsing.
macro_rules! define_tool {
    ($name:ident, $default_bin:literal) => {
        #[derive(Clone)]
        pub struct $name {
            plugins: Arc<Plugins>,
            executable: String,
        }

        impl $name {
            pub const DEFAULT_EXECUTABLE: &'static str = $default_bin;

            pub fn new(plugins: Arc<Plugins>) -> Self {
                Self::with_executable(plugins, Self::DEFAULT_EXECUTABLE)
            }

            pub fn with_executable(plugins: Arc<Plugins>, executable: impl Into<String>) -> Self {
                Self {
                    plugins,
                    executable: executable.into(),
                }
            }
        }

        impl NamedTool for $name {
            fn executable(&self) -> &str {
                &self.executable
            }

            fn plugins(&self) -> &Plugins {
                &self.plugins
            }
        }
    };
}

define_tool!(Git, "git");
define_tool!(Cm, "cm");
