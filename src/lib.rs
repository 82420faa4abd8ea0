pub mod aggregator;
pub mod app_config;
pub mod dirty;
pub mod engine;
pub mod errors;
pub mod executor;
pub mod gate;
pub mod notify;
pub mod parsers;
pub mod plugins;
pub mod providers;
pub mod sanitize;
pub mod scheduler;
pub mod status;
pub mod summary;
pub mod ui;

pub use crate::aggregator::StatusAggregator;
pub use crate::app_config::EngineConfig;
pub use crate::dirty::{DirtyTracker, UnsavedState};
pub use crate::engine::Engine;
pub use crate::errors::{LaunchFailure, ScmError};
pub use crate::gate::SyncAction;
pub use crate::notify::{Notifier, NotifyLevel};
pub use crate::status::{ScmProvider, StatusSnapshot};
