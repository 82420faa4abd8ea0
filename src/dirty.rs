//! Seam to the host's dirty-document tracker.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// Unsaved-work report from the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsavedState {
    pub has_unsaved_assets: bool,
    pub count: u32,
    /// Name of one unsaved item, empty when none.
    pub sample_name: String,
}

impl UnsavedState {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        Self {
            has_unsaved_assets: !names.is_empty(),
            count: u32::try_from(names.len()).unwrap_or(u32::MAX),
            sample_name: names.into_iter().next().unwrap_or_default(),
        }
    }
}

pub trait DirtyTracker: Send + Sync {
    fn unsaved_state(&self) -> UnsavedState;
}

/// Host without unsaved-document tracking.
pub struct NoUnsavedWork;

impl DirtyTracker for NoUnsavedWork {
    fn unsaved_state(&self) -> UnsavedState {
        UnsavedState::none()
    }
}

/// Tracker the host updates by hand; cloned handles share the state.
#[derive(Clone, Default)]
pub struct SharedDirtyState {
    inner: Arc<Mutex<UnsavedState>>,
}

impl SharedDirtyState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, state: UnsavedState) {
        *self.inner.lock().unwrap_or_else(|e| e.into_inner()) = state;
    }
}

impl DirtyTracker for SharedDirtyState {
    fn unsaved_state(&self) -> UnsavedState {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}
