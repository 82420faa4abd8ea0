//! Fire-and-forget notification side channel.

use log::{info, warn};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::ui;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyLevel {
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub level: NotifyLevel,
}

pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, level: NotifyLevel);
}

/// Routes notifications to the `log` facade only.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str, level: NotifyLevel) {
        match level {
            NotifyLevel::Success => info!("{message}"),
            NotifyLevel::Failure => warn!("{message}"),
        }
    }
}

/// Prints notifications to the terminal.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &str, level: NotifyLevel) {
        match level {
            NotifyLevel::Success => ui::notice_ok(message),
            NotifyLevel::Failure => ui::notice_err(message),
        }
    }
}

/// Keeps every notification in memory. Intended for tests.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.sent().into_iter().map(|n| n.message).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str, level: NotifyLevel) {
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Notification {
                message: message.to_string(),
                level,
            });
    }
}

/// Decides when a change of the short status label deserves a toast.
///
/// The first label is only recorded. Later changes toast at most once per
/// `min_interval`; changes inside the window are recorded silently.
#[derive(Debug, Default)]
pub struct StatusToaster {
    last_label: Option<String>,
    last_toast: Option<Instant>,
}

impl StatusToaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the toast text to send, if any.
    pub fn observe(
        &mut self,
        label: &str,
        enabled: bool,
        min_interval: Duration,
        now: Instant,
    ) -> Option<String> {
        let previous = self.last_label.replace(label.to_string());
        if !enabled {
            return None;
        }
        let previous = previous?;
        if previous == label {
            return None;
        }

        let due = self
            .last_toast
            .is_none_or(|last| now.saturating_duration_since(last) >= min_interval);
        if !due {
            return None;
        }
        self.last_toast = Some(now);
        Some(format!("scmwatch: {label}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(4);

    #[test]
    fn first_label_is_only_recorded() {
        let mut toaster = StatusToaster::new();
        assert_eq!(toaster.observe("main | Clean", true, WINDOW, Instant::now()), None);
    }

    #[test]
    fn label_change_toasts_once_per_window() {
        let start = Instant::now();
        let mut toaster = StatusToaster::new();
        toaster.observe("main | Clean", true, WINDOW, start);

        assert_eq!(
            toaster.observe("main | Changes", true, WINDOW, start),
            Some("scmwatch: main | Changes".to_string())
        );
        assert_eq!(toaster.observe("main | Changes", true, WINDOW, start), None);
        assert_eq!(
            toaster.observe("main | Ahead 1", true, WINDOW, start + Duration::from_secs(1)),
            None
        );
        assert_eq!(
            toaster.observe("main | Clean", true, WINDOW, start + Duration::from_secs(5)),
            Some("scmwatch: main | Clean".to_string())
        );
    }

    #[test]
    fn disabled_toasts_still_track_label() {
        let now = Instant::now();
        let mut toaster = StatusToaster::new();
        toaster.observe("a", false, WINDOW, now);
        assert_eq!(toaster.observe("b", false, WINDOW, now), None);
        // Re-enabling compares against the label seen while disabled.
        assert_eq!(toaster.observe("b", true, WINDOW, now), None);
        assert!(toaster.observe("c", true, WINDOW, now).is_some());
    }

    #[test]
    fn recording_notifier_keeps_order() {
        let rec = RecordingNotifier::new();
        rec.notify("one", NotifyLevel::Success);
        rec.notify("two", NotifyLevel::Failure);
        assert_eq!(rec.messages(), vec!["one", "two"]);
        assert_eq!(rec.sent()[1].level, NotifyLevel::Failure);
    }
}
