//! Owns the current snapshot and serializes background probes.

use log::{debug, info};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

use crate::providers::Provider;
use crate::status::{ScmProvider, StatusSnapshot};

/// Probe the configured backends and pick the authoritative snapshot.
///
/// A preferred backend wins outright, even when it finds no repository.
/// Otherwise backends are tried in order and the first one that resolves a
/// repository is adopted. If none does, a `None` snapshot carries the joined
/// errors of every backend that produced one.
pub fn select_status(
    providers: &[Arc<dyn Provider>],
    preferred: Option<ScmProvider>,
    project_dir: &Path,
) -> StatusSnapshot {
    if let Some(kind) = preferred {
        if let Some(provider) = providers.iter().find(|p| p.kind() == kind) {
            debug!("probing preferred backend {kind}");
            return provider.probe(project_dir);
        }
        debug!("preferred backend {kind} is not registered, falling back");
    }

    let mut attempts = Vec::with_capacity(providers.len());
    for provider in providers {
        let snapshot = provider.probe(project_dir);
        if snapshot.is_repo {
            return snapshot;
        }
        attempts.push(snapshot);
    }

    let mut fallback = StatusSnapshot::new(ScmProvider::None);
    fallback.client_available = attempts.iter().any(|s| s.client_available);
    fallback.auth_required = attempts.iter().any(|s| s.auth_required);
    fallback.last_error = attempts
        .iter()
        .filter_map(|s| {
            let error = if s.auth_required {
                format!("{} login required.", s.provider.label())
            } else {
                s.last_error.clone()
            };
            (!error.is_empty()).then(|| format!("{}: {}", s.provider.label(), error))
        })
        .collect::<Vec<_>>()
        .join("\n");
    fallback
}

/// Single owner of the current snapshot and the probe-in-flight flag.
///
/// Readers get an `Arc` to a complete snapshot and never wait on a probe.
/// Probes run on the blocking pool and post their result back on a channel;
/// the owner applies it with [`StatusAggregator::wait_for_probe`] or
/// [`StatusAggregator::apply_completed`].
pub struct StatusAggregator {
    providers: Arc<Vec<Arc<dyn Provider>>>,
    preferred: Option<ScmProvider>,
    project_dir: PathBuf,
    current: watch::Sender<Arc<StatusSnapshot>>,
    in_flight: bool,
    tx: mpsc::UnboundedSender<StatusSnapshot>,
    rx: mpsc::UnboundedReceiver<StatusSnapshot>,
}

impl StatusAggregator {
    pub fn new(
        providers: Vec<Arc<dyn Provider>>,
        preferred: Option<ScmProvider>,
        project_dir: impl Into<PathBuf>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (current, _) = watch::channel(Arc::new(StatusSnapshot::default()));
        Self {
            providers: Arc::new(providers),
            preferred,
            project_dir: project_dir.into(),
            current,
            in_flight: false,
            tx,
            rx,
        }
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    pub fn providers(&self) -> &[Arc<dyn Provider>] {
        &self.providers
    }

    /// Last completed snapshot.
    pub fn snapshot(&self) -> Arc<StatusSnapshot> {
        self.current.borrow().clone()
    }

    /// Receiver for readers living on other tasks or threads.
    pub fn subscribe(&self) -> watch::Receiver<Arc<StatusSnapshot>> {
        self.current.subscribe()
    }

    pub fn is_probe_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Start one background probe unless one is already running.
    ///
    /// Returns whether a probe was started. Must be called inside a tokio runtime.
    pub fn request_refresh(&mut self) -> bool {
        if self.in_flight {
            debug!("refresh requested while a probe is in flight; ignored");
            return false;
        }
        self.in_flight = true;

        let providers = self.providers.clone();
        let preferred = self.preferred;
        let dir = self.project_dir.clone();
        let tx = self.tx.clone();
        tokio::task::spawn_blocking(move || {
            let snapshot = select_status(&providers, preferred, &dir);
            if tx.send(snapshot).is_err() {
                debug!("aggregator dropped before probe finished; discarding result");
            }
        });
        true
    }

    /// Wait for the in-flight probe and apply its result.
    ///
    /// Pending forever when no probe was requested. Cancel safe.
    pub async fn wait_for_probe(&mut self) -> Arc<StatusSnapshot> {
        // `self` holds a sender, so the channel never closes.
        match self.rx.recv().await {
            Some(snapshot) => self.apply(snapshot),
            None => std::future::pending().await,
        }
    }

    /// Apply a finished probe without waiting, for tick-driven hosts.
    pub fn apply_completed(&mut self) -> Option<Arc<StatusSnapshot>> {
        let snapshot = self.rx.try_recv().ok()?;
        Some(self.apply(snapshot))
    }

    fn apply(&mut self, snapshot: StatusSnapshot) -> Arc<StatusSnapshot> {
        let snapshot = Arc::new(snapshot);
        let previous = self.current.send_replace(snapshot.clone());
        self.in_flight = false;
        if previous.provider != snapshot.provider {
            info!("active backend: {}", snapshot.provider);
        }
        snapshot
    }
}
