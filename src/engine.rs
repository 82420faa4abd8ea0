//! One status session: aggregator, executor, and poll cadence wired together.

use log::{debug, info};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::aggregator::StatusAggregator;
use crate::app_config::EngineConfig;
use crate::dirty::{DirtyTracker, UnsavedState};
use crate::errors::ScmError;
use crate::executor::{CommandExecutor, CommandRequest, CommandResult};
use crate::gate::{self, SyncAction};
use crate::notify::{Notifier, NotifyLevel, StatusToaster};
use crate::plugins::Plugins;
use crate::providers::{Provider, default_providers};
use crate::scheduler::Scheduler;
use crate::status::StatusSnapshot;
use crate::summary;

/// Upper bound on the loop's tick period so small intervals are honoured promptly.
const TICK_CAP: Duration = Duration::from_millis(250);

pub struct Engine {
    config: EngineConfig,
    aggregator: StatusAggregator,
    executor: CommandExecutor,
    notifier: Arc<dyn Notifier>,
    dirty: Arc<dyn DirtyTracker>,
    unsaved: UnsavedState,
    toaster: StatusToaster,
    scheduler: Scheduler,
    auto_fetch_enabled: bool,
    /// Set once the first probe is applied; no labels are toasted before that.
    probed: bool,
}

impl Engine {
    pub fn new(
        project_dir: impl Into<PathBuf>,
        config: EngineConfig,
        providers: Vec<Arc<dyn Provider>>,
        notifier: Arc<dyn Notifier>,
        dirty: Arc<dyn DirtyTracker>,
    ) -> Self {
        let project_dir = project_dir.into();
        let aggregator = StatusAggregator::new(
            providers.clone(),
            config.preferred_backend(),
            project_dir.clone(),
        );
        let executor = CommandExecutor::new(providers, project_dir, notifier.clone());
        Self {
            scheduler: Scheduler::new(&config, Instant::now()),
            auto_fetch_enabled: config.auto_fetch_enabled,
            config,
            aggregator,
            executor,
            notifier,
            dirty,
            unsaved: UnsavedState::none(),
            toaster: StatusToaster::new(),
            probed: false,
        }
    }

    /// Engine backed by the real `git` and `cm` executables found on PATH.
    pub fn with_os_tools(
        project_dir: impl Into<PathBuf>,
        config: EngineConfig,
        notifier: Arc<dyn Notifier>,
        dirty: Arc<dyn DirtyTracker>,
    ) -> Self {
        let providers = default_providers(Plugins::os(), &config);
        Self::new(project_dir, config, providers, notifier, dirty)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn project_dir(&self) -> &Path {
        self.aggregator.project_dir()
    }

    pub fn snapshot(&self) -> Arc<StatusSnapshot> {
        self.aggregator.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<StatusSnapshot>> {
        self.aggregator.subscribe()
    }

    pub fn unsaved_state(&self) -> &UnsavedState {
        &self.unsaved
    }

    pub fn request_refresh(&mut self) -> bool {
        self.aggregator.request_refresh()
    }

    pub fn is_probe_in_flight(&self) -> bool {
        self.aggregator.is_probe_in_flight()
    }

    pub fn pending_commands(&self) -> usize {
        self.executor.pending()
    }

    /// Re-read unsaved state, probe, and wait for the result.
    pub async fn refresh_now(&mut self) -> Arc<StatusSnapshot> {
        self.check_unsaved(Instant::now());
        self.aggregator.request_refresh();
        let snapshot = self.wait_for_probe().await;
        self.scheduler.restart_status(Instant::now());
        snapshot
    }

    /// Wait for the probe in flight and apply it. Pending forever when none runs.
    pub async fn wait_for_probe(&mut self) -> Arc<StatusSnapshot> {
        let snapshot = self.aggregator.wait_for_probe().await;
        self.after_probe(Instant::now());
        snapshot
    }

    pub fn can_run_git_command(&self) -> bool {
        gate::can_run_git_command(&self.snapshot())
    }

    pub fn can_pull(&self) -> bool {
        gate::can_pull(&self.snapshot(), self.unsaved.has_unsaved_assets)
    }

    pub fn can_push(&self) -> bool {
        gate::can_push(&self.snapshot(), self.unsaved.has_unsaved_assets)
    }

    pub fn can_update(&self) -> bool {
        gate::can_update(&self.snapshot(), self.unsaved.has_unsaved_assets)
    }

    pub fn is_enabled(&self, action: SyncAction) -> bool {
        action.is_enabled(&self.snapshot(), self.unsaved.has_unsaved_assets)
    }

    pub fn build_status_summary(&self) -> String {
        summary::build_status_summary(&self.snapshot(), &self.unsaved, SystemTime::now())
    }

    pub fn status_label(&self) -> String {
        summary::status_label(&self.snapshot(), &self.unsaved)
    }

    pub fn auto_fetch_enabled(&self) -> bool {
        self.auto_fetch_enabled
    }

    /// Flip auto-fetch and restart its interval. Returns the new state.
    pub fn toggle_auto_fetch(&mut self) -> bool {
        self.auto_fetch_enabled = !self.auto_fetch_enabled;
        self.scheduler.restart_auto_fetch(Instant::now());
        info!(
            "auto fetch {}",
            if self.auto_fetch_enabled { "enabled" } else { "disabled" }
        );
        self.auto_fetch_enabled
    }

    /// Start `action` if its gate is open; otherwise explain why not.
    pub fn run_action(&mut self, action: SyncAction) -> Result<(), ScmError> {
        if !self.is_enabled(action) {
            let message = action.disabled_message();
            self.notifier.notify(message, NotifyLevel::Failure);
            return Err(ScmError::ActionDisabled(message.to_string()));
        }
        self.run_mutating_command(CommandRequest::for_action(action))
    }

    /// Start an arbitrary client command on the active backend.
    pub fn run_mutating_command(&mut self, request: CommandRequest) -> Result<(), ScmError> {
        let snapshot = self.snapshot();
        self.executor.run_mutating_command(&snapshot, request)
    }

    /// Wait for the next mutating command, report it, and re-probe if asked.
    pub async fn wait_for_command(&mut self) -> CommandResult {
        let result = self.executor.wait_for_command().await;
        self.after_command(&result);
        result
    }

    /// One scheduler step: apply finished work, then run whatever is due.
    pub fn tick(&mut self, now: Instant) {
        while self.aggregator.apply_completed().is_some() {
            self.after_probe(now);
        }
        while let Some(result) = self.executor.try_completed() {
            self.after_command(&result);
        }

        let due = self.scheduler.poll(now, self.auto_fetch_enabled);
        if due.dirty_check {
            self.check_unsaved(now);
        }
        // Before the status probe, which would otherwise hold off auto-fetch.
        // Stays due on later ticks until a fetch actually starts.
        if due.auto_fetch
            && self.can_run_git_command()
            && !self.is_probe_in_flight()
            && self
                .run_mutating_command(CommandRequest::for_action(SyncAction::AutoFetch))
                .is_ok()
        {
            debug!("auto fetch started");
            self.scheduler.restart_auto_fetch(now);
        }
        if due.status_check {
            self.aggregator.request_refresh();
        }
    }

    /// Drive the session until `shutdown` resolves.
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(self.scheduler.tick_period().min(TICK_CAP));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => self.tick(Instant::now()),
                _ = self.aggregator.wait_for_probe() => self.after_probe(Instant::now()),
                result = self.executor.wait_for_command() => self.after_command(&result),
            }
        }
        debug!("engine loop stopped");
    }

    fn check_unsaved(&mut self, now: Instant) {
        let state = self.dirty.unsaved_state();
        if state != self.unsaved {
            self.unsaved = state;
            self.maybe_toast(now);
        }
    }

    fn after_probe(&mut self, now: Instant) {
        self.probed = true;
        self.maybe_toast(now);
    }

    fn after_command(&mut self, result: &CommandResult) {
        if self.executor.report(result) {
            self.aggregator.request_refresh();
        }
    }

    fn maybe_toast(&mut self, now: Instant) {
        if !self.probed {
            return;
        }
        let label = self.status_label();
        if let Some(message) = self.toaster.observe(
            &label,
            self.config.toast_on_status_change,
            self.config.status_toast_min_interval(),
            now,
        ) {
            self.notifier.notify(&message, NotifyLevel::Success);
        }
    }
}
