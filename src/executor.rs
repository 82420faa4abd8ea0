//! Runs mutating VCS commands in the background and reports how they went.

use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::errors::{LaunchFailure, ScmError};
use crate::gate::{SyncAction, backend_ready};
use crate::notify::{Notifier, NotifyLevel};
use crate::plugins::CommandOutput;
use crate::providers::Provider;
use crate::status::{ScmProvider, StatusSnapshot};

/// Failure output longer than this is cut in notifications.
pub const NOTIFY_STDERR_LIMIT: usize = 200;

/// One mutating command and how to report it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    pub backend: ScmProvider,
    pub args: Vec<String>,
    pub success_message: String,
    pub failure_message: String,
    pub refresh_after: bool,
    pub silent_on_success: bool,
}

impl CommandRequest {
    pub fn for_action(action: SyncAction) -> Self {
        Self {
            backend: action.backend(),
            args: action.args(),
            success_message: action.success_message().to_string(),
            failure_message: action.failure_message().to_string(),
            refresh_after: true,
            silent_on_success: action.silent_on_success(),
        }
    }
}

/// Outcome of a finished command, posted back to the executor's owner.
#[derive(Debug)]
pub struct CommandResult {
    pub request: CommandRequest,
    pub outcome: Result<CommandOutput, LaunchFailure>,
}

impl CommandResult {
    pub fn succeeded(&self) -> bool {
        matches!(&self.outcome, Ok(out) if out.success())
    }

    pub fn error(&self) -> Option<ScmError> {
        match &self.outcome {
            Ok(out) if out.success() => None,
            Ok(out) => Some(ScmError::CommandFailed {
                exit_code: out.exit_code,
                stderr: out.stderr.trim().to_string(),
            }),
            Err(_) => Some(ScmError::ClientMissing(self.request.backend.label().to_string())),
        }
    }

    /// Trimmed stderr of a failed run. Empty on success and when the client
    /// never started.
    fn failure_detail(&self) -> String {
        match &self.outcome {
            Ok(out) if out.success() => String::new(),
            Ok(out) => out.stderr.trim().to_string(),
            Err(_) => String::new(),
        }
    }
}

fn clip(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

pub struct CommandExecutor {
    providers: Vec<Arc<dyn Provider>>,
    project_dir: PathBuf,
    notifier: Arc<dyn Notifier>,
    pending: usize,
    tx: mpsc::UnboundedSender<CommandResult>,
    rx: mpsc::UnboundedReceiver<CommandResult>,
}

impl CommandExecutor {
    pub fn new(
        providers: Vec<Arc<dyn Provider>>,
        project_dir: impl Into<PathBuf>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            providers,
            project_dir: project_dir.into(),
            notifier,
            pending: 0,
            tx,
            rx,
        }
    }

    /// Commands started whose result has not been received yet.
    pub fn pending(&self) -> usize {
        self.pending
    }

    fn working_dir(&self, snapshot: &StatusSnapshot) -> PathBuf {
        if snapshot.repo_root.is_empty() {
            self.project_dir.clone()
        } else {
            Path::new(&snapshot.repo_root).to_path_buf()
        }
    }

    /// Start `request` on the blocking pool.
    ///
    /// Refused with a failure notification unless the request's backend is
    /// the active one with a usable client and working copy. Concurrent
    /// commands are not serialized. Must be called inside a tokio runtime.
    pub fn run_mutating_command(
        &mut self,
        snapshot: &StatusSnapshot,
        request: CommandRequest,
    ) -> Result<(), ScmError> {
        let provider = self
            .providers
            .iter()
            .find(|p| p.kind() == request.backend)
            .filter(|_| backend_ready(snapshot, request.backend))
            .cloned();
        let Some(provider) = provider else {
            let err = ScmError::Unavailable(request.backend);
            self.notifier.notify(&err.to_string(), NotifyLevel::Failure);
            return Err(err);
        };

        let cwd = self.working_dir(snapshot);
        info!(
            "running {} {} in {}",
            request.backend,
            request.args.join(" "),
            cwd.display()
        );

        let tx = self.tx.clone();
        self.pending += 1;
        tokio::task::spawn_blocking(move || {
            let outcome = provider.run_command(&request.args, &cwd);
            if tx.send(CommandResult { request, outcome }).is_err() {
                debug!("executor dropped before command finished; discarding result");
            }
        });
        Ok(())
    }

    /// Wait for the next finished command. Pending forever when none runs.
    pub async fn wait_for_command(&mut self) -> CommandResult {
        match self.rx.recv().await {
            Some(result) => {
                self.pending = self.pending.saturating_sub(1);
                result
            }
            None => std::future::pending().await,
        }
    }

    pub fn try_completed(&mut self) -> Option<CommandResult> {
        let result = self.rx.try_recv().ok()?;
        self.pending = self.pending.saturating_sub(1);
        Some(result)
    }

    /// Send the notifications for `result`; returns whether a re-probe is wanted.
    pub fn report(&self, result: &CommandResult) -> bool {
        let request = &result.request;
        if result.succeeded() {
            info!("{}", request.success_message);
            if !request.silent_on_success {
                self.notifier
                    .notify(&request.success_message, NotifyLevel::Success);
            }
        } else {
            match &result.outcome {
                Err(err) => warn!("{} {err}", request.failure_message),
                Ok(_) => warn!("{} {}", request.failure_message, result.failure_detail()),
            }
            self.notifier
                .notify(&request.failure_message, NotifyLevel::Failure);
            let detail = result.failure_detail();
            if !detail.is_empty() {
                self.notifier
                    .notify(&clip(&detail, NOTIFY_STDERR_LIMIT), NotifyLevel::Failure);
            }
        }
        request.refresh_after
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::RecordingNotifier;
    use crate::plugins::{LiteralResolver, MockRunner, Plugins};
    use crate::providers::GitProvider;

    fn git_repo(root: &str) -> StatusSnapshot {
        let mut snap = StatusSnapshot::new(ScmProvider::Git);
        snap.client_available = true;
        snap.is_repo = true;
        snap.repo_root = root.into();
        snap
    }

    fn executor() -> (Arc<MockRunner>, RecordingNotifier, CommandExecutor) {
        let runner = Arc::new(MockRunner::new());
        let plugins = Arc::new(Plugins::new(runner.clone(), Arc::new(LiteralResolver)));
        let notifier = RecordingNotifier::new();
        let providers: Vec<Arc<dyn Provider>> = vec![Arc::new(GitProvider::new(plugins))];
        let exec = CommandExecutor::new(providers, "/project", Arc::new(notifier.clone()));
        (runner, notifier, exec)
    }

    #[tokio::test]
    async fn refuses_when_backend_is_not_active() {
        let (runner, notifier, mut exec) = executor();
        let mut plastic = StatusSnapshot::new(ScmProvider::Plastic);
        plastic.client_available = true;
        plastic.is_repo = true;

        let err = exec
            .run_mutating_command(&plastic, CommandRequest::for_action(SyncAction::Fetch))
            .unwrap_err();
        assert_eq!(err, ScmError::Unavailable(ScmProvider::Git));
        assert_eq!(
            notifier.messages(),
            vec!["Git is not available for this project."]
        );
        assert!(runner.calls().is_empty());
        assert_eq!(exec.pending(), 0);
    }

    #[tokio::test]
    async fn runs_in_repo_root_and_reports_success() {
        let (runner, notifier, mut exec) = executor();
        runner.push_exit(0, "", "");

        exec.run_mutating_command(&git_repo("/work/repo"), CommandRequest::for_action(SyncAction::Push))
            .unwrap();
        let result = exec.wait_for_command().await;
        assert!(exec.report(&result));

        let calls = runner.calls();
        assert_eq!(calls[0].args_line(), "push");
        assert_eq!(calls[0].cwd, PathBuf::from("/work/repo"));
        assert_eq!(notifier.messages(), vec!["Push completed."]);
        assert_eq!(exec.pending(), 0);
    }

    #[tokio::test]
    async fn falls_back_to_project_dir_without_repo_root() {
        let (runner, _notifier, mut exec) = executor();
        runner.push_exit(0, "", "");

        exec.run_mutating_command(&git_repo(""), CommandRequest::for_action(SyncAction::Fetch))
            .unwrap();
        exec.wait_for_command().await;
        assert_eq!(runner.calls()[0].cwd, PathBuf::from("/project"));
    }

    #[tokio::test]
    async fn silent_success_sends_nothing() {
        let (runner, notifier, mut exec) = executor();
        runner.push_exit(0, "", "");

        exec.run_mutating_command(&git_repo("/r"), CommandRequest::for_action(SyncAction::AutoFetch))
            .unwrap();
        let result = exec.wait_for_command().await;
        exec.report(&result);
        assert!(notifier.messages().is_empty());
        assert_eq!(runner.calls()[0].args_line(), "fetch --prune");
    }

    #[tokio::test]
    async fn failure_reports_clipped_stderr() {
        let (runner, notifier, mut exec) = executor();
        let stderr = format!("  {}  ", "e".repeat(350));
        runner.push_exit(1, "", &stderr);

        exec.run_mutating_command(&git_repo("/r"), CommandRequest::for_action(SyncAction::AutoFetch))
            .unwrap();
        let result = exec.wait_for_command().await;
        assert!(!result.succeeded());
        assert!(matches!(
            result.error(),
            Some(ScmError::CommandFailed { exit_code: 1, .. })
        ));

        exec.report(&result);
        let messages = notifier.messages();
        assert_eq!(messages[0], "Auto fetch failed.");
        assert_eq!(messages[1], "e".repeat(NOTIFY_STDERR_LIMIT));
    }

    #[tokio::test]
    async fn failure_with_empty_stderr_sends_one_message() {
        let (runner, notifier, mut exec) = executor();
        runner.push_exit(128, "", "   ");

        exec.run_mutating_command(&git_repo("/r"), CommandRequest::for_action(SyncAction::Pull))
            .unwrap();
        let result = exec.wait_for_command().await;
        exec.report(&result);
        assert_eq!(notifier.messages(), vec!["Pull failed."]);
        assert_eq!(runner.calls()[0].args_line(), "pull --rebase");
    }

    #[tokio::test]
    async fn launch_failure_sends_only_failure_message() {
        let (runner, notifier, mut exec) = executor();
        runner.push_not_found();

        exec.run_mutating_command(&git_repo("/r"), CommandRequest::for_action(SyncAction::Fetch))
            .unwrap();
        let result = exec.wait_for_command().await;
        assert!(exec.report(&result));
        assert_eq!(notifier.messages(), vec!["Fetch failed."]);
        assert!(matches!(result.error(), Some(ScmError::ClientMissing(_))));
    }
}
