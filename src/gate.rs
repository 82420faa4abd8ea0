//! Safety predicates for the synchronization actions.
//!
//! Never rewrite history or pull remote state over uncommitted or unsaved
//! local work.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::status::{ScmProvider, StatusSnapshot};

/// Mutating commands the engine can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncAction {
    Fetch,
    AutoFetch,
    Pull,
    Push,
    Update,
}

impl SyncAction {
    pub fn backend(&self) -> ScmProvider {
        match self {
            SyncAction::Fetch | SyncAction::AutoFetch | SyncAction::Pull | SyncAction::Push => {
                ScmProvider::Git
            }
            SyncAction::Update => ScmProvider::Plastic,
        }
    }

    /// Client arguments, without the executable.
    pub fn args(&self) -> Vec<String> {
        let args: &[&str] = match self {
            SyncAction::Fetch | SyncAction::AutoFetch => &["fetch", "--prune"],
            SyncAction::Pull => &["pull", "--rebase"],
            SyncAction::Push => &["push"],
            SyncAction::Update => &["update"],
        };
        args.iter().map(|a| a.to_string()).collect()
    }

    pub fn success_message(&self) -> &'static str {
        match self {
            SyncAction::Fetch => "Fetch completed.",
            SyncAction::AutoFetch => "Auto fetch completed.",
            SyncAction::Pull => "Pull completed.",
            SyncAction::Push => "Push completed.",
            SyncAction::Update => "Update completed.",
        }
    }

    pub fn failure_message(&self) -> &'static str {
        match self {
            SyncAction::Fetch => "Fetch failed.",
            SyncAction::AutoFetch => "Auto fetch failed.",
            SyncAction::Pull => "Pull failed.",
            SyncAction::Push => "Push failed.",
            SyncAction::Update => "Update failed.",
        }
    }

    /// Shown when the action is invoked while its gate is closed.
    pub fn disabled_message(&self) -> &'static str {
        match self {
            SyncAction::Fetch | SyncAction::AutoFetch => "Git is not available for this project.",
            SyncAction::Pull => {
                "Pull is disabled until the working tree is clean and upstream is set."
            }
            SyncAction::Push => {
                "Push is disabled until the working tree is clean, ahead, and upstream is set."
            }
            SyncAction::Update => {
                "Update is disabled until the workspace is clean and there are no unsaved assets."
            }
        }
    }

    /// Question to ask before running the action, for actions that touch the tree or remote.
    pub fn confirmation_prompt(&self) -> Option<&'static str> {
        match self {
            SyncAction::Pull => {
                Some("Pull from upstream with rebase? This will update your working tree.")
            }
            SyncAction::Push => Some("Push local commits to upstream?"),
            SyncAction::Update => Some("Update workspace to the latest changeset?"),
            SyncAction::Fetch | SyncAction::AutoFetch => None,
        }
    }

    /// Auto-fetch is quiet unless it fails.
    pub fn silent_on_success(&self) -> bool {
        matches!(self, SyncAction::AutoFetch)
    }

    pub fn is_enabled(&self, snapshot: &StatusSnapshot, has_unsaved_assets: bool) -> bool {
        match self {
            SyncAction::Fetch | SyncAction::AutoFetch => can_run_git_command(snapshot),
            SyncAction::Pull => can_pull(snapshot, has_unsaved_assets),
            SyncAction::Push => can_push(snapshot, has_unsaved_assets),
            SyncAction::Update => can_update(snapshot, has_unsaved_assets),
        }
    }
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncAction::Fetch => "fetch",
            SyncAction::AutoFetch => "auto-fetch",
            SyncAction::Pull => "pull",
            SyncAction::Push => "push",
            SyncAction::Update => "update",
        };
        f.write_str(name)
    }
}

/// `provider` is the active backend and its working copy is usable.
pub fn backend_ready(snapshot: &StatusSnapshot, provider: ScmProvider) -> bool {
    snapshot.provider == provider && snapshot.client_available && snapshot.is_repo
}

/// Generic Git commands (fetch, auto-fetch).
pub fn can_run_git_command(snapshot: &StatusSnapshot) -> bool {
    backend_ready(snapshot, ScmProvider::Git)
}

pub fn can_pull(snapshot: &StatusSnapshot, has_unsaved_assets: bool) -> bool {
    can_run_git_command(snapshot)
        && snapshot.has_upstream
        && snapshot.behind > 0
        && snapshot.is_clean()
        && !has_unsaved_assets
}

pub fn can_push(snapshot: &StatusSnapshot, has_unsaved_assets: bool) -> bool {
    can_run_git_command(snapshot)
        && snapshot.has_upstream
        && snapshot.ahead > 0
        && snapshot.behind == 0
        && snapshot.is_clean()
        && !has_unsaved_assets
}

pub fn can_update(snapshot: &StatusSnapshot, has_unsaved_assets: bool) -> bool {
    backend_ready(snapshot, ScmProvider::Plastic) && snapshot.is_clean() && !has_unsaved_assets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn git_repo() -> StatusSnapshot {
        let mut snap = StatusSnapshot::new(ScmProvider::Git);
        snap.client_available = true;
        snap.is_repo = true;
        snap.has_upstream = true;
        snap
    }

    fn plastic_repo() -> StatusSnapshot {
        let mut snap = StatusSnapshot::new(ScmProvider::Plastic);
        snap.client_available = true;
        snap.is_repo = true;
        snap
    }

    #[test]
    fn git_command_requires_git_repo() {
        assert!(can_run_git_command(&git_repo()));
        assert!(!can_run_git_command(&plastic_repo()));

        let mut missing = git_repo();
        missing.client_available = false;
        assert!(!can_run_git_command(&missing));

        let mut no_repo = git_repo();
        no_repo.is_repo = false;
        assert!(!can_run_git_command(&no_repo));
    }

    #[test]
    fn pull_disabled_with_unsaved_assets_regardless_of_counts() {
        for (ahead, behind) in [(0, 1), (0, 5), (2, 3), (0, 0)] {
            let mut snap = git_repo();
            snap.ahead = ahead;
            snap.behind = behind;
            assert!(!can_pull(&snap, true), "ahead={ahead} behind={behind}");
        }
    }

    #[test]
    fn pull_requires_behind_upstream_and_clean_tree() {
        let mut snap = git_repo();
        snap.behind = 2;
        assert!(can_pull(&snap, false));

        let mut no_upstream = snap.clone();
        no_upstream.has_upstream = false;
        assert!(!can_pull(&no_upstream, false));

        let mut dirty = snap.clone();
        dirty.untracked = 1;
        assert!(!can_pull(&dirty, false));

        let mut up_to_date = snap.clone();
        up_to_date.behind = 0;
        assert!(!can_pull(&up_to_date, false));
    }

    #[test]
    fn push_flips_off_when_any_condition_fails() {
        let mut base = git_repo();
        base.ahead = 1;
        assert!(can_push(&base, false));

        let mut not_ahead = base.clone();
        not_ahead.ahead = 0;
        let mut behind = base.clone();
        behind.behind = 1;
        let mut staged = base.clone();
        staged.staged = 1;
        let mut unstaged = base.clone();
        unstaged.unstaged = 1;
        let mut no_upstream = base.clone();
        no_upstream.has_upstream = false;

        for snap in [&not_ahead, &behind, &staged, &unstaged, &no_upstream] {
            assert!(!can_push(snap, false));
        }
        assert!(!can_push(&base, true));
    }

    #[test]
    fn update_needs_clean_plastic_workspace() {
        let snap = plastic_repo();
        assert!(can_update(&snap, false));
        assert!(!can_update(&snap, true));
        assert!(!can_update(&git_repo(), false));

        let mut pending = plastic_repo();
        pending.unstaged = 3;
        assert!(!can_update(&pending, false));
    }

    #[test]
    fn actions_map_to_backend_args() {
        assert_eq!(SyncAction::Fetch.args(), vec!["fetch", "--prune"]);
        assert_eq!(SyncAction::AutoFetch.args(), vec!["fetch", "--prune"]);
        assert_eq!(SyncAction::Pull.args(), vec!["pull", "--rebase"]);
        assert_eq!(SyncAction::Push.args(), vec!["push"]);
        assert_eq!(SyncAction::Update.args(), vec!["update"]);
        assert_eq!(SyncAction::Update.backend(), ScmProvider::Plastic);
        assert!(SyncAction::AutoFetch.silent_on_success());
        assert!(!SyncAction::Fetch.silent_on_success());
        assert!(SyncAction::Fetch.confirmation_prompt().is_none());
    }
}
