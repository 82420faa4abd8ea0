use std::fmt::Write as _;
use std::time::SystemTime;

use crate::dirty::UnsavedState;
use crate::status::{ScmProvider, StatusSnapshot};

pub const CLIENT_MISSING_HEADLINE: &str = "Git or Plastic SCM CLI not found. Install Git or Unity Version Control (Plastic SCM) CLI and restart.";
pub const LOGIN_REQUIRED_HEADLINE: &str =
    "Plastic SCM login required. Sign in via Source Control to continue.";
pub const NO_REPO_HEADLINE: &str =
    "Project is not inside a Git repository or Plastic SCM workspace.";

fn headline_with_details(headline: &str, last_error: &str) -> String {
    if last_error.is_empty() {
        headline.to_string()
    } else {
        format!("{headline}\n\nDetails:\n{last_error}")
    }
}

/// Branch, falling back to the workspace name.
fn branch_label(snapshot: &StatusSnapshot) -> &str {
    if snapshot.branch.is_empty() {
        &snapshot.workspace_name
    } else {
        &snapshot.branch
    }
}

/// Multi-line human-readable report of `snapshot`.
///
/// Errors are included untruncated.
pub fn build_status_summary(
    snapshot: &StatusSnapshot,
    unsaved: &UnsavedState,
    now: SystemTime,
) -> String {
    if !snapshot.client_available {
        return headline_with_details(CLIENT_MISSING_HEADLINE, &snapshot.last_error);
    }
    if snapshot.auth_required {
        return headline_with_details(LOGIN_REQUIRED_HEADLINE, &snapshot.last_error);
    }
    if !snapshot.is_repo {
        return headline_with_details(NO_REPO_HEADLINE, &snapshot.last_error);
    }

    let mut out = String::new();
    let _ = writeln!(out, "Provider: {}", snapshot.provider.label());
    if snapshot.provider == ScmProvider::Plastic && !snapshot.workspace_name.is_empty() {
        let _ = writeln!(out, "Workspace: {}", snapshot.workspace_name);
    }
    let _ = writeln!(out, "Root: {}", snapshot.repo_root);

    let branch = branch_label(snapshot);
    if !branch.is_empty() {
        let _ = writeln!(out, "Branch: {branch}");
    }

    match snapshot.provider {
        ScmProvider::Git => {
            if snapshot.has_upstream {
                let _ = writeln!(
                    out,
                    "Ahead: {}  Behind: {}",
                    snapshot.ahead, snapshot.behind
                );
            } else {
                out.push_str("Upstream: not set\n");
            }
            let _ = writeln!(
                out,
                "Staged: {}  Unstaged: {}  Untracked: {}",
                snapshot.staged, snapshot.unstaged, snapshot.untracked
            );
        }
        ScmProvider::Plastic => {
            if snapshot.behind > 0 {
                let _ = writeln!(out, "Updates available: {}", snapshot.behind);
            }
            let _ = writeln!(
                out,
                "Pending changes: {}",
                snapshot.unstaged.saturating_add(snapshot.untracked)
            );
        }
        ScmProvider::None => {}
    }

    if snapshot.has_conflicts {
        out.push_str("Conflicts: yes\n");
    }
    if !snapshot.last_error.is_empty() {
        let _ = writeln!(out, "Last error: {}", snapshot.last_error);
    }

    if unsaved.has_unsaved_assets {
        let _ = writeln!(out, "Unsaved assets: {}", unsaved.count);
        if !unsaved.sample_name.is_empty() {
            let _ = writeln!(out, "Example: {}", unsaved.sample_name);
        }
    }

    let _ = write!(out, "Updated: {}s ago", snapshot.age(now).as_secs());
    out
}

/// One-line label such as `main | Behind 2`.
pub fn status_label(snapshot: &StatusSnapshot, unsaved: &UnsavedState) -> String {
    if !snapshot.client_available {
        return "SCM Missing".to_string();
    }
    if snapshot.auth_required {
        return "Login Required".to_string();
    }
    if !snapshot.is_repo {
        return "No SCM Repo".to_string();
    }

    let mut branch = branch_label(snapshot);
    if branch.is_empty() {
        branch = "unknown";
    }
    if snapshot.provider == ScmProvider::Git && branch.contains("detached") {
        branch = "detached";
    }

    let state = if snapshot.has_conflicts {
        "Conflicts".to_string()
    } else if unsaved.has_unsaved_assets {
        format!("Unsaved {}", unsaved.count)
    } else if snapshot.is_diverged() {
        "Diverged".to_string()
    } else if snapshot.behind > 0 {
        format!("Behind {}", snapshot.behind)
    } else if !snapshot.is_clean() {
        "Changes".to_string()
    } else if snapshot.ahead > 0 {
        format!("Ahead {}", snapshot.ahead)
    } else {
        "Clean".to_string()
    };

    format!("{branch} | {state}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn git_repo() -> StatusSnapshot {
        let mut snap = StatusSnapshot::new(ScmProvider::Git);
        snap.client_available = true;
        snap.is_repo = true;
        snap.repo_root = "/work/game".into();
        snap.branch = "main".into();
        snap
    }

    #[test]
    fn git_summary_snapshot() {
        let mut snap = git_repo();
        snap.has_upstream = true;
        snap.ahead = 2;
        snap.unstaged = 1;
        let now = snap.last_update + Duration::from_secs(12);
        let unsaved = UnsavedState::from_names(["/Game/Maps/Arena", "/Game/Hero"]);

        insta::assert_snapshot!(build_status_summary(&snap, &unsaved, now), @r"
        Provider: Git
        Root: /work/game
        Branch: main
        Ahead: 2  Behind: 0
        Staged: 0  Unstaged: 1  Untracked: 0
        Unsaved assets: 2
        Example: /Game/Maps/Arena
        Updated: 12s ago
        ");
    }

    #[test]
    fn git_summary_without_upstream() {
        let snap = git_repo();
        let text = build_status_summary(&snap, &UnsavedState::none(), snap.last_update);
        assert!(text.contains("Upstream: not set\n"));
        assert!(!text.contains("Ahead:"));
        assert!(text.ends_with("Updated: 0s ago"));
    }

    #[test]
    fn plastic_summary_shows_workspace_and_pending() {
        let mut snap = StatusSnapshot::new(ScmProvider::Plastic);
        snap.client_available = true;
        snap.is_repo = true;
        snap.workspace_name = "game_wk".into();
        snap.repo_root = "/wk/game".into();
        snap.behind = 4;
        snap.unstaged = 2;
        snap.untracked = 1;

        let text = build_status_summary(&snap, &UnsavedState::none(), snap.last_update);
        assert!(text.starts_with("Provider: Plastic SCM\nWorkspace: game_wk\nRoot: /wk/game\n"));
        assert!(text.contains("Branch: game_wk\n"));
        assert!(text.contains("Updates available: 4\n"));
        assert!(text.contains("Pending changes: 3\n"));
    }

    #[test]
    fn unavailable_states_use_headline_and_details() {
        let missing = StatusSnapshot::client_missing(ScmProvider::None, "Git: Git executable not found.");
        assert_eq!(
            build_status_summary(&missing, &UnsavedState::none(), SystemTime::now()),
            format!("{CLIENT_MISSING_HEADLINE}\n\nDetails:\nGit: Git executable not found.")
        );

        let mut auth = StatusSnapshot::not_a_repo(ScmProvider::Plastic, "");
        auth.auth_required = true;
        assert_eq!(
            build_status_summary(&auth, &UnsavedState::none(), SystemTime::now()),
            LOGIN_REQUIRED_HEADLINE
        );

        let long_error = "x".repeat(500);
        let no_repo = StatusSnapshot::not_a_repo(ScmProvider::Git, long_error.clone());
        let text = build_status_summary(&no_repo, &UnsavedState::none(), SystemTime::now());
        assert!(text.starts_with(NO_REPO_HEADLINE));
        assert!(text.ends_with(&long_error));
    }

    #[test]
    fn label_states_follow_precedence() {
        let none = UnsavedState::none();
        let mut snap = git_repo();
        assert_eq!(status_label(&snap, &none), "main | Clean");

        snap.ahead = 1;
        assert_eq!(status_label(&snap, &none), "main | Ahead 1");

        snap.untracked = 1;
        assert_eq!(status_label(&snap, &none), "main | Changes");

        snap.behind = 2;
        snap.ahead = 0;
        assert_eq!(status_label(&snap, &none), "main | Behind 2");

        snap.ahead = 1;
        assert_eq!(status_label(&snap, &none), "main | Diverged");

        let unsaved = UnsavedState::from_names(["a", "b", "c"]);
        assert_eq!(status_label(&snap, &unsaved), "main | Unsaved 3");

        snap.has_conflicts = true;
        assert_eq!(status_label(&snap, &unsaved), "main | Conflicts");
    }

    #[test]
    fn label_branch_fallbacks() {
        let none = UnsavedState::none();
        let mut snap = git_repo();
        snap.branch = "(detached)".into();
        assert_eq!(status_label(&snap, &none), "detached | Clean");

        snap.branch.clear();
        assert_eq!(status_label(&snap, &none), "unknown | Clean");

        let mut plastic = StatusSnapshot::new(ScmProvider::Plastic);
        plastic.client_available = true;
        plastic.is_repo = true;
        plastic.workspace_name = "wk".into();
        assert_eq!(status_label(&plastic, &none), "wk | Clean");
    }

    #[test]
    fn label_for_unavailable_states() {
        let none = UnsavedState::none();
        assert_eq!(
            status_label(&StatusSnapshot::client_missing(ScmProvider::Git, ""), &none),
            "SCM Missing"
        );
        let mut auth = StatusSnapshot::not_a_repo(ScmProvider::Plastic, "");
        auth.auth_required = true;
        assert_eq!(status_label(&auth, &none), "Login Required");
        assert_eq!(
            status_label(&StatusSnapshot::not_a_repo(ScmProvider::Git, ""), &none),
            "No SCM Repo"
        );
    }
}
