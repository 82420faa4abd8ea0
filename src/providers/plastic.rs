use log::debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::Provider;
use crate::errors::LaunchFailure;
use crate::parsers::plastic::{FIELD_SEPARATOR, LINE_END, LINE_START};
use crate::parsers::{
    is_auth_failure, parse_status, parse_status_header, parse_workspace_from_path,
    parse_workspace_info_branch,
};
use crate::plugins::{self, CommandOutput, NamedTool, Plugins};
use crate::status::{ScmProvider, StatusSnapshot};

pub const CLIENT_MISSING: &str = "Plastic SCM CLI not found.";
pub const WORKSPACE_ROOT_MISSING: &str = "Plastic SCM workspace root not found.";

/// Result of one follow-up query once the workspace is known.
enum Step {
    Ok(String),
    /// Authentication failure; the combined output is kept as the error.
    AuthRequired(String),
    /// Any other failure (nonzero exit or launch failure).
    Failed(String),
}

pub struct PlasticProvider {
    cm: plugins::Cm,
}

impl PlasticProvider {
    pub fn new(plugins: Arc<Plugins>) -> Self {
        Self {
            cm: plugins::Cm::new(plugins),
        }
    }

    pub fn with_executable(plugins: Arc<Plugins>, executable: impl Into<String>) -> Self {
        Self {
            cm: plugins::Cm::with_executable(plugins, executable),
        }
    }

    fn step(&self, args: Vec<String>, cwd: &Path) -> Step {
        match self.cm.run(args, cwd) {
            Ok(out) if out.success() => Step::Ok(out.stdout),
            Ok(out) => {
                let combined = out.combined();
                if is_auth_failure(&combined) {
                    Step::AuthRequired(combined)
                } else {
                    Step::Failed(out.stderr.trim().to_string())
                }
            }
            Err(err) => Step::Failed(err.to_string()),
        }
    }

    /// Resolve the workspace containing `project_dir`.
    ///
    /// Returns the finished snapshot when there is nothing more to query.
    fn resolve_workspace(&self, project_dir: &Path) -> Result<StatusSnapshot, StatusSnapshot> {
        let args = vec![
            "getworkspacefrompath".to_string(),
            project_dir.to_string_lossy().to_string(),
            format!("--format={{wkname}}{FIELD_SEPARATOR}{{wkpath}}"),
        ];
        let out = match self.cm.run(args, project_dir) {
            Ok(out) => out,
            Err(err) => {
                debug!("plastic probe: {err}");
                return Err(StatusSnapshot::client_missing(
                    ScmProvider::Plastic,
                    CLIENT_MISSING,
                ));
            }
        };

        if !out.success() || out.stdout.trim().is_empty() {
            let combined = out.combined();
            if is_auth_failure(&combined) {
                let mut snapshot = StatusSnapshot::not_a_repo(ScmProvider::Plastic, combined);
                snapshot.auth_required = true;
                return Err(snapshot);
            }
            return Err(StatusSnapshot::not_a_repo(
                ScmProvider::Plastic,
                out.stderr.trim(),
            ));
        }

        let Some((name, root)) = parse_workspace_from_path(&out.stdout) else {
            return Err(StatusSnapshot::not_a_repo(
                ScmProvider::Plastic,
                WORKSPACE_ROOT_MISSING,
            ));
        };

        let mut snapshot = StatusSnapshot::new(ScmProvider::Plastic);
        snapshot.client_available = true;
        snapshot.is_repo = true;
        snapshot.workspace_name = name;
        snapshot.repo_root = root;
        Ok(snapshot)
    }
}

fn mark_auth_required(snapshot: &mut StatusSnapshot, combined: String) {
    debug!("plastic probe: authentication required");
    snapshot.auth_required = true;
    snapshot.last_error = combined;
}

impl Provider for PlasticProvider {
    fn kind(&self) -> ScmProvider {
        ScmProvider::Plastic
    }

    fn probe(&self, project_dir: &Path) -> StatusSnapshot {
        let mut snapshot = match self.resolve_workspace(project_dir) {
            Ok(snapshot) => snapshot,
            Err(done) => return done,
        };
        let root = PathBuf::from(&snapshot.repo_root);

        match self.step(
            vec!["workspaceinfo".to_string(), snapshot.repo_root.clone()],
            &root,
        ) {
            Step::Ok(info) => {
                if let Some(branch) = parse_workspace_info_branch(&info) {
                    snapshot.branch = branch;
                }
            }
            Step::AuthRequired(combined) => {
                mark_auth_required(&mut snapshot, combined);
                return snapshot;
            }
            Step::Failed(_) => {}
        }

        match self.step(
            vec!["status".into(), "--header".into(), "--head".into()],
            &root,
        ) {
            Step::Ok(header_out) => {
                let header = parse_status_header(&header_out);
                if snapshot.branch.is_empty() {
                    if let Some(branch) = header.branch.clone() {
                        snapshot.branch = branch;
                    }
                }
                if header.has_upstream() {
                    let (ahead, behind) = header.ahead_behind();
                    snapshot.has_upstream = true;
                    snapshot.ahead = ahead;
                    snapshot.behind = behind;
                }
            }
            Step::AuthRequired(combined) => {
                mark_auth_required(&mut snapshot, combined);
                return snapshot;
            }
            Step::Failed(_) => {}
        }

        let status_args = vec![
            "status".to_string(),
            "--machinereadable".to_string(),
            "--noheader".to_string(),
            "--controlledchanged".to_string(),
            "--private".to_string(),
            format!("--fieldseparator={FIELD_SEPARATOR}"),
            format!("--startlineseparator={LINE_START}"),
            format!("--endlineseparator={LINE_END}"),
        ];
        match self.step(status_args, &root) {
            Step::Ok(status_out) => {
                let fields = parse_status(&status_out);
                snapshot.untracked = fields.untracked;
                snapshot.unstaged = fields.unstaged();
                snapshot.has_conflicts = fields.has_conflicts;
            }
            Step::AuthRequired(combined) => mark_auth_required(&mut snapshot, combined),
            Step::Failed(stderr) => snapshot.last_error = stderr,
        }

        debug!(
            "plastic probe: workspace={} branch={} behind={}",
            snapshot.workspace_name, snapshot.branch, snapshot.behind
        );
        snapshot
    }

    fn run_command(&self, args: &[String], cwd: &Path) -> Result<CommandOutput, LaunchFailure> {
        self.cm.run(args.iter().map(String::as_str), cwd)
    }
}
