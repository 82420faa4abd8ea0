use log::debug;
use std::path::Path;
use std::sync::Arc;

use super::Provider;
use crate::errors::LaunchFailure;
use crate::parsers::parse_porcelain_v2;
use crate::plugins::{self, CommandOutput, NamedTool, Plugins};
use crate::status::{ScmProvider, StatusSnapshot};

pub const CLIENT_MISSING: &str = "Git executable not found.";

pub struct GitProvider {
    git: plugins::Git,
}

impl GitProvider {
    pub fn new(plugins: Arc<Plugins>) -> Self {
        Self {
            git: plugins::Git::new(plugins),
        }
    }

    pub fn with_executable(plugins: Arc<Plugins>, executable: impl Into<String>) -> Self {
        Self {
            git: plugins::Git::with_executable(plugins, executable),
        }
    }
}

impl Provider for GitProvider {
    fn kind(&self) -> ScmProvider {
        ScmProvider::Git
    }

    fn probe(&self, project_dir: &Path) -> StatusSnapshot {
        let toplevel = match self.git.run(["rev-parse", "--show-toplevel"], project_dir) {
            Ok(out) => out,
            Err(err) => {
                debug!("git probe: {err}");
                return StatusSnapshot::client_missing(ScmProvider::Git, CLIENT_MISSING);
            }
        };

        if !toplevel.success() {
            return StatusSnapshot::not_a_repo(ScmProvider::Git, toplevel.stderr.trim());
        }

        let mut snapshot = StatusSnapshot::new(ScmProvider::Git);
        snapshot.client_available = true;
        snapshot.is_repo = true;
        snapshot.repo_root = toplevel.stdout.trim().to_string();

        let root = Path::new(&snapshot.repo_root).to_path_buf();
        match self.git.run(["status", "--porcelain=v2", "-b"], &root) {
            Ok(out) if out.success() => parse_porcelain_v2(&out.stdout).apply_to(&mut snapshot),
            Ok(out) => snapshot.last_error = out.stderr.trim().to_string(),
            Err(err) => snapshot.last_error = err.to_string(),
        }

        debug!(
            "git probe: root={} branch={} +{} -{}",
            snapshot.repo_root, snapshot.branch, snapshot.ahead, snapshot.behind
        );
        snapshot
    }

    fn run_command(&self, args: &[String], cwd: &Path) -> Result<CommandOutput, LaunchFailure> {
        self.git.run(args.iter().map(String::as_str), cwd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::{LiteralResolver, MockRunner};

    fn provider() -> (Arc<MockRunner>, GitProvider) {
        let runner = Arc::new(MockRunner::new());
        let plugins = Arc::new(Plugins::new(runner.clone(), Arc::new(LiteralResolver)));
        (runner, GitProvider::new(plugins))
    }

    #[test]
    fn missing_client_yields_empty_snapshot() {
        let (runner, git) = provider();
        runner.push_not_found();

        let snap = git.probe(Path::new("/proj"));
        assert!(!snap.client_available);
        assert!(!snap.is_repo);
        assert_eq!(snap.last_error, CLIENT_MISSING);
        assert!(snap.repo_root.is_empty());
    }

    #[test]
    fn nonzero_rev_parse_is_not_a_repo() {
        let (runner, git) = provider();
        runner.push_exit(
            128,
            "",
            "fatal: not a git repository (or any of the parent directories): .git\n",
        );

        let snap = git.probe(Path::new("/tmp/elsewhere"));
        assert!(snap.client_available);
        assert!(!snap.is_repo);
        assert_eq!(
            snap.last_error,
            "fatal: not a git repository (or any of the parent directories): .git"
        );
        assert_eq!(runner.calls().len(), 1);
    }

    #[test]
    fn repo_status_is_parsed_from_repo_root() {
        let (runner, git) = provider();
        runner.push_exit(0, "/work/game\n", "");
        runner.push_exit(
            0,
            "# branch.head main\n# branch.upstream origin/main\n# branch.ab +2 -0\n? notes.txt\n",
            "",
        );

        let snap = git.probe(Path::new("/work/game/Content"));
        assert!(snap.is_repo);
        assert_eq!(snap.repo_root, "/work/game");
        assert_eq!(snap.branch, "main");
        assert_eq!(snap.ahead, 2);
        assert_eq!(snap.untracked, 1);

        let calls = runner.calls();
        assert_eq!(calls[0].args_line(), "rev-parse --show-toplevel");
        assert_eq!(calls[0].cwd, Path::new("/work/game/Content"));
        assert_eq!(calls[1].args_line(), "status --porcelain=v2 -b");
        assert_eq!(calls[1].cwd, Path::new("/work/game"));
    }

    #[test]
    fn failed_status_keeps_repo_and_records_stderr() {
        let (runner, git) = provider();
        runner.push_exit(0, "/work/game\n", "");
        runner.push_exit(128, "", "fatal: index file corrupt\n");

        let snap = git.probe(Path::new("/work/game"));
        assert!(snap.is_repo);
        assert_eq!(snap.last_error, "fatal: index file corrupt");
    }

    #[test]
    fn run_command_forwards_args() {
        let (runner, git) = provider();
        runner.push_exit(0, "", "");

        let out = git
            .run_command(&["fetch".into(), "--prune".into()], Path::new("/work"))
            .unwrap();
        assert!(out.success());
        assert_eq!(runner.calls()[0].args_line(), "fetch --prune");
    }
}
