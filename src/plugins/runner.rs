use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, Mutex};

/// Captured result of a process that was launched and ran to completion.
///
/// A nonzero `exit_code` is a normal outcome ("not a repository", auth
/// failures, ...). Only a failure to start the process is an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// stderr and stdout joined by a newline and trimmed.
    pub fn combined(&self) -> String {
        format!("{}\n{}", self.stderr, self.stdout).trim().to_string()
    }
}

pub trait Runner: Send + Sync {
    fn output(&self, program: &Path, args: &[OsString], cwd: &Path)
    -> std::io::Result<CommandOutput>;
}

pub struct OsRunner;

impl Runner for OsRunner {
    fn output(
        &self,
        program: &Path,
        args: &[OsString],
        cwd: &Path,
    ) -> std::io::Result<CommandOutput> {
        let output = Command::new(program).args(args).current_dir(cwd).output()?;
        Ok(CommandOutput {
            // Killed by a signal: no code, report as failure.
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunCall {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub cwd: PathBuf,
}

impl RunCall {
    /// Arguments joined by spaces, lossily converted. Handy for assertions.
    pub fn args_line(&self) -> String {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Test double that records calls and returns canned outputs in FIFO order.
///
/// Intended for unit tests of probers and the command executor.
pub struct MockRunner {
    calls: Arc<Mutex<Vec<RunCall>>>,
    outputs: Arc<Mutex<Vec<std::io::Result<CommandOutput>>>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            outputs: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn push_output(&self, out: std::io::Result<CommandOutput>) {
        self.outputs.lock().unwrap_or_else(|e| e.into_inner()).push(out);
    }

    /// Queue a process that ran and exited with `exit_code`.
    pub fn push_exit(&self, exit_code: i32, stdout: &str, stderr: &str) {
        self.push_output(Ok(CommandOutput {
            exit_code,
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        }));
    }

    /// Queue a launch failure (executable missing).
    pub fn push_not_found(&self) {
        self.push_output(Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "program not found",
        )));
    }

    pub fn calls(&self) -> Vec<RunCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Default for MockRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl Runner for MockRunner {
    fn output(
        &self,
        program: &Path,
        args: &[OsString],
        cwd: &Path,
    ) -> std::io::Result<CommandOutput> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).push(RunCall {
            program: program.to_path_buf(),
            args: args.to_vec(),
            cwd: cwd.to_path_buf(),
        });

        let mut outputs = self.outputs.lock().unwrap_or_else(|e| e.into_inner());
        if outputs.is_empty() {
            return Err(std::io::Error::other("MockRunner has no queued outputs"));
        }
        outputs.remove(0)
    }
}
