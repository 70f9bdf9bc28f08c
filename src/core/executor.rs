//! Child process execution.
//!
//! Git is driven as a child process. Arguments are passed as a vector and
//! never through a shell, since repository URLs and revisions come
//! straight from the configuration file.

use crate::core::error::{Error, Result};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time::timeout;

/// Output from a command execution.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Exit code of the command.
    pub exit_code: i32,
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
    /// Whether the command was killed due to timeout.
    pub timed_out: bool,
    /// Duration the command took to run.
    pub duration: Duration,
}

impl CommandOutput {
    /// Returns true if the command succeeded (exit code 0).
    #[must_use]
    pub const fn success(&self) -> bool {
        self.exit_code == 0 && !self.timed_out
    }

    /// Returns the last non-empty line of stderr, which is where git puts
    /// its `fatal:` message.
    #[must_use]
    pub fn error_line(&self) -> String {
        self.stderr
            .lines()
            .rev()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or("no output")
            .to_string()
    }
}

/// Options for command execution.
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Working directory for the command.
    pub cwd: Option<PathBuf>,
    /// Timeout for the command.
    pub timeout: Option<Duration>,
    /// Environment variables to set.
    pub env: Vec<(String, String)>,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            cwd: None,
            timeout: Some(Duration::from_secs(60)),
            env: Vec::new(),
        }
    }
}

impl ExecuteOptions {
    /// Sets the working directory.
    #[must_use]
    pub fn cwd(mut self, path: impl AsRef<Path>) -> Self {
        self.cwd = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the timeout.
    #[must_use]
    pub const fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Sets an environment variable.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

/// Executor for running child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct Executor;

impl Executor {
    /// Creates a new executor.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Runs `program` with `args` and waits for it to finish.
    ///
    /// A timeout is not an error: the child is killed and the output is
    /// returned with `timed_out` set and exit code 124.
    pub async fn run<I, S>(
        &self,
        program: &str,
        args: I,
        options: ExecuteOptions,
    ) -> Result<CommandOutput>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let start = std::time::Instant::now();

        let mut cmd = Command::new(program);
        cmd.args(args);

        if let Some(ref cwd) = options.cwd {
            cmd.current_dir(cwd);
        }

        for (key, value) in &options.env {
            cmd.env(key, value);
        }

        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .map_err(|e| Error::io(format!("spawn {program}"), e))?;

        let result = if let Some(timeout_duration) = options.timeout {
            match timeout(timeout_duration, wait_for_output(&mut child)).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::debug!(program, ?timeout_duration, "killing timed out command");
                    drop(child.kill().await);
                    return Ok(CommandOutput {
                        exit_code: 124,
                        stdout: String::new(),
                        stderr: "Command timed out".to_string(),
                        timed_out: true,
                        duration: start.elapsed(),
                    });
                },
            }
        } else {
            wait_for_output(&mut child).await
        };

        let (exit_code, stdout, stderr) = result?;

        Ok(CommandOutput {
            exit_code,
            stdout,
            stderr,
            timed_out: false,
            duration: start.elapsed(),
        })
    }

    /// Checks if a command exists in PATH.
    #[must_use]
    pub fn command_exists(command: &str) -> bool {
        which::which(command).is_ok()
    }
}

/// Waits for the child to exit, draining both pipes concurrently so a
/// chatty child cannot block on a full pipe.
async fn wait_for_output(child: &mut tokio::process::Child) -> Result<(i32, String, String)> {
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let stdout_handle = tokio::spawn(read_pipe(stdout));
    let stderr_handle = tokio::spawn(read_pipe(stderr));

    let status = child
        .wait()
        .await
        .map_err(|e| Error::io("wait for command", e))?;

    let stdout = stdout_handle.await.map_err(|e| Error::Internal {
        message: format!("stdout task failed: {e}"),
    })?;
    let stderr = stderr_handle.await.map_err(|e| Error::Internal {
        message: format!("stderr task failed: {e}"),
    })?;

    Ok((status.code().unwrap_or(1), stdout, stderr))
}

async fn read_pipe<R>(pipe: Option<R>) -> String
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        if let Err(e) = pipe.read_to_end(&mut buf).await {
            tracing::debug!(error = %e, "failed to read child pipe");
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_captures_stdout() {
        if !Executor::command_exists("git") {
            return;
        }

        let output = Executor::new()
            .run("git", ["--version"], ExecuteOptions::default())
            .await
            .expect("run git");

        assert!(output.success());
        assert!(output.stdout.starts_with("git version"));
    }

    #[tokio::test]
    async fn test_run_failing_command() {
        if !Executor::command_exists("git") {
            return;
        }

        let temp = tempfile::TempDir::new().expect("create temp dir");
        let output = Executor::new()
            .run(
                "git",
                ["rev-parse", "--verify", "does-not-exist"],
                ExecuteOptions::default().cwd(temp.path()),
            )
            .await
            .expect("run git");

        assert!(!output.success());
        assert_ne!(output.exit_code, 0);
        assert!(!output.error_line().is_empty());
    }

    #[tokio::test]
    async fn test_run_timeout() {
        if !Executor::command_exists("sleep") {
            return;
        }

        let output = Executor::new()
            .run(
                "sleep",
                ["10"],
                ExecuteOptions::default().timeout(Duration::from_millis(100)),
            )
            .await
            .expect("should complete");

        assert!(output.timed_out);
        assert_eq!(output.exit_code, 124);
        assert!(!output.success());
    }

    #[tokio::test]
    async fn test_run_missing_program() {
        let result = Executor::new()
            .run(
                "definitely_not_a_real_command_12345",
                Vec::<String>::new(),
                ExecuteOptions::default(),
            )
            .await;

        assert!(matches!(result, Err(Error::Io { .. })));
    }

    #[test]
    fn test_error_line_picks_last_non_empty_line() {
        let output = CommandOutput {
            exit_code: 128,
            stdout: String::new(),
            stderr: "hint: something\nfatal: couldn't find remote ref v9\n\n".to_string(),
            timed_out: false,
            duration: Duration::ZERO,
        };
        assert_eq!(output.error_line(), "fatal: couldn't find remote ref v9");
    }

    #[test]
    fn test_command_exists() {
        assert!(!Executor::command_exists("definitely_not_a_real_command_12345"));
    }
}
