//! External process execution

use super::Scope;
use crate::constants::job::{INTERRUPT_GRACE_SECS, TIMEOUT_MESSAGE};
use crate::logger::Logger;
use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Child;

/// A program invocation bound to a working directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessCommand {
    pub program: String,
    pub args: Vec<String>,
    pub dir: PathBuf,
    pub env: Vec<(String, String)>,
}

impl ProcessCommand {
    pub fn new(program: impl Into<String>, dir: impl AsRef<Path>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            dir: dir.as_ref().to_path_buf(),
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

impl fmt::Display for ProcessCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Captured result of a process that exited successfully
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to start '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{command}' exited with code {code} ({}): {stderr}", describe_exit(.code))]
    Exit {
        command: String,
        code: i32,
        stdout: String,
        stderr: String,
    },

    #[error("{}", TIMEOUT_MESSAGE)]
    Timeout { command: String },
}

impl ProcessError {
    pub fn command(&self) -> &str {
        match self {
            ProcessError::Spawn { command, .. }
            | ProcessError::Exit { command, .. }
            | ProcessError::Timeout { command } => command,
        }
    }

    /// Most useful text to show a user: stderr when the tool wrote any
    pub fn detail(&self) -> String {
        match self {
            ProcessError::Exit { stderr, stdout, .. } if stderr.trim().is_empty() => {
                stdout.trim().to_string()
            }
            ProcessError::Exit { stderr, .. } => stderr.trim().to_string(),
            other => other.to_string(),
        }
    }
}

/// Runs external programs on behalf of jobs
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run `cmd` to completion, honoring `scope` if one is given
    async fn execute(
        &self,
        cmd: &ProcessCommand,
        scope: Option<&Scope>,
    ) -> Result<ProcessOutput, ProcessError>;
}

/// [`CommandExecutor`] backed by real operating-system processes
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

impl SystemExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandExecutor for SystemExecutor {
    async fn execute(
        &self,
        cmd: &ProcessCommand,
        scope: Option<&Scope>,
    ) -> Result<ProcessOutput, ProcessError> {
        let command_line = cmd.to_string();

        if scope.is_some_and(Scope::is_done) {
            return Err(ProcessError::Timeout {
                command: command_line,
            });
        }

        let mut child = tokio::process::Command::new(&cmd.program)
            .args(&cmd.args)
            .current_dir(&cmd.dir)
            .envs(cmd.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                command: command_line.clone(),
                source,
            })?;

        let stdout_handle = tokio::spawn(read_stream(child.stdout.take()));
        let stderr_handle = tokio::spawn(read_stream(child.stderr.take()));

        let waited = match scope {
            Some(scope) => tokio::select! {
                status = child.wait() => Some(status),
                _ = scope.done() => None,
            },
            None => Some(child.wait().await),
        };

        let status = match waited {
            Some(status) => status.map_err(|source| ProcessError::Spawn {
                command: command_line.clone(),
                source,
            })?,
            None => {
                interrupt(&mut child).await;
                return Err(ProcessError::Timeout {
                    command: command_line,
                });
            }
        };

        let (stdout, stderr) = tokio::join!(stdout_handle, stderr_handle);
        let stdout = stdout.unwrap_or_default();
        let stderr = stderr.unwrap_or_default();

        if !status.success() {
            return Err(ProcessError::Exit {
                command: command_line,
                code: status.code().unwrap_or(-1),
                stdout,
                stderr,
            });
        }

        Ok(ProcessOutput { stdout, stderr })
    }
}

/// Short reading of an exit code as reported by build tools and shells
fn describe_exit(code: &i32) -> &'static str {
    match *code {
        1 => "build failure",
        2 => "usage error",
        126 => "not executable",
        127 => "command not found",
        130 => "interrupted",
        137 => "killed",
        143 => "terminated",
        129..=255 => "terminated by signal",
        -1 => "no exit code",
        _ => "error",
    }
}

async fn read_stream<R: AsyncRead + Unpin>(stream: Option<R>) -> String {
    let mut content = Vec::new();
    if let Some(mut stream) = stream {
        let _ = stream.read_to_end(&mut content).await;
    }
    String::from_utf8_lossy(&content).into_owned()
}

/// Ask the child to stop, then kill it if it ignores the request
async fn interrupt(child: &mut Child) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        use nix::sys::signal::{Signal, kill};
        use nix::unistd::Pid;

        if let Err(err) = kill(Pid::from_raw(pid as i32), Signal::SIGINT) {
            Logger.warn("process", &format!("Failed to interrupt process {pid}: {err}"));
        }
    }

    let grace = Duration::from_secs(INTERRUPT_GRACE_SECS);
    if tokio::time::timeout(grace, child.wait()).await.is_err() {
        if let Err(err) = child.start_kill() {
            Logger.warn("process", &format!("Failed to kill process: {err}"));
        }
        let _ = child.wait().await;
    }
}
