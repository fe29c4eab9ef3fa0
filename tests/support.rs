//! Common test support utilities and fixtures
//!
//! [`FakeExecutor`] stands in for real build tools: it records every command
//! it is asked to run and answers with scripted results.

#![allow(dead_code)]

use async_trait::async_trait;
use resolvr::process::{CommandExecutor, ProcessCommand, ProcessError, ProcessOutput, Scope};
use resolvr::job::StatusEvent;
use resolvr::scheduler::StatusSink;
use resolvr::{Config, Services};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

type Handler = Box<dyn Fn(&ProcessCommand) -> Result<ProcessOutput, ProcessError> + Send + Sync>;

/// Scripted [`CommandExecutor`]
///
/// Rules are checked in the order they were added; the first whose needle
/// occurs in the command line answers. Unmatched commands succeed with no
/// output.
#[derive(Default)]
pub struct FakeExecutor {
    rules: Vec<(String, Handler)>,
    calls: Mutex<Vec<ProcessCommand>>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<F>(mut self, needle: &str, handler: F) -> Self
    where
        F: Fn(&ProcessCommand) -> Result<ProcessOutput, ProcessError> + Send + Sync + 'static,
    {
        self.rules.push((needle.to_string(), Box::new(handler)));
        self
    }

    /// Answer matching commands with `stdout`
    pub fn stdout(self, needle: &str, stdout: &str) -> Self {
        let stdout = stdout.to_string();
        self.on(needle, move |_| {
            Ok(ProcessOutput {
                stdout: stdout.clone(),
                stderr: String::new(),
            })
        })
    }

    /// Fail matching commands with exit code 1 and `stderr`
    pub fn fail(self, needle: &str, stderr: &str) -> Self {
        let stderr = stderr.to_string();
        self.on(needle, move |cmd| Err(exit_error(cmd, &stderr)))
    }

    pub fn calls(&self) -> Vec<ProcessCommand> {
        self.calls.lock().unwrap().clone()
    }

    /// Command lines of the recorded calls
    pub fn command_lines(&self) -> Vec<String> {
        self.calls().iter().map(ToString::to_string).collect()
    }

    pub fn calls_matching(&self, needle: &str) -> Vec<ProcessCommand> {
        self.calls()
            .into_iter()
            .filter(|cmd| cmd.to_string().contains(needle))
            .collect()
    }
}

pub fn exit_error(cmd: &ProcessCommand, stderr: &str) -> ProcessError {
    ProcessError::Exit {
        command: cmd.to_string(),
        code: 1,
        stdout: String::new(),
        stderr: stderr.to_string(),
    }
}

#[async_trait]
impl CommandExecutor for FakeExecutor {
    async fn execute(
        &self,
        cmd: &ProcessCommand,
        scope: Option<&Scope>,
    ) -> Result<ProcessOutput, ProcessError> {
        if scope.is_some_and(Scope::is_done) {
            return Err(ProcessError::Timeout {
                command: cmd.to_string(),
            });
        }

        self.calls.lock().unwrap().push(cmd.clone());
        let line = cmd.to_string();
        match self.rules.iter().find(|(needle, _)| line.contains(needle.as_str())) {
            Some((_, handler)) => handler(cmd),
            None => Ok(ProcessOutput::default()),
        }
    }
}

/// Status sink collecting every relayed event
#[derive(Default)]
pub struct RecordingSink {
    pub events: Mutex<Vec<StatusEvent>>,
}

impl StatusSink for RecordingSink {
    fn publish(&self, event: &StatusEvent, _done: usize, _total: usize) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Services wired to `executor` and a silent status sink
pub fn services(executor: &Arc<FakeExecutor>) -> Services {
    let executor: Arc<dyn CommandExecutor> = executor.clone();
    Services::with_executor(executor).with_sink(Arc::new(RecordingSink::default()))
}

/// Configuration for tests: no default exclusions, short timeout
pub fn test_config() -> Config {
    Config {
        exclusions: Vec::new(),
        timeout_secs: 30,
        ..Config::default()
    }
}

/// A temporary source tree, addressed through its canonical path
pub struct Workspace {
    pub root: TempDir,
    base: PathBuf,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

impl Workspace {
    pub fn new() -> Self {
        let root = TempDir::new().expect("Failed to create temp directory");
        let base = fs::canonicalize(root.path()).expect("Failed to resolve temp directory");
        Self { root, base }
    }

    pub fn path(&self) -> &Path {
        &self.base
    }

    /// Absolute path of `rel` inside the workspace
    pub fn join(&self, rel: &str) -> PathBuf {
        self.path().join(rel)
    }

    /// Write `content` to `rel`, creating parent directories
    pub fn write(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.join(rel);
        fs::create_dir_all(path.parent().unwrap()).expect("Failed to create directories");
        fs::write(&path, content).expect("Failed to write file");
        path
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.join(rel)).expect("Failed to read file")
    }

    pub fn roots(&self) -> Vec<PathBuf> {
        vec![self.path().to_path_buf()]
    }
}

/// Minimal POM aggregating `modules`
pub fn pom(modules: &[&str]) -> String {
    let entries: String = modules
        .iter()
        .map(|m| format!("    <module>{m}</module>\n"))
        .collect();
    format!(
        "<project>\n  <modelVersion>4.0.0</modelVersion>\n  <modules>\n{entries}  </modules>\n</project>\n"
    )
}
