//! Schedulable units of work
//!
//! A job is bound to one directory and a set of files, runs one or more
//! external processes, and records its outcome in an [`ErrorCollector`].
//! There is no separate success state: once [`Job::run`] returns, a job with
//! no critical errors succeeded.
//!
//! Concrete jobs own a [`JobBase`] holding the shared fields and expose it
//! through [`Job::base`] / [`Job::base_mut`].

pub mod errors;
pub mod status;

pub use errors::{ErrorCollector, JobError};
pub use status::{StatusEvent, StatusSender, status_channel};

use crate::process::{CommandExecutor, ProcessCommand, ProcessOutput, Scope};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Fields every job carries
#[derive(Debug)]
pub struct JobBase {
    id: Uuid,
    label: String,
    dir: PathBuf,
    files: Vec<PathBuf>,
    errors: ErrorCollector,
    status: Option<StatusSender>,
}

impl JobBase {
    pub fn new(label: impl Into<String>, dir: impl Into<PathBuf>, files: Vec<PathBuf>) -> Self {
        Self {
            id: Uuid::new_v4(),
            label: label.into(),
            dir: dir.into(),
            files,
            errors: ErrorCollector::new(),
            status: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn errors(&self) -> &ErrorCollector {
        &self.errors
    }

    pub fn errors_mut(&mut self) -> &mut ErrorCollector {
        &mut self.errors
    }

    /// Connect the job to the status stream of the run it is scheduled in
    pub fn attach_status(&mut self, sender: StatusSender) {
        self.status = Some(sender);
    }

    /// Drop the status handle so the relay can finish
    pub fn detach_status(&mut self) {
        self.status = None;
    }

    pub fn send_status(&self, message: impl Into<String>) {
        if let Some(status) = &self.status {
            status.send(message);
        }
    }

    /// Run `cmd`, recording a critical error if it fails
    pub async fn run_process(
        &mut self,
        executor: &dyn CommandExecutor,
        cmd: &ProcessCommand,
        scope: &Scope,
    ) -> Option<ProcessOutput> {
        match executor.execute(cmd, Some(scope)).await {
            Ok(output) => Some(output),
            Err(err) => {
                self.errors.critical(JobError::from_process(&err));
                None
            }
        }
    }
}

/// A unit of work run by the scheduler
#[async_trait]
pub trait Job: Send {
    fn base(&self) -> &JobBase;

    fn base_mut(&mut self) -> &mut JobBase;

    /// Execute the job; the outcome is read from [`Job::errors`] afterwards
    async fn run(&mut self, scope: &Scope);

    fn id(&self) -> Uuid {
        self.base().id()
    }

    fn label(&self) -> &str {
        self.base().label()
    }

    fn dir(&self) -> &Path {
        self.base().dir()
    }

    fn files(&self) -> &[PathBuf] {
        self.base().files()
    }

    fn errors(&self) -> &ErrorCollector {
        self.base().errors()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{ProcessError, SystemExecutor};
    use std::time::Duration;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_run_process_records_critical_on_failure() {
        let temp_dir = TempDir::new().unwrap();
        let mut base = JobBase::new("test", temp_dir.path(), Vec::new());
        let cmd = ProcessCommand::new("sh", temp_dir.path()).args(["-c", "echo nope >&2; exit 1"]);

        let output = base.run_process(&SystemExecutor, &cmd, &Scope::new()).await;
        assert!(output.is_none());
        assert_eq!(base.errors().get_critical_errors().len(), 1);
        assert_eq!(base.errors().get_critical_errors()[0].message(), "nope");
    }

    #[tokio::test]
    async fn test_run_process_timeout_message() {
        let temp_dir = TempDir::new().unwrap();
        let mut base = JobBase::new("test", temp_dir.path(), Vec::new());
        let cmd = ProcessCommand::new("sh", temp_dir.path()).args(["-c", "true"]);
        let scope = Scope::with_timeout(Duration::ZERO);

        base.run_process(&SystemExecutor, &cmd, &scope).await;
        let criticals = base.errors().get_critical_errors();
        assert_eq!(criticals.len(), 1);
        assert_eq!(
            criticals[0].message(),
            ProcessError::Timeout {
                command: String::new()
            }
            .to_string()
        );
    }

    #[tokio::test]
    async fn test_send_status_without_stream_is_noop() {
        let base = JobBase::new("test", "/tmp", Vec::new());
        base.send_status("nobody listens");
    }
}
