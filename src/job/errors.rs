//! Job error types and the per-job error collector

use crate::process::ProcessError;
use std::fmt;

/// One problem recorded by a job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobError {
    message: String,
    command: Option<String>,
    documentation: Option<String>,
}

impl JobError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            command: None,
            documentation: None,
        }
    }

    /// Attach the command line that failed
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Attach a remediation hint shown under the error
    pub fn with_documentation(mut self, documentation: impl Into<String>) -> Self {
        self.documentation = Some(documentation.into());
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn command(&self) -> Option<&str> {
        self.command.as_deref()
    }

    pub fn documentation(&self) -> Option<&str> {
        self.documentation.as_deref()
    }

    /// Build an error from a failed process, adding a hint for well-known failures
    pub fn from_process(err: &ProcessError) -> Self {
        let error = JobError::new(err.detail()).with_command(err.command());

        match err {
            ProcessError::Spawn { source, command } if source.kind() == std::io::ErrorKind::NotFound => {
                let program = command.split_whitespace().next().unwrap_or(command);
                error.with_documentation(format!(
                    "'{program}' was not found. Make sure it is installed and available in PATH."
                ))
            }
            ProcessError::Timeout { .. } => error.with_documentation(
                "The run deadline passed before this job finished. Increase the timeout to give it more time.",
            ),
            ProcessError::Exit { stderr, .. } if looks_like_network_failure(stderr) => error
                .with_documentation(
                    "The tool could not download dependencies. Check network access and repository credentials.",
                ),
            _ => error,
        }
    }
}

fn looks_like_network_failure(stderr: &str) -> bool {
    const MARKERS: &[&str] = &[
        "Could not resolve",
        "Could not transfer artifact",
        "dial tcp",
        "Connection refused",
        "Temporary failure in name resolution",
    ];
    MARKERS.iter().any(|m| stderr.contains(m))
}

impl fmt::Display for JobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for JobError {}

/// Warnings and critical errors of a single job, in the order they were recorded
#[derive(Debug, Clone, Default)]
pub struct ErrorCollector {
    warnings: Vec<JobError>,
    criticals: Vec<JobError>,
}

impl ErrorCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warning(&mut self, error: JobError) {
        self.warnings.push(error);
    }

    pub fn critical(&mut self, error: JobError) {
        self.criticals.push(error);
    }

    /// Warnings first, then criticals
    pub fn get_all(&self) -> Vec<&JobError> {
        self.warnings.iter().chain(self.criticals.iter()).collect()
    }

    pub fn get_warning_errors(&self) -> &[JobError] {
        &self.warnings
    }

    pub fn get_critical_errors(&self) -> &[JobError] {
        &self.criticals
    }

    pub fn has_error(&self) -> bool {
        !self.warnings.is_empty() || !self.criticals.is_empty()
    }

    pub fn has_critical(&self) -> bool {
        !self.criticals.is_empty()
    }
}
