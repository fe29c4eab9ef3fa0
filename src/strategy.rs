//! Per-ecosystem conversion of manifests into jobs

use crate::Result;
use crate::job::Job;
use crate::process::Scope;
use async_trait::async_trait;

/// Turns one batch of manifests into schedulable jobs
///
/// A strategy built without configuration logs a warning and returns no
/// jobs. Discovery failures are returned as errors; failures limited to some
/// roots are recorded as warnings on the jobs that remain.
#[async_trait]
pub trait Strategy: Send + Sync {
    /// Short name used as log label
    fn name(&self) -> &'static str;

    /// Build the jobs; `scope` bounds any processes run during discovery
    async fn invoke(&self, scope: &Scope) -> Result<Vec<Box<dyn Job>>>;
}

/// Outcome of a step applied to several roots where only total failure is fatal
#[derive(Debug)]
pub struct RootOutcome<T> {
    pub succeeded: Vec<T>,
    pub failed: Vec<(T, String)>,
}

impl<T> RootOutcome<T> {
    pub fn new() -> Self {
        Self {
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }

    /// True when there were roots and none of them succeeded
    pub fn all_failed(&self) -> bool {
        self.succeeded.is_empty() && !self.failed.is_empty()
    }
}

impl<T> Default for RootOutcome<T> {
    fn default() -> Self {
        Self::new()
    }
}
