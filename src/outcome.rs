//! Aggregate result of one scheduling run

use crate::job::Job;

/// Every job the scheduler started, in submission order, with its errors
#[derive(Default)]
pub struct Outcome {
    jobs: Vec<Box<dyn Job>>,
}

impl Outcome {
    pub fn new(jobs: Vec<Box<dyn Job>>) -> Self {
        Self { jobs }
    }

    pub fn jobs(&self) -> &[Box<dyn Job>] {
        &self.jobs
    }

    pub fn into_jobs(self) -> Vec<Box<dyn Job>> {
        self.jobs
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Whether any job failed
    pub fn has_critical(&self) -> bool {
        self.jobs.iter().any(|job| job.errors().has_critical())
    }

    pub fn failed_jobs(&self) -> impl Iterator<Item = &Box<dyn Job>> {
        self.jobs.iter().filter(|job| job.errors().has_critical())
    }
}

impl std::fmt::Debug for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.jobs.iter().map(|job| job.label()))
            .finish()
    }
}
