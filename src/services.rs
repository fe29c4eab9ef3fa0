//! Collaborators shared by strategies and jobs
//!
//! A [`Services`] value is built once in `main` and handed to the facades.
//! Tests build their own with a scripted [`CommandExecutor`].

use crate::archive::{Archiver, ZipArchiver};
use crate::logger::Logger;
use crate::process::{CommandExecutor, SystemExecutor};
use crate::scheduler::{Scheduler, StatusSink};
use reqwest::Client;
use std::sync::Arc;

#[derive(Clone)]
pub struct Services {
    pub executor: Arc<dyn CommandExecutor>,
    pub archiver: Arc<dyn Archiver>,
    pub http: Client,
    pub logger: Logger,
    pub sink: Arc<dyn StatusSink>,
}

impl Services {
    /// Real processes, zip archives and console output
    pub fn system() -> Self {
        Self::with_executor(Arc::new(SystemExecutor::new()))
    }

    pub fn with_executor(executor: Arc<dyn CommandExecutor>) -> Self {
        Self {
            executor,
            archiver: Arc::new(ZipArchiver),
            http: Client::new(),
            logger: Logger,
            sink: Arc::new(Logger),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn StatusSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_archiver(mut self, archiver: Arc<dyn Archiver>) -> Self {
        self.archiver = archiver;
        self
    }

    pub fn scheduler(&self, workers: usize) -> Scheduler {
        Scheduler::with_sink(workers, Arc::clone(&self.sink))
    }
}

impl Default for Services {
    fn default() -> Self {
        Self::system()
    }
}
