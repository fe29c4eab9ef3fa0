//! Call graph generation facade
//!
//! Structured like dependency resolution: files are scanned, each enabled
//! language strategy builds its jobs, and all jobs share one scheduling run
//! bounded by the caller's timeout.

pub mod golang;
pub mod java;

use crate::Result;
use crate::archive::Archiver;
use crate::batch::Ecosystem;
use crate::config::CallgraphConfig;
use crate::constants::callgraph::ARCHIVE_ENTRY;
use crate::job::{JobBase, JobError};
use crate::outcome::Outcome;
use crate::process::Scope;
use crate::services::Services;
use crate::strategy::Strategy;
use crate::utils::FileFinder;
use anyhow::Context;
use golang::GolangStrategy;
use java::JavaStrategy;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub type Generation = Outcome;

/// Zip `output`, replace it with the base64 of the zip and remove the zip
pub(crate) fn package_output(base: &mut JobBase, archiver: &dyn Archiver, output: &Path) {
    let zip = PathBuf::from(format!("{}.zip", output.display()));

    if let Err(e) = archiver.zip_file(output, &zip, ARCHIVE_ENTRY) {
        base.errors_mut()
            .critical(JobError::new(format!("Failed to zip {}: {}", output.display(), e)));
        return;
    }
    if let Err(e) = archiver.b64(&zip, output) {
        base.errors_mut()
            .critical(JobError::new(format!("Failed to encode {}: {}", zip.display(), e)));
        return;
    }
    if let Err(e) = archiver.cleanup(&zip) {
        base.errors_mut()
            .critical(JobError::new(format!("Failed to remove {}: {}", zip.display(), e)));
    }
}

pub struct Generator {
    workers: usize,
    services: Services,
}

impl Generator {
    pub fn new(workers: usize, services: Services) -> Self {
        Self { workers, services }
    }

    /// Generate call graphs for every enabled language found under `paths`
    ///
    /// Inclusion globs keep files an exclusion would drop, so build output
    /// directories can be scanned for classes.
    pub async fn generate(
        &self,
        paths: &[PathBuf],
        exclusions: &[String],
        inclusions: &[String],
        configs: &CallgraphConfig,
        timeout: Duration,
    ) -> Result<Generation> {
        let scope = Scope::with_timeout(timeout);
        let finder = FileFinder::new(exclusions, inclusions)?;
        let files = finder.find_files(paths)?;

        let poms: Vec<PathBuf> = files
            .iter()
            .filter(|f| Ecosystem::classify(f) == Some(Ecosystem::Maven))
            .cloned()
            .collect();
        let go_files: Vec<PathBuf> = files
            .iter()
            .filter(|f| f.extension().is_some_and(|ext| ext == "go"))
            .cloned()
            .collect();
        let scanned = Arc::new(files);

        let mut strategies: Vec<Box<dyn Strategy>> = Vec::new();
        if !poms.is_empty() {
            strategies.push(Box::new(JavaStrategy::new(
                poms,
                Arc::clone(&scanned),
                finder.clone(),
                configs.java.clone(),
                self.services.clone(),
            )));
        }
        if !go_files.is_empty() {
            strategies.push(Box::new(GolangStrategy::new(
                go_files,
                configs.golang.clone(),
                self.services.clone(),
            )));
        }

        let mut jobs = Vec::new();
        for strategy in &strategies {
            let created = strategy
                .invoke(&scope)
                .await
                .with_context(|| format!("Failed to prepare {} call graphs", strategy.name()))?;
            jobs.extend(created);
        }

        if jobs.is_empty() {
            self.services
                .logger
                .info("callgraph", "No projects to generate call graphs for");
            return Ok(Generation::default());
        }

        let jobs = self
            .services
            .scheduler(self.workers)
            .schedule(jobs, &scope)
            .await;
        Ok(Generation::new(jobs))
    }
}
