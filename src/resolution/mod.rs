//! Dependency resolution facade
//!
//! [`Resolver::resolve`] scans the given paths, groups the manifests by
//! ecosystem, lets each ecosystem's strategy build its jobs and runs them all
//! through one [`Scheduler`](crate::scheduler::Scheduler) call.

pub mod factory;
pub mod gomod;
pub mod gradle;
pub mod maven;
pub mod pip;

pub use factory::StrategyFactory;

use crate::Result;
use crate::batch::{Batch, make_batches};
use crate::config::Config;
use crate::outcome::Outcome;
use crate::process::Scope;
use crate::services::Services;
use crate::utils::FileFinder;
use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;

pub type Resolution = Outcome;

pub struct Resolver {
    config: Config,
    services: Services,
}

impl Resolver {
    pub fn new(config: Config, services: Services) -> Self {
        Self { config, services }
    }

    /// Resolve every manifest under `paths` that no exclusion glob matches
    pub async fn resolve(&self, paths: &[PathBuf], exclusions: &[String]) -> Result<Resolution> {
        self.resolve_in(paths, exclusions, &Scope::with_timeout(self.config.timeout()))
            .await
    }

    /// Same as [`Resolver::resolve`] under a caller-owned scope
    pub async fn resolve_in(
        &self,
        paths: &[PathBuf],
        exclusions: &[String],
        scope: &Scope,
    ) -> Result<Resolution> {
        let logger = &self.services.logger;

        let finder = FileFinder::new(exclusions, &self.config.inclusions)?;
        let files = finder.find_files(paths)?;
        let batches = make_batches(&files);
        let scanned = Arc::new(files);

        let factory = StrategyFactory::new(self.config.resolution.clone(), self.services.clone());
        let mut jobs = Vec::new();

        for batch in batches {
            let batch = self.skip_resolved(batch);
            if batch.is_empty() {
                continue;
            }

            let strategy = factory.make(&batch, &scanned);
            let created = strategy
                .invoke(scope)
                .await
                .with_context(|| format!("Failed to prepare {} resolution", batch.ecosystem()))?;
            jobs.extend(created);
        }

        if jobs.is_empty() {
            logger.info("resolve", "No manifest files to resolve");
            return Ok(Resolution::default());
        }

        logger.info("resolve", &format!("Running {} job(s)", jobs.len()));
        let jobs = self
            .services
            .scheduler(self.config.workers)
            .schedule(jobs, scope)
            .await;

        Ok(Resolution::new(jobs))
    }

    /// Drop manifests whose lock file already exists, unless regenerating
    fn skip_resolved(&self, batch: Batch) -> Batch {
        if self.config.regenerate {
            return batch;
        }

        let ecosystem = batch.ecosystem();
        let mut remaining = Batch::new(ecosystem);
        for file in batch.files() {
            if ecosystem.lock_file(&file).exists() {
                self.services.logger.info(
                    ecosystem.name(),
                    &format!("Skipping {}, lock file already exists", file.display()),
                );
            } else {
                remaining.add(file);
            }
        }
        remaining
    }
}
