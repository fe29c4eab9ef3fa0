use super::gomod::GomodStrategy;
use super::gradle::GradleStrategy;
use super::maven::MavenStrategy;
use super::pip::PipStrategy;
use crate::batch::{Batch, Ecosystem};
use crate::config::ResolutionConfig;
use crate::services::Services;
use crate::strategy::Strategy;
use std::path::PathBuf;
use std::sync::Arc;

/// Picks the resolution strategy for a batch
pub struct StrategyFactory {
    config: ResolutionConfig,
    services: Services,
}

impl StrategyFactory {
    pub fn new(config: ResolutionConfig, services: Services) -> Self {
        Self { config, services }
    }

    /// `scanned` holds every file found by the scan, for strategies that
    /// look beyond the manifests themselves
    pub fn make(&self, batch: &Batch, scanned: &Arc<Vec<PathBuf>>) -> Box<dyn Strategy> {
        let files = batch.files();
        let services = self.services.clone();

        match batch.ecosystem() {
            Ecosystem::Maven => Box::new(MavenStrategy::new(files, self.config.maven.clone(), services)),
            Ecosystem::Gradle => Box::new(GradleStrategy::new(
                files,
                Arc::clone(scanned),
                self.config.gradle.clone(),
                services,
            )),
            Ecosystem::Gomod => Box::new(GomodStrategy::new(files, self.config.gomod.clone(), services)),
            Ecosystem::Pip => Box::new(PipStrategy::new(files, self.config.pip.clone(), services)),
        }
    }
}
