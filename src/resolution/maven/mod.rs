//! Maven dependency resolution
//!
//! Only root POMs get a job: `dependency:tree` on a root also writes the lock
//! file of every module it aggregates.

pub mod pom;

pub use pom::{PomError, find_maven_roots, map_roots_to_class_dirs};

use crate::Result;
use crate::config::MavenConfig;
use crate::constants::lock;
use crate::job::{Job, JobBase};
use crate::process::{CommandExecutor, ProcessCommand, Scope};
use crate::services::Services;
use crate::strategy::Strategy;
use anyhow::Context;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct MavenJob {
    base: JobBase,
    executable: String,
    executor: Arc<dyn CommandExecutor>,
}

impl MavenJob {
    pub fn new(pom: PathBuf, executable: &str, executor: Arc<dyn CommandExecutor>) -> Self {
        let dir = pom.parent().map(Path::to_path_buf).unwrap_or_default();
        Self {
            base: JobBase::new(format!("maven {}", dir.display()), dir, vec![pom]),
            executable: executable.to_string(),
            executor,
        }
    }

    fn command(&self) -> ProcessCommand {
        ProcessCommand::new(&self.executable, self.base.dir()).args([
            "dependency:tree".to_string(),
            format!("-DoutputFile={}", lock::MAVEN),
            "-DoutputType=tgf".to_string(),
            "--fail-at-end".to_string(),
        ])
    }
}

#[async_trait]
impl Job for MavenJob {
    fn base(&self) -> &JobBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut JobBase {
        &mut self.base
    }

    async fn run(&mut self, scope: &Scope) {
        self.base.send_status("Resolving dependency tree");
        let cmd = self.command();
        self.base
            .run_process(self.executor.as_ref(), &cmd, scope)
            .await;
    }
}

pub struct MavenStrategy {
    files: Vec<PathBuf>,
    config: Option<MavenConfig>,
    services: Services,
}

impl MavenStrategy {
    pub fn new(files: Vec<PathBuf>, config: Option<MavenConfig>, services: Services) -> Self {
        Self {
            files,
            config,
            services,
        }
    }
}

#[async_trait]
impl Strategy for MavenStrategy {
    fn name(&self) -> &'static str {
        "maven"
    }

    async fn invoke(&self, _scope: &Scope) -> Result<Vec<Box<dyn Job>>> {
        let Some(config) = &self.config else {
            self.services
                .logger
                .warn(self.name(), "No configuration, skipping Maven manifests");
            return Ok(Vec::new());
        };

        let roots = find_maven_roots(&self.files).context("Failed to find Maven root projects")?;
        self.services.logger.info(
            self.name(),
            &format!("Found {} root(s) among {} pom.xml file(s)", roots.len(), self.files.len()),
        );

        Ok(roots
            .into_iter()
            .map(|root| {
                Box::new(MavenJob::new(
                    root,
                    &config.executable,
                    Arc::clone(&self.services.executor),
                )) as Box<dyn Job>
            })
            .collect())
    }
}
