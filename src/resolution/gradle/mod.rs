//! Gradle dependency resolution
//!
//! One job per root project found through the settings files, plus one job
//! per build file whose directory no root project covers.

pub mod setup;

pub use setup::{GradleProject, GradleSetup};

use crate::Result;
use crate::config::GradleConfig;
use crate::constants::gradle::{DEPENDENCIES_TASK, INIT_SCRIPT_FILE};
use crate::job::{Job, JobBase};
use crate::process::{CommandExecutor, ProcessCommand, Scope};
use crate::services::Services;
use crate::strategy::Strategy;
use anyhow::Context;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

const INIT_SCRIPT: &str = include_str!("resolvr-init.gradle");

/// The init script written to a temporary directory, removed on drop
#[derive(Debug)]
pub struct InitScript {
    _dir: TempDir,
    path: PathBuf,
}

impl InitScript {
    pub fn create() -> std::io::Result<Self> {
        let dir = tempfile::Builder::new().prefix("resolvr-gradle").tempdir()?;
        let path = dir.path().join(INIT_SCRIPT_FILE);
        std::fs::write(&path, INIT_SCRIPT)?;
        Ok(Self { _dir: dir, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub struct GradleJob {
    base: JobBase,
    gradlew: String,
    init_script: Arc<InitScript>,
    executor: Arc<dyn CommandExecutor>,
}

impl GradleJob {
    pub fn new(
        dir: PathBuf,
        files: Vec<PathBuf>,
        gradlew: String,
        init_script: Arc<InitScript>,
        executor: Arc<dyn CommandExecutor>,
    ) -> Self {
        Self {
            base: JobBase::new(format!("gradle {}", dir.display()), dir, files),
            gradlew,
            init_script,
            executor,
        }
    }

    fn command(&self) -> ProcessCommand {
        ProcessCommand::new(&self.gradlew, self.base.dir())
            .args(["--init-script", &self.init_script.path().display().to_string()])
            .args(["-q", DEPENDENCIES_TASK])
    }
}

#[async_trait]
impl Job for GradleJob {
    fn base(&self) -> &JobBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut JobBase {
        &mut self.base
    }

    async fn run(&mut self, scope: &Scope) {
        self.base
            .send_status(format!("Resolving dependencies with {}", self.gradlew));
        let cmd = self.command();
        self.base
            .run_process(self.executor.as_ref(), &cmd, scope)
            .await;
    }
}

pub struct GradleStrategy {
    files: Vec<PathBuf>,
    scanned: Arc<Vec<PathBuf>>,
    config: Option<GradleConfig>,
    services: Services,
}

impl GradleStrategy {
    /// `files` are the build files to resolve, `scanned` every file of the
    /// scan, searched for settings files and wrappers
    pub fn new(
        files: Vec<PathBuf>,
        scanned: Arc<Vec<PathBuf>>,
        config: Option<GradleConfig>,
        services: Services,
    ) -> Self {
        Self {
            files,
            scanned,
            config,
            services,
        }
    }
}

#[async_trait]
impl Strategy for GradleStrategy {
    fn name(&self) -> &'static str {
        "gradle"
    }

    async fn invoke(&self, scope: &Scope) -> Result<Vec<Box<dyn Job>>> {
        let Some(config) = &self.config else {
            self.services
                .logger
                .warn(self.name(), "No configuration, skipping Gradle build files");
            return Ok(Vec::new());
        };
        let logger = &self.services.logger;

        let init_script =
            Arc::new(InitScript::create().context("Failed to write the Gradle init script")?);
        let setup = GradleSetup::new(&self.scanned, &config.executable);
        let outcome = setup
            .discover(self.services.executor.as_ref(), &init_script, scope)
            .await;

        if outcome.all_failed() {
            let reasons: Vec<&str> = outcome.failed.iter().map(|(_, m)| m.as_str()).collect();
            anyhow::bail!(
                "Subproject discovery failed for every Gradle root project:\n  {}",
                reasons.join("\n  ")
            );
        }
        for (project, message) in &outcome.failed {
            logger.warn(self.name(), &format!("{}: {}", project.dir.display(), message));
        }

        let projects: Vec<GradleProject> = outcome
            .succeeded
            .into_iter()
            .chain(outcome.failed.into_iter().map(|(project, _)| project))
            .collect();

        let mut covered: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();
        let mut uncovered: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();
        for file in &self.files {
            let dir = file.parent().map(Path::to_path_buf).unwrap_or_default();
            match projects.iter().find(|project| project.covers(&dir)) {
                Some(project) => covered.entry(project.dir.clone()).or_default().push(file.clone()),
                None => uncovered.entry(dir).or_default().push(file.clone()),
            }
        }

        logger.info(
            self.name(),
            &format!(
                "Found {} root project(s) and {} standalone project(s)",
                projects.len(),
                uncovered.len()
            ),
        );

        let mut jobs: Vec<Box<dyn Job>> = Vec::new();
        for project in projects {
            // Every build file of this project already has its lock file
            let Some(build_files) = covered.remove(&project.dir) else {
                continue;
            };
            let mut files = vec![project.settings.clone()];
            files.extend(build_files);

            let mut job = GradleJob::new(
                project.dir.clone(),
                files,
                project.gradlew.clone(),
                Arc::clone(&init_script),
                Arc::clone(&self.services.executor),
            );
            if let Some(warning) = project.warning {
                job.base_mut().errors_mut().warning(warning);
            }
            jobs.push(Box::new(job));
        }

        for (dir, files) in uncovered {
            let gradlew = setup.gradlew_for(&dir);
            jobs.push(Box::new(GradleJob::new(
                dir,
                files,
                gradlew,
                Arc::clone(&init_script),
                Arc::clone(&self.services.executor),
            )));
        }

        Ok(jobs)
    }
}
