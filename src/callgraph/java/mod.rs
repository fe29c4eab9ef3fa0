//! Java call graphs through the Soot wrapper
//!
//! Roots are found the same way as for Maven resolution. Every root gets the
//! compiled class directories located under it. A root without any, or whose
//! build failed, keeps a job that only carries a warning and runs nothing.

pub mod soot;

pub use soot::SootWrapper;

use super::package_output;
use crate::Result;
use crate::archive::Archiver;
use crate::config::JavaConfig;
use crate::constants::callgraph::{MAVEN_DEPENDENCY_DIR, OUTPUT_FILE};
use crate::job::{Job, JobBase, JobError};
use crate::process::{CommandExecutor, ProcessCommand, Scope};
use crate::resolution::maven::{find_maven_roots, map_roots_to_class_dirs};
use crate::services::Services;
use crate::strategy::{RootOutcome, Strategy};
use crate::utils::{FileFinder, find_dependency_dirs};
use anyhow::Context;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct JavaJob {
    base: JobBase,
    class_dirs: Vec<PathBuf>,
    maven_executable: String,
    soot: Arc<SootWrapper>,
    executor: Arc<dyn CommandExecutor>,
    archiver: Arc<dyn Archiver>,
}

impl JavaJob {
    pub fn new(
        root: PathBuf,
        class_dirs: Vec<PathBuf>,
        maven_executable: &str,
        soot: Arc<SootWrapper>,
        services: &Services,
    ) -> Self {
        let dir = root.parent().map(Path::to_path_buf).unwrap_or_default();
        Self {
            base: JobBase::new(format!("java {}", dir.display()), dir, vec![root]),
            class_dirs,
            maven_executable: maven_executable.to_string(),
            soot,
            executor: Arc::clone(&services.executor),
            archiver: Arc::clone(&services.archiver),
        }
    }

    pub fn class_dirs(&self) -> &[PathBuf] {
        &self.class_dirs
    }

    fn dependency_dir(&self) -> PathBuf {
        self.base.dir().join(MAVEN_DEPENDENCY_DIR)
    }

    fn copy_dependencies_command(&self) -> ProcessCommand {
        ProcessCommand::new(&self.maven_executable, self.base.dir()).args([
            "dependency:copy-dependencies".to_string(),
            format!("-DoutputDirectory={}", self.dependency_dir().display()),
            "-DskipTests".to_string(),
            "-q".to_string(),
        ])
    }

    fn soot_command(&self, jar: &Path) -> ProcessCommand {
        let mut cmd = ProcessCommand::new(self.soot.java_executable(), self.base.dir())
            .args(["-jar".to_string(), jar.display().to_string()]);
        for class_dir in &self.class_dirs {
            cmd = cmd.args(["-u".to_string(), class_dir.display().to_string()]);
        }
        cmd.args([
            "-l".to_string(),
            self.dependency_dir().display().to_string(),
            "-f".to_string(),
            self.base.dir().join(OUTPUT_FILE).display().to_string(),
        ])
    }
}

#[async_trait]
impl Job for JavaJob {
    fn base(&self) -> &JobBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut JobBase {
        &mut self.base
    }

    async fn run(&mut self, scope: &Scope) {
        if self.class_dirs.is_empty() {
            self.base.send_status("No compiled classes, skipping");
            return;
        }

        self.base.send_status("Copying Maven dependencies");
        let cmd = self.copy_dependencies_command();
        if self
            .base
            .run_process(self.executor.as_ref(), &cmd, scope)
            .await
            .is_none()
        {
            return;
        }

        self.base.send_status("Preparing Soot wrapper");
        let jar = match self
            .soot
            .jar(self.executor.as_ref(), self.base.dir(), scope)
            .await
        {
            Ok(jar) => jar,
            Err(error) => {
                self.base.errors_mut().critical(error);
                return;
            }
        };

        self.base.send_status("Building call graph");
        let cmd = self.soot_command(&jar);
        if self
            .base
            .run_process(self.executor.as_ref(), &cmd, scope)
            .await
            .is_none()
        {
            return;
        }

        self.base.send_status("Packaging call graph");
        let output = self.base.dir().join(OUTPUT_FILE);
        package_output(&mut self.base, self.archiver.as_ref(), &output);

        let dependency_dir = self.dependency_dir();
        match std::fs::remove_dir_all(&dependency_dir) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => self.base.errors_mut().warning(JobError::new(format!(
                "Failed to remove {}: {}",
                dependency_dir.display(),
                e
            ))),
        }
    }
}

pub struct JavaStrategy {
    poms: Vec<PathBuf>,
    scanned: Arc<Vec<PathBuf>>,
    finder: FileFinder,
    config: Option<JavaConfig>,
    services: Services,
}

impl JavaStrategy {
    /// `finder` rescans the roots after a build, with the same globs as the
    /// scan that produced `scanned`
    pub fn new(
        poms: Vec<PathBuf>,
        scanned: Arc<Vec<PathBuf>>,
        finder: FileFinder,
        config: Option<JavaConfig>,
        services: Services,
    ) -> Self {
        Self {
            poms,
            scanned,
            finder,
            config,
            services,
        }
    }

    /// `mvn package` on every root; only a failure on all of them is an error
    async fn build(
        &self,
        config: &JavaConfig,
        roots: &[PathBuf],
        scope: &Scope,
    ) -> Result<BTreeMap<PathBuf, JobError>> {
        let mut outcome = RootOutcome::new();

        for root in roots {
            let dir = root.parent().unwrap_or_else(|| Path::new(""));
            self.services
                .logger
                .info(self.name(), &format!("Building {}", dir.display()));
            let cmd = ProcessCommand::new(&config.maven_executable, dir)
                .args(["package", "-q", "-DskipTests", "-e"]);

            match self.services.executor.execute(&cmd, Some(scope)).await {
                Ok(_) => outcome.succeeded.push(root.clone()),
                Err(err) => {
                    let error = JobError::from_process(&err);
                    outcome.failed.push((root.clone(), error.to_string()));
                }
            }
        }

        if outcome.all_failed() {
            let reasons: Vec<String> = outcome
                .failed
                .iter()
                .map(|(root, message)| format!("{}: {}", root.display(), message))
                .collect();
            anyhow::bail!("Build failed for every Maven root:\n  {}", reasons.join("\n  "));
        }

        Ok(outcome
            .failed
            .into_iter()
            .map(|(root, message)| {
                let warning = JobError::new(format!("Build failed, skipping call graph: {message}"))
                    .with_command(format!("{} package -q -DskipTests -e", config.maven_executable));
                (root, warning)
            })
            .collect())
    }
}

#[async_trait]
impl Strategy for JavaStrategy {
    fn name(&self) -> &'static str {
        "java"
    }

    async fn invoke(&self, scope: &Scope) -> Result<Vec<Box<dyn Job>>> {
        let Some(config) = &self.config else {
            self.services
                .logger
                .warn(self.name(), "No configuration, skipping Java call graphs");
            return Ok(Vec::new());
        };

        let roots = find_maven_roots(&self.poms).context("Failed to find Maven root projects")?;
        if roots.is_empty() {
            return Ok(Vec::new());
        }

        let (mut warnings, class_dirs) = if config.build {
            let warnings = self.build(config, &roots, scope).await?;
            let root_dirs: Vec<PathBuf> = roots
                .iter()
                .filter_map(|root| root.parent().map(Path::to_path_buf))
                .collect();
            let built = self
                .finder
                .find_files(&root_dirs)
                .context("Failed to scan Maven roots after the build")?;
            (warnings, find_dependency_dirs(&built, false))
        } else {
            (BTreeMap::new(), find_dependency_dirs(&self.scanned, false))
        };

        let soot = Arc::new(SootWrapper::new(config, self.services.http.clone()));
        let mapping = map_roots_to_class_dirs(&roots, &class_dirs);
        let mut jobs: Vec<Box<dyn Job>> = Vec::new();

        for (root, class_dirs) in mapping {
            // A root whose build failed is reported but not analyzed
            let build_warning = warnings.remove(&root);
            let class_dirs = if build_warning.is_some() {
                Vec::new()
            } else {
                class_dirs
            };
            let missing_classes = build_warning.is_none() && class_dirs.is_empty();
            let mut job = JavaJob::new(
                root.clone(),
                class_dirs,
                &config.maven_executable,
                Arc::clone(&soot),
                &self.services,
            );

            if let Some(warning) = build_warning {
                job.base_mut().errors_mut().warning(warning);
            }
            if missing_classes {
                let message = format!("No compiled classes found for {}", root.display());
                self.services.logger.warn(self.name(), &message);
                job.base_mut().errors_mut().warning(
                    JobError::new(message).with_documentation(
                        "Build the project before generating call graphs, or enable callgraph.java.build.",
                    ),
                );
            }
            jobs.push(Box::new(job));
        }

        Ok(jobs)
    }
}
