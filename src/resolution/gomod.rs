//! Go modules dependency resolution, one job per `go.mod`

use crate::Result;
use crate::config::GomodConfig;
use crate::constants::lock;
use crate::job::{Job, JobBase, JobError};
use crate::process::{CommandExecutor, ProcessCommand, Scope};
use crate::services::Services;
use crate::strategy::Strategy;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct GomodJob {
    base: JobBase,
    executable: String,
    executor: Arc<dyn CommandExecutor>,
}

impl GomodJob {
    pub fn new(manifest: PathBuf, executable: &str, executor: Arc<dyn CommandExecutor>) -> Self {
        let dir = manifest.parent().map(Path::to_path_buf).unwrap_or_default();
        Self {
            base: JobBase::new(format!("gomod {}", dir.display()), dir, vec![manifest]),
            executable: executable.to_string(),
            executor,
        }
    }

    fn graph_command(&self) -> ProcessCommand {
        ProcessCommand::new(&self.executable, self.base.dir()).args(["mod", "graph"])
    }

    fn list_command(&self) -> ProcessCommand {
        ProcessCommand::new(&self.executable, self.base.dir())
            .args(["list", "-mod=readonly", "-e", "-m", "all"])
    }
}

#[async_trait]
impl Job for GomodJob {
    fn base(&self) -> &JobBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut JobBase {
        &mut self.base
    }

    async fn run(&mut self, scope: &Scope) {
        self.base.send_status("Creating module graph");
        let cmd = self.graph_command();
        let Some(graph) = self
            .base
            .run_process(self.executor.as_ref(), &cmd, scope)
            .await
        else {
            return;
        };

        self.base.send_status("Listing selected module versions");
        let cmd = self.list_command();
        let Some(list) = self
            .base
            .run_process(self.executor.as_ref(), &cmd, scope)
            .await
        else {
            return;
        };

        let lock_file = self.base.dir().join(lock::GOMOD);
        let content = format!("{}\n{}", graph.stdout.trim_end(), list.stdout.trim_end());
        if let Err(e) = std::fs::write(&lock_file, content) {
            self.base.errors_mut().critical(JobError::new(format!(
                "Failed to write {}: {}",
                lock_file.display(),
                e
            )));
        }
    }
}

pub struct GomodStrategy {
    files: Vec<PathBuf>,
    config: Option<GomodConfig>,
    services: Services,
}

impl GomodStrategy {
    pub fn new(files: Vec<PathBuf>, config: Option<GomodConfig>, services: Services) -> Self {
        Self {
            files,
            config,
            services,
        }
    }
}

#[async_trait]
impl Strategy for GomodStrategy {
    fn name(&self) -> &'static str {
        "gomod"
    }

    async fn invoke(&self, _scope: &Scope) -> Result<Vec<Box<dyn Job>>> {
        let Some(config) = &self.config else {
            self.services
                .logger
                .warn(self.name(), "No configuration, skipping go.mod files");
            return Ok(Vec::new());
        };

        Ok(self
            .files
            .iter()
            .map(|file| {
                Box::new(GomodJob::new(
                    file.clone(),
                    &config.executable,
                    Arc::clone(&self.services.executor),
                )) as Box<dyn Job>
            })
            .collect())
    }
}
