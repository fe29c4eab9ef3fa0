//! pip dependency resolution, one job per requirements file
//!
//! Requirements are installed into a throwaway virtual environment so that
//! `pip list` and `pip show` describe exactly what the file pulls in.

use crate::Result;
use crate::config::PipConfig;
use crate::constants::lock;
use crate::job::{Job, JobBase, JobError};
use crate::process::{CommandExecutor, ProcessCommand, Scope};
use crate::services::Services;
use crate::strategy::Strategy;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const SECTION_SEPARATOR: &str = "\n***\n";

/// Lock file path for a requirements file: `.<file name>.pip.resolvr.lock`
pub fn lock_file_for(manifest: &Path) -> PathBuf {
    let name = manifest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let dir = manifest.parent().unwrap_or_else(|| Path::new(""));
    dir.join(format!(".{}{}", name, lock::PIP_SUFFIX))
}

/// Package names from `pip list` output, skipping its two header lines
pub fn parse_pip_list(output: &str) -> Vec<String> {
    output
        .lines()
        .skip(2)
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_string)
        .collect()
}

pub struct PipJob {
    base: JobBase,
    config: PipConfig,
    executor: Arc<dyn CommandExecutor>,
}

impl PipJob {
    pub fn new(manifest: PathBuf, config: PipConfig, executor: Arc<dyn CommandExecutor>) -> Self {
        let dir = manifest.parent().map(Path::to_path_buf).unwrap_or_default();
        Self {
            base: JobBase::new(format!("pip {}", manifest.display()), dir, vec![manifest]),
            config,
            executor,
        }
    }

    fn manifest(&self) -> &Path {
        &self.base.files()[0]
    }

    fn pip(&self, python: &str) -> ProcessCommand {
        ProcessCommand::new(python, self.base.dir()).args(["-m", "pip"])
    }

    /// Create the virtual environment and install the requirements into it,
    /// returning its interpreter
    async fn install(&mut self, venv_root: &Path, scope: &Scope) -> Option<String> {
        let venv = venv_root.join("venv");
        self.base.send_status("Creating virtual environment");
        let cmd = ProcessCommand::new(&self.config.python, self.base.dir())
            .args(["-m", "venv", &venv.display().to_string()]);
        self.base
            .run_process(self.executor.as_ref(), &cmd, scope)
            .await?;

        let python = if cfg!(windows) {
            venv.join("Scripts").join("python.exe")
        } else {
            venv.join("bin").join("python")
        };
        let python = python.display().to_string();

        self.base.send_status("Installing requirements");
        let cmd = self
            .pip(&python)
            .args(["install", "-r", &self.manifest().display().to_string()]);
        self.base
            .run_process(self.executor.as_ref(), &cmd, scope)
            .await?;

        Some(python)
    }
}

#[async_trait]
impl Job for PipJob {
    fn base(&self) -> &JobBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut JobBase {
        &mut self.base
    }

    async fn run(&mut self, scope: &Scope) {
        let requirements = match std::fs::read_to_string(self.manifest()) {
            Ok(content) => content,
            Err(e) => {
                let message = format!("Failed to read {}: {}", self.manifest().display(), e);
                self.base.errors_mut().critical(JobError::new(message));
                return;
            }
        };

        // The virtual environment lives until the job returns
        let (python, _venv_root) = if self.config.install {
            let venv_root = match tempfile::Builder::new().prefix("resolvr-pip").tempdir() {
                Ok(dir) => dir,
                Err(e) => {
                    self.base.errors_mut().critical(JobError::new(format!(
                        "Failed to create a virtual environment directory: {e}"
                    )));
                    return;
                }
            };
            let Some(python) = self.install(venv_root.path(), scope).await else {
                return;
            };
            (python, Some(venv_root))
        } else {
            (self.config.python.clone(), None)
        };

        self.base.send_status("Listing installed packages");
        let cmd = self.pip(&python).arg("list");
        let Some(list) = self
            .base
            .run_process(self.executor.as_ref(), &cmd, scope)
            .await
        else {
            return;
        };

        let packages = parse_pip_list(&list.stdout);
        let show = if packages.is_empty() {
            String::new()
        } else {
            self.base.send_status("Reading package metadata");
            let cmd = self.pip(&python).arg("show").args(packages);
            match self
                .base
                .run_process(self.executor.as_ref(), &cmd, scope)
                .await
            {
                Some(output) => output.stdout,
                None => return,
            }
        };

        let lock_file = lock_file_for(self.manifest());
        let content = [requirements.trim_end(), list.stdout.trim_end(), show.trim_end()]
            .join(SECTION_SEPARATOR);
        if let Err(e) = std::fs::write(&lock_file, content) {
            self.base.errors_mut().critical(JobError::new(format!(
                "Failed to write {}: {}",
                lock_file.display(),
                e
            )));
        }
    }
}

pub struct PipStrategy {
    files: Vec<PathBuf>,
    config: Option<PipConfig>,
    services: Services,
}

impl PipStrategy {
    pub fn new(files: Vec<PathBuf>, config: Option<PipConfig>, services: Services) -> Self {
        Self {
            files,
            config,
            services,
        }
    }
}

#[async_trait]
impl Strategy for PipStrategy {
    fn name(&self) -> &'static str {
        "pip"
    }

    async fn invoke(&self, _scope: &Scope) -> Result<Vec<Box<dyn Job>>> {
        let Some(config) = &self.config else {
            self.services
                .logger
                .warn(self.name(), "No configuration, skipping requirements files");
            return Ok(Vec::new());
        };

        Ok(self
            .files
            .iter()
            .map(|file| {
                Box::new(PipJob::new(
                    file.clone(),
                    config.clone(),
                    Arc::clone(&self.services.executor),
                )) as Box<dyn Job>
            })
            .collect())
    }
}
