//! Go call graphs, one job per `main` package

use super::package_output;
use crate::Result;
use crate::archive::Archiver;
use crate::config::GolangConfig;
use crate::constants::callgraph::OUTPUT_FILE;
use crate::job::{Job, JobBase, JobError};
use crate::process::{CommandExecutor, ProcessCommand, Scope};
use crate::services::Services;
use crate::strategy::Strategy;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Whether Go source declares `package main`
fn declares_main_package(source: &str) -> bool {
    source
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with("package "))
        .is_some_and(|line| line.split_whitespace().nth(1) == Some("main"))
}

fn declares_main_func(source: &str) -> bool {
    source
        .lines()
        .any(|line| line.trim_start().starts_with("func main("))
}

/// Directories of `main` packages defining `func main`, with their Go files
///
/// Test files are ignored, as are files that cannot be read.
pub fn find_main_packages(files: &[PathBuf]) -> BTreeMap<PathBuf, Vec<PathBuf>> {
    let mut packages: BTreeMap<PathBuf, (Vec<PathBuf>, bool)> = BTreeMap::new();

    for file in files {
        let Some(name) = file.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !name.ends_with(".go") || name.ends_with("_test.go") {
            continue;
        }
        let Ok(source) = std::fs::read_to_string(file) else {
            continue;
        };
        if !declares_main_package(&source) {
            continue;
        }

        let dir = file.parent().map(Path::to_path_buf).unwrap_or_default();
        let entry = packages.entry(dir).or_default();
        entry.0.push(file.clone());
        entry.1 |= declares_main_func(&source);
    }

    packages
        .into_iter()
        .filter(|(_, (_, has_main))| *has_main)
        .map(|(dir, (files, _))| (dir, files))
        .collect()
}

pub struct GolangJob {
    base: JobBase,
    config: GolangConfig,
    executor: Arc<dyn CommandExecutor>,
    archiver: Arc<dyn Archiver>,
}

impl GolangJob {
    pub fn new(dir: PathBuf, files: Vec<PathBuf>, config: GolangConfig, services: &Services) -> Self {
        Self {
            base: JobBase::new(format!("golang {}", dir.display()), dir, files),
            config,
            executor: Arc::clone(&services.executor),
            archiver: Arc::clone(&services.archiver),
        }
    }

    fn command(&self) -> ProcessCommand {
        ProcessCommand::new(&self.config.executable, self.base.dir()).args([
            format!("-algo={}", self.config.algorithm),
            "-format=digraph".to_string(),
            ".".to_string(),
        ])
    }
}

#[async_trait]
impl Job for GolangJob {
    fn base(&self) -> &JobBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut JobBase {
        &mut self.base
    }

    async fn run(&mut self, scope: &Scope) {
        self.base.send_status("Building call graph");
        let cmd = self.command();
        let Some(output) = self
            .base
            .run_process(self.executor.as_ref(), &cmd, scope)
            .await
        else {
            return;
        };

        let output_file = self.base.dir().join(OUTPUT_FILE);
        if let Err(e) = std::fs::write(&output_file, output.stdout) {
            self.base.errors_mut().critical(JobError::new(format!(
                "Failed to write {}: {}",
                output_file.display(),
                e
            )));
            return;
        }

        self.base.send_status("Packaging call graph");
        package_output(&mut self.base, self.archiver.as_ref(), &output_file);
    }
}

pub struct GolangStrategy {
    files: Vec<PathBuf>,
    config: Option<GolangConfig>,
    services: Services,
}

impl GolangStrategy {
    pub fn new(files: Vec<PathBuf>, config: Option<GolangConfig>, services: Services) -> Self {
        Self {
            files,
            config,
            services,
        }
    }
}

#[async_trait]
impl Strategy for GolangStrategy {
    fn name(&self) -> &'static str {
        "golang"
    }

    async fn invoke(&self, _scope: &Scope) -> Result<Vec<Box<dyn Job>>> {
        let Some(config) = &self.config else {
            self.services
                .logger
                .warn(self.name(), "No configuration, skipping Go call graphs");
            return Ok(Vec::new());
        };

        let packages = find_main_packages(&self.files);
        self.services.logger.info(
            self.name(),
            &format!("Found {} main package(s)", packages.len()),
        );

        Ok(packages
            .into_iter()
            .map(|(dir, files)| {
                Box::new(GolangJob::new(dir, files, config.clone(), &self.services)) as Box<dyn Job>
            })
            .collect())
    }
}
