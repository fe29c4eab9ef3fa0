//! Gradle multi-project discovery
//!
//! Settings files mark candidate root projects. Each root not already owned
//! by another root is asked for its subprojects through the init script task;
//! those directories are then covered by the root and never resolved on
//! their own.

use super::InitScript;
use crate::constants::gradle::{PROJECT_PATHS_FILE, PROJECT_PATHS_TASK};
use crate::job::JobError;
use crate::process::{CommandExecutor, ProcessCommand, Scope};
use crate::strategy::RootOutcome;
use crate::utils::canonical;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

const SETTINGS_FILES: &[&str] = &["settings.gradle", "settings.gradle.kts"];

#[cfg(windows)]
const GRADLEW_FILES: &[&str] = &["gradlew.bat", "gradlew"];
#[cfg(not(windows))]
const GRADLEW_FILES: &[&str] = &["gradlew", "gradlew.bat"];

/// A root project and the subproject directories it owns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradleProject {
    pub dir: PathBuf,
    pub settings: PathBuf,
    pub gradlew: String,
    pub subprojects: BTreeSet<PathBuf>,
    /// Set when subproject discovery failed for this root
    pub warning: Option<JobError>,
}

impl GradleProject {
    /// Whether `dir` is resolved as part of this project
    pub fn covers(&self, dir: &Path) -> bool {
        dir == self.dir || self.subprojects.contains(dir)
    }
}

/// Settings and wrapper files found among the scanned files
#[derive(Debug, Clone, Default)]
pub struct GradleSetup {
    settings: BTreeMap<PathBuf, PathBuf>,
    gradlews: BTreeMap<PathBuf, PathBuf>,
    default_executable: String,
}

impl GradleSetup {
    pub fn new(files: &[PathBuf], default_executable: &str) -> Self {
        let mut settings = BTreeMap::new();
        let mut gradlews: BTreeMap<PathBuf, PathBuf> = BTreeMap::new();

        for file in files {
            let (Some(name), Some(dir)) = (file.file_name().and_then(|n| n.to_str()), file.parent())
            else {
                continue;
            };

            if SETTINGS_FILES.contains(&name) {
                settings.entry(dir.to_path_buf()).or_insert_with(|| file.clone());
            } else if let Some(rank) = GRADLEW_FILES.iter().position(|w| *w == name) {
                let keep_existing = gradlews.get(dir).is_some_and(|existing| {
                    existing
                        .file_name()
                        .and_then(|n| n.to_str())
                        .and_then(|n| GRADLEW_FILES.iter().position(|w| *w == n))
                        .is_some_and(|existing_rank| existing_rank <= rank)
                });
                if !keep_existing {
                    gradlews.insert(dir.to_path_buf(), file.clone());
                }
            }
        }

        Self {
            settings,
            gradlews,
            default_executable: default_executable.to_string(),
        }
    }

    pub fn settings_dirs(&self) -> impl Iterator<Item = &PathBuf> {
        self.settings.keys()
    }

    /// Wrapper for `dir`: its own, else the one of its deepest ancestor,
    /// else the configured executable
    pub fn gradlew_for(&self, dir: &Path) -> String {
        if let Some(gradlew) = self.gradlews.get(dir) {
            return gradlew.display().to_string();
        }

        self.gradlews
            .iter()
            .filter(|(wrapper_dir, _)| dir.starts_with(wrapper_dir))
            .max_by_key(|(wrapper_dir, _)| wrapper_dir.components().count())
            .map(|(_, gradlew)| gradlew.display().to_string())
            .unwrap_or_else(|| self.default_executable.clone())
    }

    /// Discover root projects and their subprojects
    ///
    /// Settings directories are visited parents first, so a nested settings
    /// file listed by its parent is skipped. The returned outcome holds the
    /// roots whose discovery worked in `succeeded` and the others, with the
    /// failure message, in `failed`.
    pub async fn discover(
        &self,
        executor: &dyn CommandExecutor,
        init_script: &InitScript,
        scope: &Scope,
    ) -> RootOutcome<GradleProject> {
        let mut outcome = RootOutcome::new();
        let mut owned: BTreeSet<PathBuf> = BTreeSet::new();

        for (dir, settings) in &self.settings {
            if owned.contains(dir) {
                continue;
            }

            let mut project = GradleProject {
                dir: dir.clone(),
                settings: settings.clone(),
                gradlew: self.gradlew_for(dir),
                subprojects: BTreeSet::new(),
                warning: None,
            };

            match find_subprojects(executor, &project, init_script, scope).await {
                Ok(subprojects) => {
                    owned.extend(subprojects.iter().cloned());
                    project.subprojects = subprojects;
                    outcome.succeeded.push(project);
                }
                Err(error) => {
                    let message = error.to_string();
                    project.warning = Some(error);
                    outcome.failed.push((project, message));
                }
            }
        }

        outcome
    }
}

async fn find_subprojects(
    executor: &dyn CommandExecutor,
    project: &GradleProject,
    init_script: &InitScript,
    scope: &Scope,
) -> Result<BTreeSet<PathBuf>, JobError> {
    let cmd = ProcessCommand::new(&project.gradlew, &project.dir)
        .args(["--init-script", &init_script.path().display().to_string()])
        .args(["-q", PROJECT_PATHS_TASK]);

    executor.execute(&cmd, Some(scope)).await.map_err(|err| {
        let detail = JobError::from_process(&err);
        let mut error = JobError::new(format!(
            "Could not list subprojects of {}: {}",
            project.dir.display(),
            detail.message()
        ))
        .with_command(cmd.to_string());
        if let Some(doc) = detail.documentation() {
            error = error.with_documentation(doc);
        }
        error
    })?;

    let paths_file = project.dir.join(PROJECT_PATHS_FILE);
    let content = std::fs::read_to_string(&paths_file).map_err(|e| {
        JobError::new(format!("Could not read {}: {}", paths_file.display(), e))
    })?;
    remove_listing(&paths_file)?;

    Ok(parse_project_paths(&project.dir, &content))
}

/// Delete the subproject listing; a listing that is already gone is fine
fn remove_listing(paths_file: &Path) -> Result<(), JobError> {
    match std::fs::remove_file(paths_file) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(JobError::new(format!(
            "Could not remove {}: {}",
            paths_file.display(),
            e
        ))),
    }
}

/// Subproject directories listed one per line, relative ones taken from `root`
///
/// Entries are canonicalized so they compare equal to scanned directories.
pub fn parse_project_paths(root: &Path, content: &str) -> BTreeSet<PathBuf> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| canonical(&root.join(line)))
        .filter(|dir| dir != root)
        .collect()
}
