//! End-of-run report
//!
//! Lists the warnings and critical errors of every job, with paths shown
//! relative to the deepest directory the jobs share.

use crate::job::{Job, JobError};
use crate::logger::Logger;
use crate::outcome::Outcome;
use crate::utils::greatest_common_dir;
use anyhow::Result;
use chrono::{DateTime, Utc};
use colored::*;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorEntry {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
}

impl From<&JobError> for ErrorEntry {
    fn from(error: &JobError) -> Self {
        Self {
            message: error.message().to_string(),
            command: error.command().map(str::to_string),
            documentation: error.documentation().map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobEntry {
    pub label: String,
    pub dir: PathBuf,
    pub files: Vec<PathBuf>,
    pub warnings: Vec<ErrorEntry>,
    pub criticals: Vec<ErrorEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub command: String,
    pub generated_at: DateTime<Utc>,
    pub root: PathBuf,
    pub jobs: Vec<JobEntry>,
}

fn relative(path: &Path, root: &Path) -> PathBuf {
    if root.as_os_str().is_empty() {
        return path.to_path_buf();
    }
    match path.strip_prefix(root) {
        Ok(rel) if rel.as_os_str().is_empty() => PathBuf::from("."),
        Ok(rel) => rel.to_path_buf(),
        Err(_) => path.to_path_buf(),
    }
}

impl Report {
    pub fn new(command: &str, outcome: &Outcome) -> Self {
        let files: Vec<PathBuf> = outcome
            .jobs()
            .iter()
            .flat_map(|job| job.files().iter().cloned())
            .collect();
        let root = greatest_common_dir(&files);

        let jobs = outcome
            .jobs()
            .iter()
            .map(|job| JobEntry {
                label: job.label().to_string(),
                dir: relative(job.dir(), &root),
                files: job.files().iter().map(|f| relative(f, &root)).collect(),
                warnings: job.errors().get_warning_errors().iter().map(Into::into).collect(),
                criticals: job.errors().get_critical_errors().iter().map(Into::into).collect(),
            })
            .collect();

        Self {
            command: command.to_string(),
            generated_at: Utc::now(),
            root,
            jobs,
        }
    }

    pub fn failed(&self) -> usize {
        self.jobs.iter().filter(|job| !job.criticals.is_empty()).count()
    }

    pub fn warned(&self) -> usize {
        self.jobs.iter().filter(|job| !job.warnings.is_empty()).count()
    }

    pub fn has_critical(&self) -> bool {
        self.failed() > 0
    }

    /// Print jobs with errors, then a summary line
    pub fn print(&self, logger: &Logger) {
        for job in self.jobs.iter().filter(|j| !j.warnings.is_empty() || !j.criticals.is_empty()) {
            let kind = job.label.split_whitespace().next().unwrap_or_default();
            let label = format!("{kind} {}", job.dir.display());
            for warning in &job.warnings {
                logger.warn(&label, &warning.message);
                print_details(warning);
            }
            for critical in &job.criticals {
                logger.error(&label, &critical.message);
                print_details(critical);
            }
        }

        let summary = format!(
            "{} job(s), {} failed, {} with warnings",
            self.jobs.len(),
            self.failed(),
            self.warned()
        );
        if self.has_critical() {
            logger.error(&self.command, &summary);
        } else {
            logger.success(&self.command, &summary);
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

fn print_details(entry: &ErrorEntry) {
    if let Some(command) = &entry.command {
        eprintln!("    {} {}", "command:".dimmed(), command);
    }
    if let Some(documentation) = &entry.documentation {
        eprintln!("    {} {}", "hint:".dimmed(), documentation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobBase;
    use crate::process::Scope;
    use async_trait::async_trait;

    struct StaticJob {
        base: JobBase,
    }

    #[async_trait]
    impl Job for StaticJob {
        fn base(&self) -> &JobBase {
            &self.base
        }

        fn base_mut(&mut self) -> &mut JobBase {
            &mut self.base
        }

        async fn run(&mut self, _scope: &Scope) {}
    }

    fn job(dir: &str, file: &str, critical: Option<&str>) -> Box<dyn Job> {
        let mut base = JobBase::new(format!("maven {dir}"), dir, vec![PathBuf::from(file)]);
        if let Some(message) = critical {
            base.errors_mut()
                .critical(JobError::new(message).with_command("mvn dependency:tree"));
        }
        Box::new(StaticJob { base })
    }

    #[test]
    fn test_report_uses_common_root() {
        let outcome = Outcome::new(vec![
            job("/w/repo/a", "/w/repo/a/pom.xml", None),
            job("/w/repo/b", "/w/repo/b/pom.xml", Some("boom")),
        ]);

        let report = Report::new("resolve", &outcome);
        assert_eq!(report.root, PathBuf::from("/w/repo"));
        assert_eq!(report.jobs[0].dir, PathBuf::from("a"));
        assert_eq!(report.jobs[1].files, vec![PathBuf::from("b/pom.xml")]);
        assert_eq!(report.failed(), 1);
        assert!(report.has_critical());
    }

    #[test]
    fn test_report_json() {
        let outcome = Outcome::new(vec![job("/w/a", "/w/a/pom.xml", Some("boom"))]);
        let json: serde_json::Value =
            serde_json::from_str(&Report::new("resolve", &outcome).to_json().unwrap()).unwrap();

        assert_eq!(json["command"], "resolve");
        assert!(json["generated_at"].is_string());
        assert_eq!(json["jobs"][0]["criticals"][0]["message"], "boom");
        assert_eq!(json["jobs"][0]["criticals"][0]["command"], "mvn dependency:tree");
        assert!(json["jobs"][0]["warnings"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_empty_report() {
        let report = Report::new("callgraph", &Outcome::default());
        assert!(!report.has_critical());
        assert_eq!(report.root, PathBuf::new());
    }
}
