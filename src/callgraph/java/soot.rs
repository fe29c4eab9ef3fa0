//! Soot wrapper jar selection
//!
//! The analysis jar is built per Java major version. The local JVM is asked
//! for its version and the newest supported version not above it is used;
//! the jar is taken from the cache directory or downloaded into it.

use crate::config::JavaConfig;
use crate::constants::callgraph::SUPPORTED_JAVA_VERSIONS;
use crate::job::JobError;
use crate::process::{CommandExecutor, ProcessCommand, Scope};
use regex::Regex;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tokio::sync::OnceCell;

static JAVA_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"version "(\d+)(?:\.(\d+))?"#).expect("java version pattern is valid")
});

/// Major version from `java -version` output; `1.8.0_392` is 8
pub fn parse_java_major(output: &str) -> Option<u32> {
    let captures = JAVA_VERSION.captures(output)?;
    let first: u32 = captures.get(1)?.as_str().parse().ok()?;
    if first == 1 {
        captures.get(2)?.as_str().parse().ok()
    } else {
        Some(first)
    }
}

/// Newest supported version that is not newer than `major`
pub fn select_supported_version(major: u32) -> Option<u32> {
    SUPPORTED_JAVA_VERSIONS
        .iter()
        .copied()
        .filter(|supported| *supported <= major)
        .max()
}

pub fn jar_name(version: u32) -> String {
    format!("soot-wrapper-{version}.jar")
}

pub struct SootWrapper {
    java_home: Option<PathBuf>,
    explicit_jar: Option<PathBuf>,
    cache_dir: PathBuf,
    download_base_url: Option<String>,
    http: Client,
    jar: OnceCell<PathBuf>,
}

impl SootWrapper {
    pub fn new(config: &JavaConfig, http: Client) -> Self {
        Self {
            java_home: config.java_home.clone(),
            explicit_jar: config.soot_jar.clone(),
            cache_dir: config
                .jar_cache_dir
                .clone()
                .unwrap_or_else(|| std::env::temp_dir().join("resolvr-soot")),
            download_base_url: config.download_base_url.clone(),
            http,
            jar: OnceCell::new(),
        }
    }

    /// `java` of the configured home, else of `JAVA_HOME`, else from PATH
    pub fn java_executable(&self) -> String {
        let home = self
            .java_home
            .clone()
            .or_else(|| std::env::var_os("JAVA_HOME").map(PathBuf::from))
            .filter(|home| !home.as_os_str().is_empty());

        match home {
            Some(home) => home.join("bin").join("java").display().to_string(),
            None => "java".to_string(),
        }
    }

    /// Jar matching the local JVM, resolved once and shared by every job
    pub async fn jar(
        &self,
        executor: &dyn CommandExecutor,
        dir: &Path,
        scope: &Scope,
    ) -> Result<PathBuf, JobError> {
        self.jar
            .get_or_try_init(|| self.locate(executor, dir, scope))
            .await
            .cloned()
    }

    async fn locate(
        &self,
        executor: &dyn CommandExecutor,
        dir: &Path,
        scope: &Scope,
    ) -> Result<PathBuf, JobError> {
        if let Some(jar) = &self.explicit_jar {
            if jar.is_file() {
                return Ok(jar.clone());
            }
            return Err(JobError::new(format!(
                "Configured Soot wrapper jar {} does not exist",
                jar.display()
            )));
        }

        let cmd = ProcessCommand::new(self.java_executable(), dir).arg("-version");
        let output = executor
            .execute(&cmd, Some(scope))
            .await
            .map_err(|err| JobError::from_process(&err))?;

        let text = format!("{}\n{}", output.stderr, output.stdout);
        let major = parse_java_major(&text).ok_or_else(|| {
            JobError::new(format!("Could not read the Java version from: {}", text.trim()))
                .with_command(cmd.to_string())
        })?;
        let version = select_supported_version(major).ok_or_else(|| {
            JobError::new(format!(
                "Java {major} is not supported, call graph generation needs Java 11 or later"
            ))
            .with_documentation("Point callgraph.java.java_home or JAVA_HOME to a newer JDK.")
        })?;

        let jar = self.cache_dir.join(jar_name(version));
        if jar.is_file() {
            return Ok(jar);
        }

        self.download(version, &jar).await?;
        Ok(jar)
    }

    async fn download(&self, version: u32, target: &Path) -> Result<(), JobError> {
        let Some(base_url) = &self.download_base_url else {
            return Err(JobError::new(format!(
                "{} is not in {} and no download URL is configured",
                jar_name(version),
                self.cache_dir.display()
            ))
            .with_documentation("Set callgraph.java.download_base_url or callgraph.java.soot_jar."));
        };

        let url = format!("{}/{}", base_url.trim_end_matches('/'), jar_name(version));
        let failed = |e: reqwest::Error| JobError::new(format!("Failed to download {url}: {e}"));
        let bytes = self
            .http
            .get(&url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(failed)?
            .bytes()
            .await
            .map_err(failed)?;

        let write_failed =
            |e: std::io::Error| JobError::new(format!("Failed to store {}: {}", target.display(), e));
        std::fs::create_dir_all(&self.cache_dir).map_err(write_failed)?;
        let partial = target.with_extension("jar.part");
        std::fs::write(&partial, &bytes).map_err(write_failed)?;
        std::fs::rename(&partial, target).map_err(write_failed)?;
        Ok(())
    }
}
