//! Configuration file loading and saving

use super::ecosystems::{CallgraphConfig, ResolutionConfig};
use super::validation;
use crate::constants::config::{DEFAULT_EXCLUSIONS, DEFAULT_TIMEOUT_SECS, DEFAULT_WORKERS};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_exclusions() -> Vec<String> {
    DEFAULT_EXCLUSIONS.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Jobs run at the same time
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Deadline for one scheduling run
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_exclusions")]
    pub exclusions: Vec<String>,
    /// Globs kept even when an exclusion matches
    #[serde(default)]
    pub inclusions: Vec<String>,
    /// Resolve manifests whose lock file already exists
    #[serde(default)]
    pub regenerate: bool,
    #[serde(default)]
    pub resolution: ResolutionConfig,
    #[serde(default)]
    pub callgraph: CallgraphConfig,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{path}'"))?;

        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file '{path}'"))?;

        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, defaults otherwise
    pub fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, format!("---\n{yaml}"))?;
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self).map_err(validation::validation_errors_to_anyhow)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            timeout_secs: default_timeout_secs(),
            exclusions: default_exclusions(),
            inclusions: Vec::new(),
            regenerate: false,
            resolution: ResolutionConfig::default(),
            callgraph: CallgraphConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.resolution.maven.is_some());
        assert!(config.callgraph.java.is_some());
    }

    #[test]
    fn test_null_section_disables_ecosystem() {
        let yaml = r#"
resolution:
  pip: null
  gradle:
    executable: /opt/gradle/bin/gradle
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(config.resolution.pip.is_none());
        assert!(config.resolution.maven.is_some());
        assert_eq!(
            config.resolution.gradle.unwrap().executable,
            "/opt/gradle/bin/gradle"
        );
    }

    #[test]
    fn test_partial_section_fills_defaults() {
        let yaml = r#"
callgraph:
  java:
    build: true
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        let java = config.callgraph.java.unwrap();
        assert!(java.build);
        assert_eq!(java.maven_executable, "mvn");
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("resolvr.yaml");
        let path = path.to_str().unwrap();

        let mut config = Config::default();
        config.workers = 8;
        config.regenerate = true;
        config.save(path).unwrap();

        let loaded = Config::load(path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("resolvr.yaml");
        std::fs::write(&path, "workers: 0\n").unwrap();

        let err = Config::load(path.to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("workers"));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = Config::load_or_default("/this/path/does/not/exist.yaml").unwrap();
        assert_eq!(config, Config::default());
    }
}
