//! Configuration validation

use super::Config;
use anyhow::anyhow;

/// Enumeration of possible validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Worker count must allow at least one job to run
    NoWorkers,
    /// A zero timeout would cancel every job before it starts
    ZeroTimeout,
    /// Glob pattern does not compile
    InvalidGlob(String, String),
    /// An executable setting is empty
    EmptyExecutable(&'static str),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::NoWorkers => write!(f, "workers must be at least 1"),
            ValidationError::ZeroTimeout => write!(f, "timeout_secs must be greater than 0"),
            ValidationError::InvalidGlob(glob, reason) => {
                write!(f, "Invalid glob pattern '{}': {}", glob, reason)
            }
            ValidationError::EmptyExecutable(setting) => {
                write!(f, "Executable setting '{}' cannot be empty", setting)
            }
        }
    }
}

/// Validates a complete configuration object
pub fn validate_config(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.workers == 0 {
        errors.push(ValidationError::NoWorkers);
    }
    if config.timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    for glob in config.exclusions.iter().chain(config.inclusions.iter()) {
        if let Err(err) = validate_glob(glob) {
            errors.push(err);
        }
    }

    let resolution = &config.resolution;
    let executables = [
        ("resolution.maven.executable", resolution.maven.as_ref().map(|c| &c.executable)),
        ("resolution.gradle.executable", resolution.gradle.as_ref().map(|c| &c.executable)),
        ("resolution.gomod.executable", resolution.gomod.as_ref().map(|c| &c.executable)),
        ("resolution.pip.python", resolution.pip.as_ref().map(|c| &c.python)),
        (
            "callgraph.java.maven_executable",
            config.callgraph.java.as_ref().map(|c| &c.maven_executable),
        ),
        (
            "callgraph.golang.executable",
            config.callgraph.golang.as_ref().map(|c| &c.executable),
        ),
    ];
    for (setting, value) in executables {
        if value.is_some_and(|v| v.trim().is_empty()) {
            errors.push(ValidationError::EmptyExecutable(setting));
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Validates a single glob pattern
pub fn validate_glob(glob: &str) -> Result<(), ValidationError> {
    glob::Pattern::new(glob)
        .map(|_| ())
        .map_err(|e| ValidationError::InvalidGlob(glob.to_string(), e.msg.to_string()))
}

/// Convert validation errors to a single anyhow error
pub fn validation_errors_to_anyhow(errors: Vec<ValidationError>) -> anyhow::Error {
    let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
    anyhow!("Configuration is invalid:\n  {}", messages.join("\n  "))
}
