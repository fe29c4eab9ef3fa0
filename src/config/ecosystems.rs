//! Per-ecosystem configuration sections

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `Some(T::default())`, used so a missing section means "defaults" while an
/// explicit `null` disables the ecosystem
pub(crate) fn enabled<T: Default>() -> Option<T> {
    Some(T::default())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MavenConfig {
    /// Maven executable
    pub executable: String,
}

impl Default for MavenConfig {
    fn default() -> Self {
        Self {
            executable: "mvn".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradleConfig {
    /// Executable used when no `gradlew` wrapper covers a project
    pub executable: String,
}

impl Default for GradleConfig {
    fn default() -> Self {
        Self {
            executable: "gradle".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GomodConfig {
    /// Go executable
    pub executable: String,
}

impl Default for GomodConfig {
    fn default() -> Self {
        Self {
            executable: "go".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipConfig {
    /// Python interpreter used to create the virtual environment
    pub python: String,
    /// Install requirements into a fresh virtual environment before listing
    pub install: bool,
}

impl Default for PipConfig {
    fn default() -> Self {
        Self {
            python: "python3".to_string(),
            install: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JavaConfig {
    /// Run `mvn package` on every root before looking for classes
    pub build: bool,
    pub maven_executable: String,
    /// JDK home; `JAVA_HOME` and then `java` from PATH are used otherwise
    pub java_home: Option<PathBuf>,
    /// Explicit Soot wrapper jar, skipping version-based selection
    pub soot_jar: Option<PathBuf>,
    /// Where version-specific Soot wrapper jars are looked up and downloaded to
    pub jar_cache_dir: Option<PathBuf>,
    /// Base URL serving `soot-wrapper-<major>.jar`
    pub download_base_url: Option<String>,
}

impl Default for JavaConfig {
    fn default() -> Self {
        Self {
            build: false,
            maven_executable: "mvn".to_string(),
            java_home: None,
            soot_jar: None,
            jar_cache_dir: None,
            download_base_url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GolangConfig {
    /// `golang.org/x/tools/cmd/callgraph` executable
    pub executable: String,
    /// Call graph construction algorithm (`static`, `cha`, `rta`, `vta`)
    pub algorithm: String,
}

impl Default for GolangConfig {
    fn default() -> Self {
        Self {
            executable: "callgraph".to_string(),
            algorithm: "rta".to_string(),
        }
    }
}

/// Dependency resolution sections; `None` skips the ecosystem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionConfig {
    #[serde(default = "enabled")]
    pub maven: Option<MavenConfig>,
    #[serde(default = "enabled")]
    pub gradle: Option<GradleConfig>,
    #[serde(default = "enabled")]
    pub gomod: Option<GomodConfig>,
    #[serde(default = "enabled")]
    pub pip: Option<PipConfig>,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            maven: enabled(),
            gradle: enabled(),
            gomod: enabled(),
            pip: enabled(),
        }
    }
}

/// Call graph sections; `None` skips the language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallgraphConfig {
    #[serde(default = "enabled")]
    pub java: Option<JavaConfig>,
    #[serde(default = "enabled")]
    pub golang: Option<GolangConfig>,
}

impl Default for CallgraphConfig {
    fn default() -> Self {
        Self {
            java: enabled(),
            golang: enabled(),
        }
    }
}
