//! Grouping of discovered files by package-manager ecosystem

use crate::constants::lock;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static PIP_MANIFEST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^requirements.*\.txt$").expect("pip manifest pattern is valid")
});

/// Package-manager ecosystems, in classification order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ecosystem {
    Maven,
    Gradle,
    Gomod,
    Pip,
}

impl Ecosystem {
    pub const ALL: [Ecosystem; 4] = [
        Ecosystem::Maven,
        Ecosystem::Gradle,
        Ecosystem::Gomod,
        Ecosystem::Pip,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Ecosystem::Maven => "maven",
            Ecosystem::Gradle => "gradle",
            Ecosystem::Gomod => "gomod",
            Ecosystem::Pip => "pip",
        }
    }

    /// Whether a file base name is a manifest of this ecosystem
    pub fn matches(&self, file_name: &str) -> bool {
        match self {
            Ecosystem::Maven => file_name == "pom.xml",
            Ecosystem::Gradle => file_name == "build.gradle" || file_name == "build.gradle.kts",
            Ecosystem::Gomod => file_name == "go.mod",
            Ecosystem::Pip => PIP_MANIFEST.is_match(file_name),
        }
    }

    /// Lock file written for `manifest` by this ecosystem's resolution job
    pub fn lock_file(&self, manifest: &Path) -> PathBuf {
        let dir = manifest.parent().unwrap_or_else(|| Path::new(""));
        match self {
            Ecosystem::Maven => dir.join(lock::MAVEN),
            Ecosystem::Gradle => dir.join(lock::GRADLE),
            Ecosystem::Gomod => dir.join(lock::GOMOD),
            Ecosystem::Pip => crate::resolution::pip::lock_file_for(manifest),
        }
    }

    /// First ecosystem claiming the file, if any
    pub fn classify(path: &Path) -> Option<Ecosystem> {
        let file_name = path.file_name()?.to_str()?;
        Ecosystem::ALL.into_iter().find(|e| e.matches(file_name))
    }
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A manifest path tagged with its ecosystem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestFile {
    path: PathBuf,
    ecosystem: Ecosystem,
}

impl ManifestFile {
    pub fn classify(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let ecosystem = Ecosystem::classify(&path)?;
        Some(Self { path, ecosystem })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn ecosystem(&self) -> Ecosystem {
        self.ecosystem
    }
}

/// The unique manifests of one ecosystem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    ecosystem: Ecosystem,
    files: BTreeSet<PathBuf>,
}

impl Batch {
    pub fn new(ecosystem: Ecosystem) -> Self {
        Self {
            ecosystem,
            files: BTreeSet::new(),
        }
    }

    pub fn ecosystem(&self) -> Ecosystem {
        self.ecosystem
    }

    pub fn add(&mut self, file: impl Into<PathBuf>) {
        self.files.insert(file.into());
    }

    pub fn files(&self) -> Vec<PathBuf> {
        self.files.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Split `files` into one batch per ecosystem that matched at least one file
pub fn make_batches(files: &[PathBuf]) -> Vec<Batch> {
    let mut batches: BTreeMap<Ecosystem, Batch> = BTreeMap::new();

    for manifest in files.iter().cloned().filter_map(ManifestFile::classify) {
        batches
            .entry(manifest.ecosystem())
            .or_insert_with(|| Batch::new(manifest.ecosystem()))
            .add(manifest.path);
    }

    batches.into_values().collect()
}
