//! File discovery for scan roots

use anyhow::{Context, Result};
use glob::Pattern;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Walks scan roots and returns the files that survive the exclusion globs
#[derive(Debug, Clone, Default)]
pub struct FileFinder {
    exclusions: Vec<Pattern>,
    inclusions: Vec<Pattern>,
}

impl FileFinder {
    /// Build a finder; inclusion globs win over exclusion globs
    pub fn new(exclusions: &[String], inclusions: &[String]) -> Result<Self> {
        Ok(Self {
            exclusions: compile(exclusions)?,
            inclusions: compile(inclusions)?,
        })
    }

    /// Recursively list every file under `roots`, sorted and de-duplicated
    ///
    /// Roots are canonicalized first, so every returned path is absolute and
    /// free of `..` and symlinked root components.
    pub fn find_files(&self, roots: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut files = BTreeSet::new();

        for root in roots {
            if !root.exists() {
                anyhow::bail!("Path does not exist: {}", root.display());
            }
            let root = std::fs::canonicalize(root)
                .with_context(|| format!("Failed to resolve {}", root.display()))?;

            for entry in WalkDir::new(&root).follow_links(false) {
                let entry =
                    entry.with_context(|| format!("Failed to walk {}", root.display()))?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let path = entry.into_path();
                if !self.is_excluded(&path) {
                    files.insert(path);
                }
            }
        }

        Ok(files.into_iter().collect())
    }

    /// Whether a path is filtered out of the scan
    pub fn is_excluded(&self, path: &Path) -> bool {
        let included = self.inclusions.iter().any(|p| p.matches_path(path));
        !included && self.exclusions.iter().any(|p| p.matches_path(path))
    }
}

fn compile(globs: &[String]) -> Result<Vec<Pattern>> {
    globs
        .iter()
        .map(|g| Pattern::new(g).with_context(|| format!("Invalid glob pattern: '{g}'")))
        .collect()
}

/// Directories holding compiled output among `files`.
///
/// A `.class` file belongs to its nearest ancestor named `classes`
/// (`target/classes`, `build/classes/java/main`...) or, failing that, to its
/// own directory. Jar directories are added when `find_jars` is set.
pub fn find_dependency_dirs(files: &[PathBuf], find_jars: bool) -> Vec<PathBuf> {
    let mut dirs = BTreeSet::new();

    for file in files {
        let Some(ext) = file.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        let Some(parent) = file.parent() else {
            continue;
        };

        match ext {
            "class" => {
                let class_root = parent
                    .ancestors()
                    .find(|dir| dir.file_name().is_some_and(|name| name == "classes"))
                    .unwrap_or(parent);
                dirs.insert(class_root.to_path_buf());
            }
            "jar" if find_jars => {
                dirs.insert(parent.to_path_buf());
            }
            _ => {}
        }
    }

    dirs.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "").unwrap();
        path
    }

    #[test]
    fn test_find_files_applies_exclusions() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "app/pom.xml");
        touch(temp_dir.path(), "node_modules/lib/pom.xml");

        let finder = FileFinder::new(&["**/node_modules/**".to_string()], &[]).unwrap();
        let files = finder.find_files(&[temp_dir.path().to_path_buf()]).unwrap();

        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("app/pom.xml"));
    }

    #[test]
    fn test_find_files_inclusion_overrides_exclusion() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "vendor/keep/go.mod");
        touch(temp_dir.path(), "vendor/drop/go.mod");

        let finder = FileFinder::new(
            &["**/vendor/**".to_string()],
            &["**/keep/**".to_string()],
        )
        .unwrap();
        let files = finder.find_files(&[temp_dir.path().to_path_buf()]).unwrap();

        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("keep/go.mod"));
    }

    #[test]
    fn test_find_files_deduplicates_overlapping_roots() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "a/b/go.mod");

        let finder = FileFinder::default();
        let roots = vec![temp_dir.path().to_path_buf(), temp_dir.path().join("a")];
        let files = finder.find_files(&roots).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_find_files_resolves_parent_components_in_roots() {
        let temp_dir = TempDir::new().unwrap();
        let base = fs::canonicalize(temp_dir.path()).unwrap();
        fs::create_dir_all(base.join("x")).unwrap();
        touch(&base, "root/build.gradle");

        let finder = FileFinder::default();
        let files = finder.find_files(&[base.join("x/../root")]).unwrap();
        assert_eq!(files, vec![base.join("root/build.gradle")]);
    }

    #[cfg(unix)]
    #[test]
    fn test_find_files_resolves_symlinked_root() {
        let temp_dir = TempDir::new().unwrap();
        let base = fs::canonicalize(temp_dir.path()).unwrap();
        touch(&base, "real/go.mod");
        std::os::unix::fs::symlink(base.join("real"), base.join("link")).unwrap();

        let finder = FileFinder::default();
        let files = finder.find_files(&[base.join("link")]).unwrap();
        assert_eq!(files, vec![base.join("real/go.mod")]);
    }

    #[test]
    fn test_find_files_missing_root_is_an_error() {
        let finder = FileFinder::default();
        let result = finder.find_files(&[PathBuf::from("/this/path/does/not/exist")]);
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_glob_is_rejected() {
        assert!(FileFinder::new(&["[".to_string()], &[]).is_err());
    }

    #[test]
    fn test_find_dependency_dirs() {
        let files = vec![
            PathBuf::from("/r/a/target/classes/com/acme/A.class"),
            PathBuf::from("/r/a/target/classes/com/acme/util/B.class"),
            PathBuf::from("/r/b/out/C.class"),
            PathBuf::from("/r/b/lib/dep.jar"),
            PathBuf::from("/r/b/pom.xml"),
        ];

        let dirs = find_dependency_dirs(&files, false);
        assert_eq!(
            dirs,
            vec![
                PathBuf::from("/r/a/target/classes"),
                PathBuf::from("/r/b/out"),
            ]
        );

        let dirs = find_dependency_dirs(&files, true);
        assert!(dirs.contains(&PathBuf::from("/r/b/lib")));
    }
}
