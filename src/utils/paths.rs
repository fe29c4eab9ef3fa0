//! Path association helpers
//!
//! All matching here is component-wise: `a/bc` is never treated as being
//! inside `a/b`, however much of the raw string the two share.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathMatchError {
    #[error("no part of the path matches: {0}")]
    NoMatch(PathBuf),
}

/// Pick the candidate directory that is the deepest true ancestor of `file`.
pub fn longest_prefix_match<'a, I>(file: &Path, dirs: I) -> Result<&'a Path, PathMatchError>
where
    I: IntoIterator<Item = &'a PathBuf>,
{
    dirs.into_iter()
        .map(PathBuf::as_path)
        .filter(|dir| file.starts_with(dir))
        .max_by_key(|dir| dir.components().count())
        .ok_or_else(|| PathMatchError::NoMatch(file.to_path_buf()))
}

/// Deepest directory shared by every path, or an empty path if there is none.
///
/// The last component of each path is its file name and never part of the result.
pub fn greatest_common_dir(paths: &[PathBuf]) -> PathBuf {
    let mut dirs = paths.iter().map(|p| {
        p.parent()
            .map(|parent| parent.components().collect::<Vec<Component<'_>>>())
            .unwrap_or_default()
    });

    let Some(mut common) = dirs.next() else {
        return PathBuf::new();
    };

    for dir in dirs {
        let shared = common
            .iter()
            .zip(dir.iter())
            .take_while(|(a, b)| a == b)
            .count();
        common.truncate(shared);
    }

    common.iter().collect()
}

/// Group every file under the deepest directory containing it.
///
/// Files without any matching directory are dropped.
pub fn group_files_by_dirs(dirs: &[PathBuf], files: &[PathBuf]) -> BTreeMap<PathBuf, Vec<PathBuf>> {
    let mut groups: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();

    for file in files {
        if let Ok(dir) = longest_prefix_match(file, dirs) {
            groups.entry(dir.to_path_buf()).or_default().push(file.clone());
        }
    }

    groups
}

/// Resolve `.` and `..` lexically, without touching the file system
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Canonical form of `path`
///
/// Paths that do not exist are made absolute against the current directory
/// and normalized lexically instead.
pub fn canonical(path: &Path) -> PathBuf {
    if let Ok(resolved) = std::fs::canonicalize(path) {
        return resolved;
    }
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };
    normalize(&absolute)
}
