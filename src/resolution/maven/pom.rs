//! Lightweight `pom.xml` reading: module lists, root detection and
//! association of compiled class directories with their root

use crate::utils::{group_files_by_dirs, normalize};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PomError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },
}

/// `<module>` entries of a POM document, in document order
pub fn parse_modules(content: &str) -> Result<Vec<String>, String> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut stack: Vec<String> = Vec::new();
    let mut modules = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                stack.push(String::from_utf8_lossy(e.name().as_ref()).to_string());
            }
            Ok(Event::End(_)) => {
                stack.pop();
            }
            Ok(Event::Text(t)) => {
                let in_module = stack.len() >= 2
                    && stack[stack.len() - 1] == "module"
                    && stack[stack.len() - 2] == "modules";
                if in_module {
                    let text = reader
                        .decoder()
                        .decode(t.as_ref())
                        .map_err(|e| e.to_string())?
                        .trim()
                        .to_string();
                    if !text.is_empty() {
                        modules.push(text);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(format!(
                    "error at position {}: {}",
                    reader.buffer_position(),
                    e
                ));
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(modules)
}

pub fn read_modules(pom: &Path) -> Result<Vec<String>, PomError> {
    let content = std::fs::read_to_string(pom).map_err(|source| PomError::Read {
        path: pom.to_path_buf(),
        source,
    })?;
    parse_modules(&content).map_err(|message| PomError::Parse {
        path: pom.to_path_buf(),
        message,
    })
}

/// Path of the POM a `<module>` entry refers to
///
/// Entries name a directory holding `pom.xml`, or a POM file directly.
pub fn module_pom(pom: &Path, module: &str) -> PathBuf {
    let base = pom.parent().unwrap_or_else(|| Path::new(""));
    let target = base.join(module);
    let target = if module.ends_with(".xml") {
        target
    } else {
        target.join("pom.xml")
    };
    normalize(&target)
}

/// POMs that are not listed as a module of another POM in `poms`
pub fn find_maven_roots(poms: &[PathBuf]) -> Result<Vec<PathBuf>, PomError> {
    let mut children: BTreeMap<PathBuf, PathBuf> = BTreeMap::new();

    for pom in poms {
        for module in read_modules(pom)? {
            let child = module_pom(pom, &module);
            children.entry(child).or_insert_with(|| normalize(pom));
        }
    }

    let roots: BTreeSet<PathBuf> = poms
        .iter()
        .filter(|pom| !children.contains_key(&normalize(pom)))
        .cloned()
        .collect();

    Ok(roots.into_iter().collect())
}

/// Map each root POM to the class directories located under it
///
/// A class directory belongs to the root whose directory is its deepest
/// ancestor. Roots without classes map to an empty list; class directories
/// under no root are dropped.
pub fn map_roots_to_class_dirs(
    roots: &[PathBuf],
    class_dirs: &[PathBuf],
) -> BTreeMap<PathBuf, Vec<PathBuf>> {
    let root_dirs: Vec<PathBuf> = roots
        .iter()
        .map(|root| root.parent().map(Path::to_path_buf).unwrap_or_default())
        .collect();
    let grouped = group_files_by_dirs(&root_dirs, class_dirs);

    roots
        .iter()
        .zip(root_dirs.iter())
        .map(|(root, dir)| (root.clone(), grouped.get(dir).cloned().unwrap_or_default()))
        .collect()
}
