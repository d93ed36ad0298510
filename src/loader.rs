//! Document and macro discovery on disk.
//!
//! Walks a root directory, skipping every file or directory whose name starts
//! with `@`, and parses each supported file into a [`Document`] named by its
//! `/`-separated path relative to the root.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::WeaveError;
use crate::format::{self, Format};
use crate::macros::MacroStore;
use crate::pipeline::FailurePolicy;
use crate::types::{DocumentMap, normalize_name};

/// Prefix marking files and directories that are never compiled as documents.
pub const PRIVATE_PREFIX: char = '@';

/// Find every supported document under `root`.
///
/// Returns `(name, path)` pairs sorted by name. Files with an unknown
/// extension are skipped with a warning.
pub fn discover(root: &Path) -> Result<Vec<(String, PathBuf)>, WeaveError> {
    let walker = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| !is_private(e));

    let mut found = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| WeaveError::Walk {
            path: root.to_path_buf(),
            source: e,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if Format::from_path(path).is_none() {
            warn!(path = %path.display(), "skipping file with unsupported extension");
            continue;
        }
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        let name = document_name(relative);
        debug!(document = %name, "discovered document");
        found.push((name, path.to_path_buf()));
    }

    found.sort();
    Ok(found)
}

/// Parse every document under `root`.
///
/// A file that fails to parse aborts the load, or is logged and left out
/// under [`FailurePolicy::Skip`].
pub fn load_documents(root: &Path, policy: FailurePolicy) -> Result<DocumentMap, WeaveError> {
    let mut documents = DocumentMap::new();
    for (name, path) in discover(root)? {
        match format::read_document(&path) {
            Ok(document) => {
                documents.insert(name, document);
            }
            Err(e) if policy == FailurePolicy::Skip => {
                warn!(document = %name, error = %e, "skipping unreadable document");
            }
            Err(e) => return Err(e),
        }
    }
    info!(root = %root.display(), count = documents.len(), "loaded documents");
    Ok(documents)
}

/// Load and validate every macro file under `root`.
///
/// Templates are registered under the file's relative path without its
/// extension. Any malformed template aborts the load.
pub fn load_macros(root: &Path) -> Result<MacroStore, WeaveError> {
    let mut macros = MacroStore::new();
    for (name, path) in discover(root)? {
        let document = format::read_document(&path)?;
        macros.register_file(macro_stem(&name), document)?;
    }
    info!(root = %root.display(), count = macros.len(), "loaded macros");
    Ok(macros)
}

fn is_private(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_string_lossy()
            .starts_with(PRIVATE_PREFIX)
}

/// `/`-separated, normalized name for a path relative to the root.
pub fn document_name(relative: &Path) -> String {
    let joined: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    normalize_name(&joined.join("/"))
}

/// A document name without its final extension.
fn macro_stem(name: &str) -> &str {
    let file_start = name.rfind('/').map_or(0, |i| i + 1);
    match name[file_start..].rfind('.') {
        Some(dot) if dot > 0 => &name[..file_start + dot],
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn discovers_sorted_names_and_skips_private() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "units/tank.ini", "[Tank]\n");
        write(temp.path(), "base.yaml", "Unit:\n  A: 1\n");
        write(temp.path(), "@macros/voice.ini", "[V]\n");
        write(temp.path(), "units/@draft.ini", "[D]\n");
        write(temp.path(), "notes.txt", "ignored");

        let found = discover(temp.path()).unwrap();
        let names: Vec<&str> = found.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["base.yaml", "units/tank.ini"]);
    }

    #[test]
    fn missing_root_is_walk_error() {
        let temp = TempDir::new().unwrap();
        let err = discover(&temp.path().join("nope")).unwrap_err();
        assert!(matches!(err, WeaveError::Walk { .. }));
    }

    #[test]
    fn load_documents_parses_each_file() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "a.ini", "[S]\nK=1\n");
        write(temp.path(), "sub/b.toml", "[T]\nK = 2\n");

        let docs = load_documents(temp.path(), FailurePolicy::Abort).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs["sub/b.toml"]["T"].get("K"), Some(&Value::from("2")));
    }

    #[test]
    fn load_documents_policy_on_parse_failure() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "good.ini", "[S]\nK=1\n");
        write(temp.path(), "bad.toml", "[broken");

        let err = load_documents(temp.path(), FailurePolicy::Abort).unwrap_err();
        assert!(matches!(err, WeaveError::Parse { .. }));

        let docs = load_documents(temp.path(), FailurePolicy::Skip).unwrap();
        assert_eq!(docs.keys().collect::<Vec<_>>(), vec!["good.ini"]);
    }

    #[test]
    fn load_macros_registers_stems() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "units/Voice.ini", "[Default]\nLine=${0}\n");
        write(temp.path(), "armor.yaml", "Light:\n  Armor: 10\nHeavy:\n  Armor: 50\n");

        let macros = load_macros(temp.path()).unwrap();
        assert_eq!(
            macros.names(),
            vec!["armor:Heavy", "armor:Light", "units/Voice", "units/Voice:Default"]
        );
    }

    #[test]
    fn load_macros_rejects_malformed_template() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "bad.ini", "[B]\nK=${1}\n");
        let err = load_macros(temp.path()).unwrap_err();
        assert!(matches!(err, WeaveError::MalformedMacro { .. }));
    }

    #[test]
    fn stems() {
        assert_eq!(macro_stem("units/Voice.ini"), "units/Voice");
        assert_eq!(macro_stem("a.b/c.yaml"), "a.b/c");
        assert_eq!(macro_stem("plain"), "plain");
        assert_eq!(macro_stem("dir/.hidden"), "dir/.hidden");
    }

    #[test]
    fn document_names_use_forward_slashes() {
        assert_eq!(document_name(Path::new("units/tank.ini")), "units/tank.ini");
        assert_eq!(document_name(Path::new("./units/tank.ini")), "units/tank.ini");
    }
}
