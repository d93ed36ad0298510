//! Compare the values of one section across two documents.
//!
//! Used to check a registry or list section against another build: `more`
//! holds values only the first document has, `less` values only the second
//! has. Keys are ignored.

use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::error::WeaveError;
use crate::format;
use crate::types::{Document, Value};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionDiff {
    pub section: String,
    /// Values present in `from` but not in `to`.
    pub more: Vec<Value>,
    /// Values present in `to` but not in `from`.
    pub less: Vec<Value>,
}

impl SectionDiff {
    pub fn is_empty(&self) -> bool {
        self.more.is_empty() && self.less.is_empty()
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

impl fmt::Display for SectionDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "[{}] values are identical", self.section);
        }
        write!(
            f,
            "[{}] {} more, {} less",
            self.section,
            self.more.len(),
            self.less.len()
        )?;
        for value in &self.more {
            write!(f, "\n+ {value}")?;
        }
        for value in &self.less {
            write!(f, "\n- {value}")?;
        }
        Ok(())
    }
}

/// Diff the values of `section` in two parsed documents.
///
/// `from_name` and `to_name` only label a missing-section error.
pub fn diff_sections(
    from: &Document,
    from_name: &str,
    to: &Document,
    to_name: &str,
    section: &str,
) -> Result<SectionDiff, WeaveError> {
    let lookup = |doc: &Document, name: &str| {
        doc.get(section)
            .map(|s| s.iter().map(|(_, v)| v.clone()).collect::<Vec<Value>>())
            .ok_or_else(|| WeaveError::UnknownSection {
                document: name.to_string(),
                section: section.to_string(),
            })
    };
    let from_values = lookup(from, from_name)?;
    let to_values = lookup(to, to_name)?;

    let more = from_values
        .iter()
        .filter(|v| !to_values.contains(*v))
        .cloned()
        .collect();
    let less = to_values
        .iter()
        .filter(|v| !from_values.contains(*v))
        .cloned()
        .collect();

    Ok(SectionDiff {
        section: section.to_string(),
        more,
        less,
    })
}

/// Read two documents from disk and diff one section.
pub fn diff_files(from: &Path, to: &Path, section: &str) -> Result<SectionDiff, WeaveError> {
    let from_doc = format::read_document(from)?;
    let to_doc = format::read_document(to)?;
    diff_sections(
        &from_doc,
        &from.display().to_string(),
        &to_doc,
        &to.display().to_string(),
        section,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{document, section};
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn registry(entries: &[(&str, &str)]) -> Document {
        document(&[("Units", section(entries))])
    }

    #[test]
    fn reports_values_on_each_side() {
        let from = registry(&[("1", "Tank"), ("2", "Scout"), ("3", "Boat")]);
        let to = registry(&[("1", "Tank"), ("2", "Plane")]);
        let diff = diff_sections(&from, "new.ini", &to, "old.ini", "Units").unwrap();
        assert_eq!(diff.more, vec![Value::from("Scout"), Value::from("Boat")]);
        assert_eq!(diff.less, vec![Value::from("Plane")]);
    }

    #[test]
    fn keys_are_ignored() {
        let from = registry(&[("1", "Tank"), ("2", "Scout")]);
        let to = registry(&[("7", "Scout"), ("9", "Tank")]);
        let diff = diff_sections(&from, "a", &to, "b", "Units").unwrap();
        assert!(diff.is_empty());
        assert_eq!(diff.to_string(), "[Units] values are identical");
    }

    #[test]
    fn missing_section_names_document() {
        let from = registry(&[]);
        let to = document(&[("Other", section(&[]))]);
        let err = diff_sections(&from, "a.ini", &to, "b.ini", "Units").unwrap_err();
        match err {
            WeaveError::UnknownSection { document, section } => {
                assert_eq!(document, "b.ini");
                assert_eq!(section, "Units");
            }
            other => panic!("Expected UnknownSection, got: {other:?}"),
        }
    }

    #[test]
    fn display_lists_changes() {
        let from = registry(&[("1", "Tank"), ("2", "Scout")]);
        let to = registry(&[("1", "Tank"), ("2", "Plane")]);
        let diff = diff_sections(&from, "a", &to, "b", "Units").unwrap();
        assert_eq!(diff.to_string(), "[Units] 1 more, 1 less\n+ Scout\n- Plane");
    }

    #[test]
    fn json_output() {
        let from = registry(&[("1", "Tank")]);
        let to = registry(&[]);
        let diff = diff_sections(&from, "a", &to, "b", "Units").unwrap();
        let json: serde_json::Value = serde_json::from_str(&diff.to_json()).unwrap();
        assert_eq!(json["section"], "Units");
        assert_eq!(json["more"][0], "Tank");
        assert_eq!(json["less"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn diff_files_reads_both_formats() {
        let temp = TempDir::new().unwrap();
        let from = temp.path().join("new.ini");
        let to = temp.path().join("old.yaml");
        fs::write(&from, "[Units]\n1=Tank\n2=Scout\n").unwrap();
        fs::write(&to, "Units:\n  1: Tank\n").unwrap();

        let diff = diff_files(&from, &to, "Units").unwrap();
        assert_eq!(diff.more, vec![Value::from("Scout")]);
        assert!(diff.less.is_empty());
    }
}
