//! Document formats: INI, YAML and TOML.
//!
//! Every format parses into the same [`Document`] shape. Nested structure
//! below the section level is rejected, except for lists of scalars.

use std::fmt;
use std::fs;
use std::path::Path;

use tracing::warn;

use crate::error::WeaveError;
use crate::types::{Document, Section, Value};

/// A supported document format, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ini,
    Yaml,
    Toml,
}

impl Format {
    /// Detect the format from the extension of `path` (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Format> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "ini" => Some(Format::Ini),
            "yaml" | "yml" => Some(Format::Yaml),
            "toml" => Some(Format::Toml),
            _ => None,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Ini => write!(f, "ini"),
            Format::Yaml => write!(f, "yaml"),
            Format::Toml => write!(f, "toml"),
        }
    }
}

/// Read and parse the document at `path`.
pub fn read_document(path: &Path) -> Result<Document, WeaveError> {
    let format = Format::from_path(path).ok_or_else(|| WeaveError::UnsupportedFormat {
        path: path.to_path_buf(),
    })?;
    let content = fs::read_to_string(path).map_err(|e| WeaveError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_document(&content, format, path)
}

/// Parse `content` as `format`. `path` is only used for diagnostics.
pub fn parse_document(content: &str, format: Format, path: &Path) -> Result<Document, WeaveError> {
    let parsed = match format {
        Format::Ini => Ok(parse_ini(content, path)),
        Format::Yaml => parse_yaml(content),
        Format::Toml => parse_toml(content, path),
    };
    parsed.map_err(|reason| WeaveError::Parse {
        path: path.to_path_buf(),
        reason,
    })
}

// -- INI ---------------------------------------------------------------------

fn parse_ini(content: &str, path: &Path) -> Document {
    let mut document = Document::new();
    let mut current: Option<String> = None;

    for (index, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }

        if let Some(header) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            let name = unquote(header.trim());
            document.entry(name.clone()).or_default();
            current = Some(name);
            continue;
        }

        let Some(name) = &current else {
            warn!(path = %path.display(), line = index + 1, "ignoring entry outside any section");
            continue;
        };
        let section = document.entry(name.clone()).or_default();

        let (key, value) = match split_key_value(line) {
            Some((key, value)) => (key, unquote(strip_inline_comment(value))),
            None => (line, "true".to_string()),
        };
        match key.strip_suffix("[]") {
            Some(list_key) => section.push_list_item(&unquote(list_key.trim()), value),
            None => section.push(unquote(key), value),
        }
    }
    document
}

/// Split on the first `=` outside a quoted key.
fn split_key_value(line: &str) -> Option<(&str, &str)> {
    let split_at = if line.starts_with('"') {
        let close = closing_quote(line)?;
        close + line[close..].find('=')?
    } else {
        line.find('=')?
    };
    Some((line[..split_at].trim(), line[split_at + 1..].trim()))
}

/// Byte offset just past the closing quote of a quoted string at the start
/// of `s`, honoring backslash escapes.
fn closing_quote(s: &str) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in s.char_indices().skip(1) {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => return Some(i + 1),
            _ => {}
        }
    }
    None
}

/// Drop a trailing ` ; comment` from an unquoted value.
fn strip_inline_comment(value: &str) -> &str {
    if value.starts_with('"') {
        return value;
    }
    let bytes = value.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b == b';' && i > 0 && bytes[i - 1].is_ascii_whitespace() {
            return value[..i].trim_end();
        }
    }
    value
}

/// Remove surrounding quotes. Double-quoted strings are decoded as JSON
/// strings so escapes written by the emitter round-trip.
fn unquote(s: &str) -> String {
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        return serde_json::from_str::<String>(s).unwrap_or_else(|_| s[1..s.len() - 1].to_string());
    }
    if s.len() >= 2 && s.starts_with('\'') && s.ends_with('\'') {
        return s[1..s.len() - 1].to_string();
    }
    s.to_string()
}

// -- YAML --------------------------------------------------------------------

fn parse_yaml(content: &str) -> Result<Document, String> {
    let root: serde_yaml::Value = serde_yaml::from_str(content).map_err(|e| e.to_string())?;
    let mapping = match root {
        serde_yaml::Value::Null => return Ok(Document::new()),
        serde_yaml::Value::Mapping(m) => m,
        _ => return Err("expected a mapping of sections at the top level".into()),
    };

    let mut document = Document::new();
    for (name, body) in mapping {
        let name = yaml_scalar(&name).ok_or("section names must be scalars")?;
        let section = match body {
            serde_yaml::Value::Null => Section::new(),
            serde_yaml::Value::Mapping(entries) => {
                let mut section = Section::new();
                for (key, value) in entries {
                    let key = yaml_scalar(&key)
                        .ok_or_else(|| format!("non-scalar key in section '{name}'"))?;
                    let value = yaml_value(&value)
                        .ok_or_else(|| format!("nested value for '{key}' in section '{name}'"))?;
                    section.push(key, value);
                }
                section
            }
            _ => return Err(format!("section '{name}' must be a mapping")),
        };
        document.insert(name, section);
    }
    Ok(document)
}

fn yaml_scalar(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::Null => Some(String::new()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

fn yaml_value(value: &serde_yaml::Value) -> Option<Value> {
    match value {
        serde_yaml::Value::Sequence(items) => items
            .iter()
            .map(yaml_scalar)
            .collect::<Option<Vec<_>>>()
            .map(Value::List),
        other => yaml_scalar(other).map(Value::Scalar),
    }
}

// -- TOML --------------------------------------------------------------------

fn parse_toml(content: &str, path: &Path) -> Result<Document, String> {
    let table: toml::Table = toml::from_str(content).map_err(|e| e.to_string())?;

    let mut document = Document::new();
    for (name, body) in table {
        let toml::Value::Table(entries) = body else {
            warn!(path = %path.display(), key = %name, "ignoring top-level key outside any table");
            continue;
        };
        let mut section = Section::new();
        for (key, value) in entries {
            let value = toml_value(&value)
                .ok_or_else(|| format!("nested value for '{key}' in table '{name}'"))?;
            section.push(key, value);
        }
        document.insert(name, section);
    }
    Ok(document)
}

fn toml_scalar(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(s) => Some(s.clone()),
        toml::Value::Integer(i) => Some(i.to_string()),
        toml::Value::Float(f) => Some(f.to_string()),
        toml::Value::Boolean(b) => Some(b.to_string()),
        toml::Value::Datetime(d) => Some(d.to_string()),
        toml::Value::Array(_) | toml::Value::Table(_) => None,
    }
}

fn toml_value(value: &toml::Value) -> Option<Value> {
    match value {
        toml::Value::Array(items) => items
            .iter()
            .map(toml_scalar)
            .collect::<Option<Vec<_>>>()
            .map(Value::List),
        other => toml_scalar(other).map(Value::Scalar),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::section;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn ini(content: &str) -> Document {
        parse_document(content, Format::Ini, Path::new("test.ini")).unwrap()
    }

    #[test]
    fn detects_formats() {
        assert_eq!(Format::from_path(Path::new("a/b.ini")), Some(Format::Ini));
        assert_eq!(Format::from_path(Path::new("b.YML")), Some(Format::Yaml));
        assert_eq!(Format::from_path(Path::new("b.yaml")), Some(Format::Yaml));
        assert_eq!(Format::from_path(Path::new("b.toml")), Some(Format::Toml));
        assert_eq!(Format::from_path(Path::new("b.txt")), None);
        assert_eq!(Format::from_path(Path::new("noext")), None);
    }

    #[test]
    fn ini_sections_and_entries() {
        let doc = ini("; header\n[Tank]\nArmor = 50\n# note\nSpeed=5\n\n[Scout]\nSpeed=9\n");
        let names: Vec<&str> = doc.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["Tank", "Scout"]);
        assert_eq!(doc["Tank"], section(&[("Armor", "50"), ("Speed", "5")]));
    }

    #[test]
    fn ini_keeps_directives_and_duplicates_in_order() {
        let doc = ini("[S]\nK=1\n@Inherits=base.ini:Unit\nK=2\n");
        assert_eq!(
            doc["S"],
            section(&[("K", "1"), ("@Inherits", "base.ini:Unit"), ("K", "2")])
        );
    }

    #[test]
    fn ini_list_entries() {
        let doc = ini("[S]\n@units/Voice[]=hello\n@units/Voice[]=bye\n");
        assert_eq!(
            doc["S"].get("@units/Voice"),
            Some(&Value::from(vec!["hello", "bye"]))
        );
        assert_eq!(doc["S"].len(), 1);
    }

    #[test]
    fn ini_repeated_header_merges() {
        let doc = ini("[S]\nA=1\n[T]\nB=2\n[S]\nC=3\n");
        assert_eq!(doc.len(), 2);
        assert_eq!(doc["S"], section(&[("A", "1"), ("C", "3")]));
    }

    #[test]
    fn ini_values_are_unquoted_and_comments_stripped() {
        let doc = ini("[S]\nA=\"quoted ; kept\"\nB=plain ; dropped\nC=a;b\nD='single'\n");
        assert_eq!(
            doc["S"],
            section(&[("A", "quoted ; kept"), ("B", "plain"), ("C", "a;b"), ("D", "single")])
        );
    }

    #[test]
    fn ini_quoted_key_with_equals() {
        let doc = ini("[S]\n\"a=b\"=c\n");
        assert_eq!(doc["S"], section(&[("a=b", "c")]));
    }

    #[test]
    fn ini_bare_key_is_true() {
        let doc = ini("[S]\nEnabled\n");
        assert_eq!(doc["S"], section(&[("Enabled", "true")]));
    }

    #[test]
    fn ini_entries_before_header_are_ignored() {
        let doc = ini("orphan=1\n[S]\nA=1\n");
        assert_eq!(doc.len(), 1);
        assert_eq!(doc["S"], section(&[("A", "1")]));
    }

    #[test]
    fn ini_empty_section_is_kept() {
        let doc = ini("[Empty]\n[S]\nA=1\n");
        assert!(doc["Empty"].is_empty());
    }

    #[test]
    fn yaml_mapping_of_mappings() {
        let yaml = "Tank:\n  Armor: 50\n  Fast: true\n  Voices: [a, b]\n  Blank:\nEmpty:\n";
        let doc = parse_document(yaml, Format::Yaml, Path::new("t.yaml")).unwrap();
        let mut expected = section(&[("Armor", "50"), ("Fast", "true")]);
        expected.push("Voices", vec!["a", "b"]);
        expected.push("Blank", "");
        assert_eq!(doc["Tank"], expected);
        assert!(doc["Empty"].is_empty());
    }

    #[test]
    fn yaml_empty_file_is_empty_document() {
        let doc = parse_document("", Format::Yaml, Path::new("t.yaml")).unwrap();
        assert!(doc.is_empty());
    }

    #[test]
    fn yaml_nested_mapping_is_rejected() {
        let err =
            parse_document("S:\n  K:\n    x: 1\n", Format::Yaml, Path::new("t.yaml")).unwrap_err();
        match err {
            WeaveError::Parse { path, reason } => {
                assert_eq!(path, PathBuf::from("t.yaml"));
                assert!(reason.contains("'K'"), "{reason}");
            }
            other => panic!("Expected Parse, got: {other:?}"),
        }
    }

    #[test]
    fn yaml_top_level_scalar_is_rejected() {
        let err = parse_document("just text", Format::Yaml, Path::new("t.yaml")).unwrap_err();
        assert!(matches!(err, WeaveError::Parse { .. }));
    }

    #[test]
    fn toml_tables_become_sections() {
        let toml = "loose = 1\n[Tank]\nArmor = 50\nRatio = 0.5\nTags = [\"a\", \"b\"]\n";
        let doc = parse_document(toml, Format::Toml, Path::new("t.toml")).unwrap();
        assert_eq!(doc.len(), 1);
        let mut expected = section(&[("Armor", "50"), ("Ratio", "0.5")]);
        expected.push("Tags", vec!["a", "b"]);
        assert_eq!(doc["Tank"], expected);
    }

    #[test]
    fn toml_syntax_error() {
        let err = parse_document("[broken", Format::Toml, Path::new("t.toml")).unwrap_err();
        assert!(matches!(err, WeaveError::Parse { .. }));
    }

    #[test]
    fn read_document_from_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("unit.ini");
        fs::write(&path, "[U]\nA=1\n").unwrap();
        let doc = read_document(&path).unwrap();
        assert_eq!(doc["U"], section(&[("A", "1")]));
    }

    #[test]
    fn read_document_errors() {
        let dir = TempDir::new().unwrap();
        let err = read_document(&dir.path().join("missing.ini")).unwrap_err();
        assert!(matches!(err, WeaveError::Io { .. }));

        let txt = dir.path().join("notes.txt");
        fs::write(&txt, "hello").unwrap();
        let err = read_document(&txt).unwrap_err();
        assert!(matches!(err, WeaveError::UnsupportedFormat { .. }));
    }
}
