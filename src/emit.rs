//! INI output: render compiled documents into one merged file.
//!
//! Rendering is a pure function; [`write_output`] is the I/O wrapper that
//! creates parent directories and writes the result.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::error::WeaveError;
use crate::types::{Document, Value};

/// Render `documents` in the given order.
///
/// Unless `release` is set, each document is preceded by a
/// `; File: <name>` banner. List values become one `key[]=item` line per
/// item. A blank line follows every document.
pub fn render(documents: &[(String, Document)], release: bool) -> String {
    let mut out = String::new();
    for (name, document) in documents {
        if !release {
            let _ = writeln!(out, "; File: {name}");
        }
        render_document(&mut out, document);
        out.push('\n');
    }
    out
}

fn render_document(out: &mut String, document: &Document) {
    let mut first = true;
    for (name, section) in document {
        if !first {
            out.push('\n');
        }
        first = false;
        let _ = writeln!(out, "[{}]", escape(name));
        for (key, value) in section.iter() {
            match value {
                Value::Scalar(v) => {
                    let _ = writeln!(out, "{}={}", escape(key), escape(v));
                }
                Value::List(items) => {
                    for item in items {
                        let _ = writeln!(out, "{}[]={}", escape(key), escape(item));
                    }
                }
            }
        }
    }
}

/// JSON-quote strings the INI reader would otherwise misread.
fn escape(s: &str) -> String {
    let needs_quotes = s.contains(['=', ';', '\r', '\n'])
        || s.starts_with(['[', '"', '\'', '#'])
        || s.trim() != s;
    if needs_quotes {
        serde_json::to_string(s).unwrap_or_else(|_| s.to_string())
    } else {
        s.to_string()
    }
}

/// Write `content` to `path`, creating parent directories as needed.
pub fn write_output(path: &Path, content: &str) -> Result<(), WeaveError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| WeaveError::Io {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    fs::write(path, content).map_err(|e| WeaveError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{document, section};
    use crate::format::{Format, parse_document};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn sample() -> Vec<(String, Document)> {
        let mut tank = section(&[("Armor", "50")]);
        tank.push("Weapons", vec!["gun", "cannon"]);
        vec![
            (
                "base.ini".to_string(),
                document(&[("Unit", section(&[("Armor", "10")]))]),
            ),
            (
                "tank.ini".to_string(),
                document(&[("Tank", tank), ("Scout", section(&[("Speed", "9")]))]),
            ),
        ]
    }

    #[test]
    fn renders_banners_sections_and_lists() {
        let expected = "\
; File: base.ini
[Unit]
Armor=10

; File: tank.ini
[Tank]
Armor=50
Weapons[]=gun
Weapons[]=cannon

[Scout]
Speed=9

";
        assert_eq!(render(&sample(), false), expected);
    }

    #[test]
    fn release_omits_banners() {
        let out = render(&sample(), true);
        assert!(!out.contains("; File:"));
        assert!(out.starts_with("[Unit]\nArmor=10\n\n[Tank]"));
    }

    #[test]
    fn empty_input_renders_nothing() {
        assert_eq!(render(&[], false), "");
    }

    #[test]
    fn awkward_strings_are_quoted() {
        assert_eq!(escape("plain value"), "plain value");
        assert_eq!(escape("a=b"), "\"a=b\"");
        assert_eq!(escape(" padded"), "\" padded\"");
        assert_eq!(escape("line\nbreak"), "\"line\\nbreak\"");
        assert_eq!(escape("[x]"), "\"[x]\"");
        assert_eq!(escape("; not a comment"), "\"; not a comment\"");
    }

    #[test]
    fn rendered_output_reads_back() {
        let mut odd = section(&[("a=b", " spaced "), ("semi", "x ; y")]);
        odd.push("list", vec!["1", "two=2"]);
        let docs = vec![("odd.ini".to_string(), document(&[("S", odd.clone())]))];

        let text = render(&docs, true);
        let parsed = parse_document(&text, Format::Ini, Path::new("out.ini")).unwrap();
        assert_eq!(parsed["S"], odd);
    }

    #[test]
    fn write_output_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("build/out/merged.ini");
        write_output(&path, "[S]\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "[S]\n");
    }
}
