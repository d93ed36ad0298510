//! Strict-mode validation: detect unknown keys in build configuration files.
//!
//! Uses `serde_ignored` to deserialize into `C::Layer` (all-optional fields) and
//! capture any keys that the layer doesn't consume. Works for both TOML and
//! YAML files and reports each unknown key with its file path and best-effort
//! line number.

use std::path::Path;

use confique::Config;
use serde::{Deserialize, Deserializer};

use crate::error::WeaveError;

/// Validate that a config file contains no keys unknown to config type `C`.
///
/// The format follows the file extension: `.yaml`/`.yml` are read as YAML,
/// everything else as TOML.
pub fn validate_unknown_keys<C: Config>(content: &str, path: &Path) -> Result<(), WeaveError>
where
    C::Layer: for<'de> Deserialize<'de>,
{
    if content.trim().is_empty() {
        return Ok(());
    }

    let yaml = is_yaml(path);
    let parse_error = |reason: String| WeaveError::Parse {
        path: path.to_path_buf(),
        reason,
    };
    let unknown_keys = if yaml {
        ignored_keys::<C::Layer, _>(serde_yaml::Deserializer::from_str(content))
            .map_err(|e| parse_error(e.to_string()))?
    } else {
        ignored_keys::<C::Layer, _>(toml::Deserializer::new(content))
            .map_err(|e| parse_error(e.to_string()))?
    };

    if unknown_keys.is_empty() {
        return Ok(());
    }

    let errors: Vec<WeaveError> = unknown_keys
        .into_iter()
        .map(|key| {
            let line = if yaml {
                find_yaml_key_line(content, &key)
            } else {
                find_toml_key_line(content, &key)
            };
            WeaveError::UnknownConfigKey {
                key,
                path: path.to_path_buf(),
                line,
            }
        })
        .collect();

    Err(WeaveError::UnknownConfigKeys(errors))
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
}

/// Deserialize `L` and collect the paths of every key it ignored.
fn ignored_keys<'de, L, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    L: Deserialize<'de>,
    D: Deserializer<'de>,
{
    let mut unknown_keys = Vec::new();
    let _layer: L = serde_ignored::deserialize(deserializer, |ignored_path| {
        unknown_keys.push(key_path(&ignored_path.to_string()));
    })?;
    Ok(unknown_keys)
}

/// Marker `serde_ignored` inserts for the `Some` of an `Option` field.
const OPTION_SEGMENT: &str = "?";

/// A `serde_ignored` path as a dotted key, without `Option` markers.
fn key_path(ignored: &str) -> String {
    ignored
        .split('.')
        .filter(|s| *s != OPTION_SEGMENT)
        .collect::<Vec<_>>()
        .join(".")
}

/// Dotted-key segments naming tables, with sequence indices and `Option`
/// markers dropped.
fn table_segments(segments: &[&str]) -> Vec<String> {
    segments
        .iter()
        .filter(|s| **s != OPTION_SEGMENT && s.parse::<usize>().is_err())
        .map(|s| s.to_string())
        .collect()
}

/// Find the 1-indexed line number for a key in TOML content.
///
/// Tracks `[table]` and `[[array]]` headers while scanning and only matches
/// the leaf key inside the expected table. Returns 0 if the key cannot be
/// located.
fn find_toml_key_line(content: &str, dotted_key: &str) -> usize {
    let segments: Vec<&str> = dotted_key.split('.').collect();
    let leaf = segments.last().unwrap_or(&dotted_key);
    let expected_section = table_segments(&segments[..segments.len() - 1]);

    let mut current_section: Vec<String> = Vec::new();

    for (i, line) in content.lines().enumerate() {
        let trimmed = line.trim();

        if trimmed.starts_with('[') {
            let header = trimmed.trim_start_matches('[').trim_end_matches(']').trim();
            current_section = header.split('.').map(|s| s.trim().to_string()).collect();
            continue;
        }

        if expected_section == current_section
            && let Some(after_key) = trimmed.strip_prefix(leaf)
            && after_key.trim_start().starts_with('=')
        {
            return i + 1;
        }
    }
    0
}

/// Find the 1-indexed line number for a key in YAML content.
///
/// Follows block-mapping indentation (including `- key:` sequence items) to
/// track the enclosing keys. Flow mappings are not handled. Returns 0 if the
/// key cannot be located.
fn find_yaml_key_line(content: &str, dotted_key: &str) -> usize {
    let segments: Vec<&str> = dotted_key.split('.').collect();
    let leaf = segments.last().unwrap_or(&dotted_key);
    let expected_parents = table_segments(&segments[..segments.len() - 1]);

    let mut stack: Vec<(usize, String)> = Vec::new();

    for (i, line) in content.lines().enumerate() {
        let body = line.trim_start();
        if body.is_empty() || body.starts_with('#') {
            continue;
        }
        let mut indent = line.len() - body.len();
        let body = match body.strip_prefix("- ") {
            Some(item) => {
                indent += 2;
                item.trim_start()
            }
            None => body,
        };
        let Some((key, _)) = body.split_once(':') else {
            continue;
        };
        let key = key.trim().trim_matches(['"', '\'']);

        while stack.last().is_some_and(|(depth, _)| *depth >= indent) {
            stack.pop();
        }
        let parents: Vec<&str> = stack.iter().map(|(_, k)| k.as_str()).collect();
        if key == *leaf && parents == expected_parents {
            return i + 1;
        }
        stack.push((indent, key.to_string()));
    }
    0
}
