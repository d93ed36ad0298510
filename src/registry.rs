//! Registry tables: numbered indexes of section names.
//!
//! Each configured table collects the section names of its source documents
//! into one section, keyed by a running counter. The resulting document is
//! compiled and emitted like any other, so units can inherit from it.

use std::path::Path;

use glob::{MatchOptions, Pattern};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::WeaveError;
use crate::format;
use crate::types::{Document, DocumentMap, Section};

const WILDCARD_CHARS: [char; 3] = ['*', '?', '['];

/// One registry table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryTable {
    /// Section name of the table in the registry document.
    pub target: String,
    /// Document names, wildcard patterns, or paths of external files.
    pub sources: Vec<String>,
    /// First counter value. Defaults to 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<usize>,
}

impl RegistryTable {
    pub fn new(target: impl Into<String>, sources: Vec<String>) -> Self {
        Self {
            target: target.into(),
            sources,
            start: None,
        }
    }

    pub fn starting_at(mut self, start: usize) -> Self {
        self.start = Some(start);
        self
    }
}

pub fn has_wildcard(source: &str) -> bool {
    source.contains(WILDCARD_CHARS)
}

/// Build the registry document for `tables` against the loaded documents.
///
/// Sources are tried as a wildcard pattern over document names, then as an
/// exact document name, then as a file on disk. An external file that cannot
/// be read is logged and skipped.
pub fn build_registry(
    tables: &[RegistryTable],
    documents: &DocumentMap,
) -> Result<Document, WeaveError> {
    let mut registry = Document::new();
    for table in tables {
        let mut counter = table.start.unwrap_or(1);
        let mut section = Section::new();
        for source in &table.sources {
            for name in source_sections(table, source, documents)? {
                section.push(counter.to_string(), name);
                counter += 1;
            }
        }
        debug!(table = %table.target, entries = section.len(), "built registry table");
        registry.insert(table.target.clone(), section);
    }
    Ok(registry)
}

/// Section names contributed by one source, in order.
fn source_sections(
    table: &RegistryTable,
    source: &str,
    documents: &DocumentMap,
) -> Result<Vec<String>, WeaveError> {
    if has_wildcard(source) {
        let pattern = Pattern::new(source).map_err(|e| WeaveError::Pattern {
            pattern: source.to_string(),
            source: e,
        })?;
        let options = MatchOptions {
            require_literal_separator: true,
            ..MatchOptions::default()
        };
        let matched: Vec<&Document> = documents
            .iter()
            .filter(|(name, _)| pattern.matches_with(name, options))
            .map(|(_, doc)| doc)
            .collect();
        if matched.is_empty() {
            warn!(table = %table.target, pattern = source, "registry pattern matched no documents");
        } else {
            info!(
                table = %table.target,
                pattern = source,
                count = matched.len(),
                "registry pattern matched documents"
            );
        }
        return Ok(matched
            .into_iter()
            .flat_map(|doc| doc.keys().cloned())
            .collect());
    }

    if let Some(document) = documents.get(source) {
        return Ok(document.keys().cloned().collect());
    }

    match format::read_document(Path::new(source)) {
        Ok(document) => {
            info!(table = %table.target, file = source, "read external registry source");
            Ok(document.into_keys().collect())
        }
        Err(e) => {
            warn!(table = %table.target, file = source, error = %e, "registry source unavailable");
            Ok(Vec::new())
        }
    }
}
