//! Inheritance resolution.
//!
//! [`Resolver`] walks a section's entries, splices the resolved content of
//! every `@Inherits` reference in place, expands macro directives, and folds
//! the result so later keys win. Resolved references are memoized in a
//! [`ContentCache`] for the lifetime of one compilation run.
//!
//! The set of references on the active path is carried as an immutable
//! [`ResolutionPath`]. Each recursive call receives its own extended copy, so
//! sibling references in one `@Inherits` list never see each other's entries
//! and two siblings targeting the same section are not mistaken for a cycle.

use std::collections::HashMap;

use tracing::trace;

use crate::directive::DirectiveKind;
use crate::error::WeaveError;
use crate::macros::MacroStore;
use crate::types::{Document, DocumentMap, Section, normalize_name};

/// Keyword standing for the document currently being processed.
pub const THIS_DOCUMENT: &str = "this";

/// Nesting limit for acyclic inheritance chains.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// A parsed `document:section` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub document: String,
    pub section: String,
}

impl Reference {
    /// Parse `raw`, replacing a `this` document with `caller`.
    ///
    /// The document part is normalized like a relative path, so
    /// `units/./base.ini:Tank` and `units/base.ini:Tank` are the same
    /// reference.
    pub fn parse(raw: &str, caller: Option<&str>) -> Result<Self, WeaveError> {
        let trimmed = raw.trim();
        let (document, section) = trimmed
            .split_once(':')
            .filter(|(doc, sec)| !doc.trim().is_empty() && !sec.trim().is_empty())
            .ok_or_else(|| WeaveError::MalformedReference(raw.to_string()))?;
        let (document, section) = (document.trim(), section.trim());

        let document = if document == THIS_DOCUMENT {
            caller
                .map(str::to_string)
                .ok_or_else(|| WeaveError::MissingContext(raw.to_string()))?
        } else {
            normalize_name(document)
        };

        Ok(Self {
            document,
            section: section.to_string(),
        })
    }

    /// Canonical `document:section` form, used as cache and path key.
    pub fn key(&self) -> String {
        format!("{}:{}", self.document, self.section)
    }
}

/// The references currently being resolved, outermost first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionPath {
    chain: Vec<String>,
}

impl ResolutionPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.chain.iter().any(|k| k == key)
    }

    pub fn depth(&self) -> usize {
        self.chain.len()
    }

    /// A copy of this path extended with `key`.
    pub fn with(&self, key: impl Into<String>) -> Self {
        let mut chain = self.chain.clone();
        chain.push(key.into());
        Self { chain }
    }

    /// The chain that closes a cycle at `key`.
    pub fn cycle(&self, key: &str) -> Vec<String> {
        let mut chain = self.chain.clone();
        chain.push(key.to_string());
        chain
    }
}

/// Read-only access to loaded documents by normalized name.
pub trait DocumentStore {
    fn document(&self, name: &str) -> Option<&Document>;

    fn document_names(&self) -> Vec<String>;
}

impl DocumentStore for DocumentMap {
    fn document(&self, name: &str) -> Option<&Document> {
        self.get(name)
    }

    fn document_names(&self) -> Vec<String> {
        self.keys().cloned().collect()
    }
}

/// Memoization of fully resolved references.
pub trait ContentCache {
    fn get(&self, key: &str) -> Option<&Section>;

    fn put(&mut self, key: String, section: Section);
}

/// The default in-memory [`ContentCache`].
#[derive(Debug, Clone, Default)]
pub struct SectionCache {
    entries: HashMap<String, Section>,
}

impl SectionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ContentCache for SectionCache {
    fn get(&self, key: &str) -> Option<&Section> {
        self.entries.get(key)
    }

    fn put(&mut self, key: String, section: Section) {
        self.entries.insert(key, section);
    }
}

/// Resolves directives against a document store.
pub struct Resolver<'a, S: DocumentStore + ?Sized, C: ContentCache> {
    documents: &'a S,
    macros: Option<&'a MacroStore>,
    cache: &'a mut C,
    max_depth: usize,
}

impl<'a, S: DocumentStore + ?Sized, C: ContentCache> Resolver<'a, S, C> {
    pub fn new(documents: &'a S, cache: &'a mut C) -> Self {
        Self {
            documents,
            macros: None,
            cache,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Expand macro directives with `macros`. Without a store, macro
    /// directives are kept as ordinary entries.
    pub fn with_macros(mut self, macros: &'a MacroStore) -> Self {
        self.macros = Some(macros);
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Resolve one reference, reading from and filling the cache.
    pub fn resolve_reference(
        &mut self,
        raw: &str,
        caller: Option<&str>,
        path: &ResolutionPath,
    ) -> Result<Section, WeaveError> {
        let reference = Reference::parse(raw, caller)?;
        let key = reference.key();

        if let Some(cached) = self.cache.get(&key) {
            trace!(reference = %key, "inheritance cache hit");
            return Ok(cached.clone());
        }
        if path.contains(&key) {
            return Err(WeaveError::CyclicInheritance {
                chain: path.cycle(&key),
            });
        }
        if path.depth() >= self.max_depth {
            return Err(WeaveError::InheritanceTooDeep {
                reference: key,
                limit: self.max_depth,
            });
        }

        let documents = self.documents;
        let document = documents
            .document(&reference.document)
            .ok_or_else(|| WeaveError::UnknownDocument(reference.document.clone()))?;
        let section = document
            .get(&reference.section)
            .ok_or_else(|| WeaveError::UnknownSection {
                document: reference.document.clone(),
                section: reference.section.clone(),
            })?;

        trace!(reference = %key, depth = path.depth(), "resolving inherited section");
        let resolved = self.resolve_section(section, Some(&reference.document), &path.with(&key))?;
        self.cache.put(key, resolved.clone());
        Ok(resolved)
    }

    /// Resolve every directive in `section`, returning a directive-free
    /// section with duplicate keys folded.
    pub fn resolve_section(
        &mut self,
        section: &Section,
        caller: Option<&str>,
        path: &ResolutionPath,
    ) -> Result<Section, WeaveError> {
        let mut out = Section::new();
        for (key, value) in section.iter() {
            match DirectiveKind::classify(key) {
                DirectiveKind::Inherit => {
                    for reference in value.strings() {
                        out.append(self.resolve_reference(reference, caller, path)?);
                    }
                }
                DirectiveKind::Macro(name) => match self.macros {
                    Some(macros) => out.append(macros.expand(name, value)?),
                    None => out.push(key, value.clone()),
                },
                DirectiveKind::None => out.push(key, value.clone()),
            }
        }
        Ok(out.folded())
    }
}
