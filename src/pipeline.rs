//! Compilation driver: resolve every section of every document.
//!
//! Operates on pre-loaded documents and macros with no I/O, so the whole
//! resolution pass is testable with synthetic inputs. A [`CompilationContext`]
//! owns the document store, macro store and memoization cache for exactly one
//! run; nothing is shared between runs.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::WeaveError;
use crate::inherit::{
    ContentCache, DEFAULT_MAX_DEPTH, DocumentStore, ResolutionPath, Resolver, SectionCache,
};
use crate::macros::MacroStore;
use crate::types::{Document, DocumentMap, Section};

/// What to do when one document fails to resolve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop at the first failing document.
    #[default]
    Abort,
    /// Log the failure, leave the document out, and continue.
    Skip,
}

/// The output of [`CompilationContext::compile`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Compiled {
    /// Resolved documents in processing order.
    pub documents: Vec<(String, Document)>,
    /// Documents left out under [`FailurePolicy::Skip`].
    pub skipped: Vec<String>,
}

/// Everything one compilation run resolves against.
pub struct CompilationContext<S = DocumentMap, C = SectionCache> {
    documents: S,
    macros: Option<MacroStore>,
    cache: C,
    max_depth: usize,
}

impl<S: DocumentStore> CompilationContext<S, SectionCache> {
    pub fn new(documents: S) -> Self {
        Self {
            documents,
            macros: None,
            cache: SectionCache::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl<S: DocumentStore, C: ContentCache> CompilationContext<S, C> {
    /// Use `cache` instead of a fresh [`SectionCache`].
    pub fn with_cache<C2: ContentCache>(self, cache: C2) -> CompilationContext<S, C2> {
        CompilationContext {
            documents: self.documents,
            macros: self.macros,
            cache,
            max_depth: self.max_depth,
        }
    }

    /// Expand macro directives with `macros`. Without a store, macro
    /// directives pass through as plain entries.
    pub fn with_macros(mut self, macros: MacroStore) -> Self {
        self.macros = Some(macros);
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn documents(&self) -> &S {
        &self.documents
    }

    pub fn macros(&self) -> Option<&MacroStore> {
        self.macros.as_ref()
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    fn resolver(&mut self) -> Resolver<'_, S, C> {
        let resolver = Resolver::new(&self.documents, &mut self.cache).max_depth(self.max_depth);
        match &self.macros {
            Some(macros) => resolver.with_macros(macros),
            None => resolver,
        }
    }

    /// Resolve all directives in `section`, which belongs to `document`.
    pub fn resolve_section(
        &mut self,
        section: &Section,
        document: &str,
    ) -> Result<Section, WeaveError> {
        self.resolver()
            .resolve_section(section, Some(document), &ResolutionPath::new())
    }

    /// Resolve a single `document:section` reference outside any document.
    pub fn resolve_reference(&mut self, reference: &str) -> Result<Section, WeaveError> {
        self.resolver()
            .resolve_reference(reference, None, &ResolutionPath::new())
    }

    /// Resolve every section of the document `name`.
    pub fn compile_document(&mut self, name: &str) -> Result<Document, WeaveError> {
        let documents = &self.documents;
        let source = documents
            .document(name)
            .ok_or_else(|| WeaveError::UnknownDocument(name.to_string()))?;
        let mut resolver = Resolver::new(documents, &mut self.cache).max_depth(self.max_depth);
        if let Some(macros) = &self.macros {
            resolver = resolver.with_macros(macros);
        }

        let mut out = Document::with_capacity(source.len());
        for (section_name, section) in source {
            let resolved = resolver
                .resolve_section(section, Some(name), &ResolutionPath::new())
                .map_err(|e| e.in_document(name))?;
            out.insert(section_name.clone(), resolved);
        }
        debug!(document = name, sections = out.len(), "compiled document");
        Ok(out)
    }

    /// Compile every document in store order.
    pub fn compile(&mut self, policy: FailurePolicy) -> Result<Compiled, WeaveError> {
        let mut compiled = Compiled::default();
        for name in self.documents.document_names() {
            match self.compile_document(&name) {
                Ok(document) => compiled.documents.push((name, document)),
                Err(e) if policy == FailurePolicy::Skip => {
                    warn!(document = %name, error = %e, "skipping document");
                    compiled.skipped.push(name);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(compiled)
    }
}
