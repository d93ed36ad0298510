//! Macro templates and their expansion.
//!
//! A macro is a section stored under `relativePath:sectionName` (and under
//! `relativePath` alone when its file defines a single section). Invoking it
//! with an argument list produces a concrete section:
//!
//! 1. a range token in a key multiplies that entry, one key per argument;
//! 2. a range token in a value expands the comma-separated part holding it;
//! 3. single `${i}` placeholders are substituted in keys and values;
//! 4. duplicate keys collapse, last one winning.
//!
//! Directives inside a template body are not expanded.

use std::collections::HashMap;

use tracing::trace;

use crate::arity::{self, Arity};
use crate::error::WeaveError;
use crate::placeholder;
use crate::types::{Document, Section, Value};

/// A validated macro body with its derived arity.
#[derive(Debug, Clone, PartialEq)]
pub struct MacroTemplate {
    name: String,
    body: Section,
    arity: Arity,
}

impl MacroTemplate {
    /// Analyze `body` and build a template, failing on malformed placeholders.
    pub fn new(name: impl Into<String>, body: Section) -> Result<Self, WeaveError> {
        let name = name.into();
        let arity = arity::analyze(&name, &body)?;
        Ok(Self { name, body, arity })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn body(&self) -> &Section {
        &self.body
    }

    pub fn arity(&self) -> Arity {
        self.arity
    }

    /// Expand the template against `args`.
    pub fn expand(&self, args: &[String]) -> Section {
        let count = self.arity.effective_count(args.len());
        let mut out = Section::new();
        for (key, value) in self.body.iter() {
            for expanded_key in expand_key(key, args) {
                let value = value.map_strings(|s| {
                    placeholder::substitute_singles(&expand_value(s, args), count, args)
                });
                let key = placeholder::substitute_singles(&expanded_key, count, args);
                out.push(key, value);
            }
        }
        out.folded()
    }
}

/// One key per argument covered by the key's first range token.
fn expand_key(key: &str, args: &[String]) -> Vec<String> {
    let Some(token) = placeholder::first_range(key) else {
        return vec![key.to_string()];
    };
    let Some(range) = token.bounded(args.len()) else {
        return vec![key.to_string()];
    };
    args[range]
        .iter()
        .map(|arg| key.replacen(token.text, arg, 1))
        .collect()
}

/// Expand the comma-separated parts of `value` that hold its first range
/// token; other parts pass through.
fn expand_value(value: &str, args: &[String]) -> String {
    let Some(token) = placeholder::first_range(value) else {
        return value.to_string();
    };
    let Some(range) = token.bounded(args.len()) else {
        return value.to_string();
    };
    let mut parts = Vec::new();
    for part in value.split(',') {
        if part.contains(token.text) {
            parts.extend(
                args[range.clone()]
                    .iter()
                    .map(|arg| part.replacen(token.text, arg, 1)),
            );
        } else {
            parts.push(part.to_string());
        }
    }
    parts.join(",")
}

/// Normalize a directive value into an argument list: lists are taken as-is,
/// scalars are split on `,`.
pub fn arguments(value: &Value) -> Vec<String> {
    match value {
        Value::Scalar(s) => s.split(',').map(str::to_string).collect(),
        Value::List(items) => items.clone(),
    }
}

/// All macro templates known to a build, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct MacroStore {
    templates: HashMap<String, MacroTemplate>,
}

impl MacroStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `body` and register it under `name`, replacing any previous
    /// template of that name.
    pub fn insert(&mut self, name: impl Into<String>, body: Section) -> Result<(), WeaveError> {
        let template = MacroTemplate::new(name, body)?;
        self.templates.insert(template.name.clone(), template);
        Ok(())
    }

    /// Register every section of a macro file whose extension-less relative
    /// path is `stem`.
    ///
    /// Each section is stored as `stem:section`; a file holding exactly one
    /// section is also reachable as plain `stem`.
    pub fn register_file(&mut self, stem: &str, document: Document) -> Result<(), WeaveError> {
        if document.len() == 1
            && let Some(body) = document.values().next()
        {
            self.insert(stem, body.clone())?;
        }
        for (section, body) in document {
            self.insert(format!("{stem}:{section}"), body)?;
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&MacroTemplate> {
        self.templates.get(name)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.templates.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Find the template for an invocation of `name` with `argument`.
    ///
    /// The exact name wins. Otherwise a scalar argument is tried as a section
    /// name, `name:argument`, which is how `@path=Section` selects a
    /// parameterless macro from a multi-section file.
    pub fn lookup(&self, name: &str, argument: &Value) -> Result<&MacroTemplate, WeaveError> {
        if let Some(template) = self.templates.get(name) {
            return Ok(template);
        }
        if let Value::Scalar(section) = argument
            && let Some(template) = self.templates.get(&format!("{name}:{section}"))
        {
            return Ok(template);
        }
        Err(WeaveError::UndefinedMacro(name.to_string()))
    }

    /// Expand the macro `name` with the directive value `argument`.
    pub fn expand(&self, name: &str, argument: &Value) -> Result<Section, WeaveError> {
        let template = self.lookup(name, argument)?;
        let args = arguments(argument);
        trace!(macro_name = template.name(), args = args.len(), "expanding macro");
        Ok(template.expand(&args))
    }
}
