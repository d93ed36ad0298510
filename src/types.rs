//! Data model shared by the resolution engine and the host layers.
//!
//! A [`Document`] maps section names to [`Section`]s in parse order. A
//! [`Section`] is an ordered list of `(key, Value)` entries that may contain
//! repeated keys until it is [folded](Section::folded).

use std::collections::BTreeMap;
use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

/// A parsed document: section name → section, in source order.
pub type Document = IndexMap<String, Section>;

/// All loaded documents keyed by normalized name. Iteration order is the
/// host's processing order.
pub type DocumentMap = BTreeMap<String, Document>;

/// An entry value: a scalar string or an ordered list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Scalar(String),
    List(Vec<String>),
}

impl Value {
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Value::Scalar(s) => Some(s),
            Value::List(_) => None,
        }
    }

    /// Every string carried by this value, in order.
    pub fn strings(&self) -> Vec<&str> {
        match self {
            Value::Scalar(s) => vec![s.as_str()],
            Value::List(items) => items.iter().map(String::as_str).collect(),
        }
    }

    /// Apply `f` to every string, keeping the scalar/list shape.
    pub fn map_strings<F: FnMut(&str) -> String>(&self, mut f: F) -> Value {
        match self {
            Value::Scalar(s) => Value::Scalar(f(s)),
            Value::List(items) => Value::List(items.iter().map(|s| f(s)).collect()),
        }
    }
}

/// Scalars print as-is; lists print comma-joined.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Scalar(s) => write!(f, "{s}"),
            Value::List(items) => write!(f, "{}", items.join(",")),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Scalar(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Scalar(s)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::List(items)
    }
}

impl From<Vec<&str>> for Value {
    fn from(items: Vec<&str>) -> Self {
        Value::List(items.into_iter().map(str::to_string).collect())
    }
}

/// An ordered sequence of key/value entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    entries: Vec<(String, Value)>,
}

impl Section {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.push((key.into(), value.into()));
    }

    /// Append `item` to the list stored under `key`, starting a new list when
    /// the last entry for `key` is missing or a scalar.
    pub fn push_list_item(&mut self, key: &str, item: impl Into<String>) {
        let last = self.entries.iter_mut().rev().find(|(k, _)| k == key);
        match last {
            Some((_, Value::List(items))) => items.push(item.into()),
            _ => self.entries.push((key.to_string(), Value::List(vec![item.into()]))),
        }
    }

    /// Append another section's entries after this one's.
    pub fn append(&mut self, other: Section) {
        self.entries.extend(other.entries);
    }

    pub fn entries(&self) -> &[(String, Value)] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// The value of the last entry with `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Collapse duplicate keys left to right: the last value wins and the key
    /// keeps the position of its first occurrence.
    pub fn folded(self) -> Section {
        let mut map: IndexMap<String, Value> = IndexMap::with_capacity(self.entries.len());
        for (key, value) in self.entries {
            map.insert(key, value);
        }
        Section {
            entries: map.into_iter().collect(),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Section {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Section {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl IntoIterator for Section {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Normalize a document name to `/`-separated form with `.` and `..`
/// segments collapsed. A leading `/` is kept.
pub fn normalize_name(name: &str) -> String {
    let unified = name.replace('\\', "/");
    let absolute = unified.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if absolute => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }
    let joined = parts.join("/");
    if absolute {
        format!("/{joined}")
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}
