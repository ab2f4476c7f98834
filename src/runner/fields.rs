//! Fields resolved so far during one invocation
//!
//! Factories receive a [`ResolvedFields`] view holding every field that
//! precedes them in resolution order.

use crate::runner::Vars;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A resolved field value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Path(PathBuf),
    Map(Vars),
    Flag(bool),
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<PathBuf> for FieldValue {
    fn from(value: PathBuf) -> Self {
        FieldValue::Path(value)
    }
}

impl From<Vars> for FieldValue {
    fn from(value: Vars) -> Self {
        FieldValue::Map(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Flag(value)
    }
}

/// Resolved fields by name
///
/// Fields that resolved to nothing are not recorded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedFields {
    values: BTreeMap<&'static str, FieldValue>,
}

impl ResolvedFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a field value
    pub fn record(&mut self, name: &'static str, value: impl Into<FieldValue>) {
        self.values.insert(name, value.into());
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Text or path field as a string
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            FieldValue::Text(s) => Some(s),
            FieldValue::Path(p) => p.to_str(),
            _ => None,
        }
    }

    pub fn path(&self, name: &str) -> Option<&Path> {
        match self.get(name)? {
            FieldValue::Path(p) => Some(p),
            _ => None,
        }
    }

    pub fn map(&self, name: &str) -> Option<&Vars> {
        match self.get(name)? {
            FieldValue::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn flag(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            FieldValue::Flag(b) => Some(*b),
            _ => None,
        }
    }

    pub fn configuration_name(&self) -> Option<&str> {
        self.text("configuration_name")
    }

    pub fn backend_config(&self) -> Option<&Vars> {
        self.map("backend_config")
    }

    /// Look up a dotted reference such as `backend_config.bucket`
    pub fn lookup(&self, reference: &str) -> Option<String> {
        if let Some(value) = self.get(reference) {
            return match value {
                FieldValue::Text(s) => Some(s.clone()),
                FieldValue::Path(p) => Some(p.display().to_string()),
                FieldValue::Flag(b) => Some(b.to_string()),
                FieldValue::Map(_) => None,
            };
        }

        let (field, key) = reference.split_once('.')?;
        self.map(field)?.get(key).cloned()
    }

    /// Flatten into `name` / `name.key` pairs for interpolation
    pub fn flatten(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        for (name, value) in &self.values {
            match value {
                FieldValue::Map(map) => {
                    for (key, v) in map {
                        pairs.push((format!("{}.{}", name, key), v.clone()));
                    }
                }
                _ => {
                    if let Some(v) = self.lookup(name) {
                        pairs.push((name.to_string(), v));
                    }
                }
            }
        }
        pairs
    }
}
