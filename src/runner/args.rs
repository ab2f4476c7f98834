//! Runtime arguments bound from a task invocation

use crate::error::{ResolutionError, ResolutionResult};

/// Ordered, named positional arguments for one invocation
///
/// Values are bound positionally against the task's `argument_names`. Names
/// without a supplied value are kept so that lookups can tell "declared but
/// not given" apart from "never declared".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuntimeArgs {
    entries: Vec<(String, Option<String>)>,
}

impl RuntimeArgs {
    /// Create an empty argument set
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind values to names in order; extra values are ignored
    pub fn bind<N, V>(names: &[N], values: &[V]) -> Self
    where
        N: AsRef<str>,
        V: AsRef<str>,
    {
        let entries = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let value = values.get(i).map(|v| v.as_ref().to_string());
                (name.as_ref().to_string(), value)
            })
            .collect();

        RuntimeArgs { entries }
    }

    /// Add a named value
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.push((name.into(), Some(value.into())));
        self
    }

    /// Get a supplied value by name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| v.as_deref())
    }

    /// Get a value that must have been supplied
    pub fn require(&self, name: &str) -> ResolutionResult<&str> {
        self.get(name)
            .ok_or_else(|| ResolutionError::MissingArgument(name.to_string()))
    }

    /// Iterate over the supplied values in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .filter_map(|(n, v)| v.as_deref().map(|v| (n.as_str(), v)))
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}
