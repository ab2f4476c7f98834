//! Parameter slots and their value sources
//!
//! Every configurable field of a task is a [`Parameter`]. What the caller
//! supplied for it is a [`Param`]: a literal, a factory evaluated at
//! invocation time, a declared default, or nothing at all.

use crate::error::{ResolutionError, ResolutionResult};
use crate::runner::{ResolvedFields, RuntimeArgs};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Mapping passed to terraform as backend config or variables
pub type Vars = BTreeMap<String, String>;

/// A value computed from the runtime arguments and the fields resolved so far
pub type Factory<T> =
    Arc<dyn Fn(&RuntimeArgs, &ResolvedFields) -> anyhow::Result<T> + Send + Sync>;

/// Source of a parameter's value
pub enum Param<T> {
    /// Value assigned by the caller
    Literal(T),

    /// Value computed at invocation time
    Factory(Factory<T>),

    /// Value declared by the task schema
    Default(T),

    /// Nothing supplied
    Absent,
}

impl<T> Param<T> {
    /// Wrap a closure as a factory
    pub fn factory<F>(f: F) -> Self
    where
        F: Fn(&RuntimeArgs, &ResolvedFields) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        Param::Factory(Arc::new(f))
    }

    /// The caller-assigned literal, if that is what this is
    pub fn literal(&self) -> Option<&T> {
        match self {
            Param::Literal(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Param::Absent)
    }
}

impl<T> Default for Param<T> {
    fn default() -> Self {
        Param::Absent
    }
}

impl<T: Clone> Clone for Param<T> {
    fn clone(&self) -> Self {
        match self {
            Param::Literal(v) => Param::Literal(v.clone()),
            Param::Factory(f) => Param::Factory(Arc::clone(f)),
            Param::Default(v) => Param::Default(v.clone()),
            Param::Absent => Param::Absent,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Param<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::Literal(v) => f.debug_tuple("Literal").field(v).finish(),
            Param::Factory(_) => f.write_str("Factory(..)"),
            Param::Default(v) => f.debug_tuple("Default").field(v).finish(),
            Param::Absent => f.write_str("Absent"),
        }
    }
}

impl<T> From<T> for Param<T> {
    fn from(value: T) -> Self {
        Param::Literal(value)
    }
}

impl From<&str> for Param<String> {
    fn from(value: &str) -> Self {
        Param::Literal(value.to_string())
    }
}

impl From<&str> for Param<PathBuf> {
    fn from(value: &str) -> Self {
        Param::Literal(PathBuf::from(value))
    }
}

/// A named configuration slot on a task
#[derive(Debug, Clone)]
pub struct Parameter<T> {
    name: &'static str,
    required: bool,
    source: Param<T>,
}

impl<T: Clone> Parameter<T> {
    /// A slot that must end up with a value
    pub fn required(name: &'static str) -> Self {
        Parameter {
            name,
            required: true,
            source: Param::Absent,
        }
    }

    /// A slot that may resolve to nothing
    pub fn optional(name: &'static str) -> Self {
        Parameter {
            name,
            required: false,
            source: Param::Absent,
        }
    }

    /// An optional slot with a schema default
    pub fn with_default(name: &'static str, default: T) -> Self {
        Parameter {
            name,
            required: false,
            source: Param::Default(default),
        }
    }

    /// Apply what the caller supplied; `Absent` keeps the schema default
    pub fn assign(mut self, value: Param<T>) -> Self {
        if !value.is_absent() {
            self.source = value;
        }
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Whether resolution could ever produce a value for this slot
    pub fn is_satisfiable(&self) -> bool {
        !self.required || !self.source.is_absent()
    }

    pub fn source(&self) -> &Param<T> {
        &self.source
    }

    /// Resolve this slot for one invocation
    ///
    /// Literal, then factory, then default. An optional slot with none of
    /// those yields `None`; a required one fails.
    pub fn resolve(
        &self,
        args: &RuntimeArgs,
        resolved: &ResolvedFields,
    ) -> ResolutionResult<Option<T>> {
        match &self.source {
            Param::Literal(value) | Param::Default(value) => Ok(Some(value.clone())),
            Param::Factory(factory) => factory(args, resolved).map(Some).map_err(|source| {
                ResolutionError::Factory {
                    field: self.name.to_string(),
                    source,
                }
            }),
            Param::Absent if self.required => Err(ResolutionError::MissingRequiredParameter(
                self.name.to_string(),
            )),
            Param::Absent => Ok(None),
        }
    }
}
