//! Core configuration types
//!
//! This module defines the data structures that represent a terrask.yml task file.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Top-level configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Application name (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Application usage description (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,

    /// Terraform binary to run (defaults to `terraform` on PATH)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terraform: Option<String>,

    /// Tasks defined in the configuration
    #[serde(default)]
    pub tasks: HashMap<String, Task>,
}

/// A plan task definition
///
/// Any string value may contain `${...}` placeholders, which are filled in
/// when the task runs.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Task {
    /// Description for help text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Whether this task is private (hidden from help)
    #[serde(default)]
    pub private: bool,

    /// Replaces the default `terraform:ensure` prerequisite
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ensure_task: Option<String>,

    /// Tasks to run before this one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prerequisites: Option<Vec<String>>,

    /// Positional arguments accepted on the command line, in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub argument_names: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_directory: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_directory: Option<String>,

    /// Passed to `terraform init` as `-backend-config` pairs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_config: Option<ScalarMap>,

    /// Passed to `terraform plan` as `-var` pairs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vars: Option<ScalarMap>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub var_file: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_file: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_file: Option<String>,

    /// Plan a destroy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destroy: Option<Flag>,

    /// Disable colored output from terraform and terrask
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_color: Option<Flag>,
}

/// Map of scalar values, in key order
pub type ScalarMap = BTreeMap<String, Scalar>;

/// A scalar YAML value
///
/// Numbers keep YAML's own rendering, so `1.0` stays `1.0`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Number(serde_yaml::Number),
    Text(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

/// A boolean setting, either literal or a template
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Flag {
    Literal(bool),
    Template(String),
}
