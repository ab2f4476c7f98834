//! Error types for terrask

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for terrask operations
pub type Result<T> = std::result::Result<T, TerraskError>;

/// Main error type for terrask
#[derive(Error, Debug)]
pub enum TerraskError {
    /// Task file and task definition errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Parameter resolution errors
    #[error("Resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    /// Clean, mkdir or copy failures while staging
    #[error("Staging error: {0}")]
    Staging(#[from] StagingError),

    /// Terraform invocation errors
    #[error("Terraform error: {0}")]
    Tool(#[from] ToolError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// YAML parsing errors
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Task file parsing and task definition errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to find task file (searched: {0})")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Task '{task}' is missing required parameter '{name}'")]
    MissingRequiredParameter { task: String, name: String },

    #[error("Argument '{0}' is declared more than once")]
    DuplicateArgument(String),

    #[error("Task '{0}' is not defined")]
    TaskNotFound(String),

    #[error("Task '{task}' depends on undefined task '{prerequisite}'")]
    UnknownPrerequisite { task: String, prerequisite: String },

    #[error("Circular dependency detected: {0}")]
    CircularDependency(String),
}

/// Errors raised while turning parameters into concrete values
#[derive(Error, Debug)]
pub enum ResolutionError {
    #[error("Required parameter '{0}' has no value")]
    MissingRequiredParameter(String),

    #[error("Argument '{0}' was not supplied")]
    MissingArgument(String),

    #[error("Failed to compute '{field}': {source}")]
    Factory {
        field: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Variable interpolation errors
#[derive(Error, Debug)]
pub enum InterpolationError {
    #[error("Variable '{0}' is not defined")]
    UndefinedVariable(String),
}

/// Filesystem failures while preparing the configuration directory
#[derive(Error, Debug)]
pub enum StagingError {
    #[error("Failed to clean '{path}': {source}")]
    Clean {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to create '{path}': {source}")]
    CreateDirectories {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to copy '{from}' to '{to}': {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cannot copy '{from}' into itself at '{to}'")]
    CopyIntoItself { from: PathBuf, to: PathBuf },
}

/// Failures of the external terraform binary
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("terraform {operation} failed with exit code {code:?}")]
    Failed {
        operation: String,
        code: Option<i32>,
    },
}

/// Specialized result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Specialized result type for parameter resolution
pub type ResolutionResult<T> = std::result::Result<T, ResolutionError>;

/// Specialized result type for interpolation operations
pub type InterpolationResult<T> = std::result::Result<T, InterpolationError>;

/// Specialized result type for staging operations
pub type StagingResult<T> = std::result::Result<T, StagingError>;

/// Specialized result type for terraform invocations
pub type ToolResult<T> = std::result::Result<T, ToolError>;
