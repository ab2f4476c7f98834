//! terrask - declarative terraform plan tasks
//!
//! Tasks are described in a `terrask.yml` file or built in code with
//! [`runner::PlanTask::define`]. Running a task resolves its parameters
//! against the command-line arguments, stages a copy of the terraform
//! configuration under the work directory, then runs `terraform init` and
//! `terraform plan` from that copy.

// Public modules
pub mod cli;
pub mod config;
pub mod error;
pub mod runner;

// Re-export commonly used types
pub use error::{Result, TerraskError};

/// Current version of terrask
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
