//! Task file parsing and validation
//!
//! This module handles parsing of terrask.yml task files
//! and turning them into validated plan task definitions.

pub mod parse;
pub mod schema;
pub mod types;

// Re-export main types
pub use parse::*;
pub use schema::*;
pub use types::*;
