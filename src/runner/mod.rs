//! Task execution engine
//!
//! This module handles the plan task model: parameter slots, resolution of
//! those slots for one invocation, staging of the configuration tree, and
//! the terraform calls made from the staged copy.

pub mod args;
pub mod context;
pub mod definition;
pub mod fields;
pub mod interpolate;
pub mod param;
pub mod resolve;
pub mod stage;
pub mod task;
pub mod terraform;

// Re-export main types
pub use args::*;
pub use context::*;
pub use definition::*;
pub use fields::*;
pub use interpolate::*;
pub use param::*;
pub use resolve::{resolve, PlanInvocation, RESOLUTION_ORDER};
pub use stage::*;
pub use task::*;
pub use terraform::*;
