//! Configuration validation
//!
//! This module turns a parsed task file into plan task definitions and checks
//! the relationships between them.

use crate::config::types::Config;
use crate::error::{ConfigError, ConfigResult};
use crate::runner::{PlanTask, DEFAULT_ENSURE_TASK};
use std::collections::{BTreeMap, HashSet};

/// Validate a complete configuration
pub fn validate_config(config: &Config) -> ConfigResult<()> {
    build_tasks(config).map(|_| ())
}

/// Build every task in the configuration and validate prerequisites
pub fn build_tasks(config: &Config) -> ConfigResult<BTreeMap<String, PlanTask>> {
    let mut tasks = BTreeMap::new();
    for (name, task) in &config.tasks {
        tasks.insert(name.clone(), PlanTask::from_config(name.clone(), task.clone())?);
    }

    validate_prerequisites(&tasks)?;
    detect_circular_task_dependencies(&tasks)?;

    Ok(tasks)
}

/// Every prerequisite must be a defined task or the built-in ensure task
fn validate_prerequisites(tasks: &BTreeMap<String, PlanTask>) -> ConfigResult<()> {
    for (name, task) in tasks {
        for prerequisite in task.prerequisites() {
            if prerequisite != DEFAULT_ENSURE_TASK && !tasks.contains_key(prerequisite) {
                return Err(ConfigError::UnknownPrerequisite {
                    task: name.clone(),
                    prerequisite: prerequisite.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Detect circular dependencies between task prerequisites
fn detect_circular_task_dependencies(tasks: &BTreeMap<String, PlanTask>) -> ConfigResult<()> {
    let mut visited = HashSet::new();
    for task_name in tasks.keys() {
        let mut stack = Vec::new();
        check_task_cycle(tasks, task_name, &mut visited, &mut stack)?;
    }
    Ok(())
}

/// Recursively check for cycles in task prerequisites
fn check_task_cycle(
    tasks: &BTreeMap<String, PlanTask>,
    task_name: &str,
    visited: &mut HashSet<String>,
    stack: &mut Vec<String>,
) -> ConfigResult<()> {
    if stack.iter().any(|t| t == task_name) {
        stack.push(task_name.to_string());
        return Err(ConfigError::CircularDependency(stack.join(" -> ")));
    }

    if visited.contains(task_name) {
        return Ok(());
    }

    // The built-in ensure task has no prerequisites of its own
    let Some(task) = tasks.get(task_name) else {
        return Ok(());
    };

    stack.push(task_name.to_string());
    for prerequisite in task.prerequisites() {
        check_task_cycle(tasks, prerequisite, visited, stack)?;
    }
    stack.pop();
    visited.insert(task_name.to_string());

    Ok(())
}
