//! Parameter resolution
//!
//! Fields are resolved one at a time in a fixed order:
//!
//! 1. `configuration_name`
//! 2. `source_directory`
//! 3. `work_directory`
//! 4. `backend_config`
//! 5. `vars`
//! 6. `var_file`
//! 7. `state_file`
//! 8. `plan_file`
//! 9. `destroy`
//! 10. `no_color`
//!
//! A factory sees every field before it in this list and none after it, so a
//! `backend_config` factory may use `configuration_name` and a `vars` factory
//! may use the finished `backend_config`.

use crate::error::{ResolutionError, ResolutionResult};
use crate::runner::{
    FieldValue, Parameter, PlanParameters, PlanTask, ResolvedFields, RuntimeArgs, Vars,
};
use std::path::PathBuf;
use tracing::debug;

/// Field names in resolution order
pub const RESOLUTION_ORDER: [&str; 10] = [
    "configuration_name",
    "source_directory",
    "work_directory",
    "backend_config",
    "vars",
    "var_file",
    "state_file",
    "plan_file",
    "destroy",
    "no_color",
];

/// A fully resolved plan task, valid for one invocation
#[derive(Debug, Clone, PartialEq)]
pub struct PlanInvocation {
    pub configuration_name: String,
    pub source_directory: PathBuf,
    pub work_directory: PathBuf,
    pub backend_config: Option<Vars>,
    pub vars: Vars,
    pub var_file: Option<PathBuf>,
    pub state_file: Option<PathBuf>,
    pub plan_file: Option<PathBuf>,
    pub destroy: bool,
    pub no_color: bool,
}

impl PlanInvocation {
    /// Where the source tree is staged: `work_directory/source_directory`
    pub fn configuration_directory(&self) -> PathBuf {
        self.work_directory.join(&self.source_directory)
    }
}

impl PlanTask {
    /// Resolve this task's parameters against runtime arguments
    ///
    /// The definition is left untouched; each call produces a fresh invocation.
    pub fn resolve(&self, args: &RuntimeArgs) -> ResolutionResult<PlanInvocation> {
        resolve(self.parameters(), args)
    }
}

/// Resolve a parameter set in [`RESOLUTION_ORDER`]
pub fn resolve(
    parameters: &PlanParameters,
    args: &RuntimeArgs,
) -> ResolutionResult<PlanInvocation> {
    let mut resolved = ResolvedFields::new();

    let configuration_name =
        resolve_required(&parameters.configuration_name, args, &mut resolved)?;
    let source_directory = resolve_required(&parameters.source_directory, args, &mut resolved)?;
    let work_directory = resolve_required(&parameters.work_directory, args, &mut resolved)?;
    let backend_config = resolve_field(&parameters.backend_config, args, &mut resolved)?;
    let vars = resolve_field(&parameters.vars, args, &mut resolved)?.unwrap_or_default();
    let var_file = resolve_field(&parameters.var_file, args, &mut resolved)?;
    let state_file = resolve_field(&parameters.state_file, args, &mut resolved)?;
    let plan_file = resolve_field(&parameters.plan_file, args, &mut resolved)?;
    let destroy = resolve_field(&parameters.destroy, args, &mut resolved)?.unwrap_or(false);
    let no_color = resolve_field(&parameters.no_color, args, &mut resolved)?.unwrap_or(false);

    Ok(PlanInvocation {
        configuration_name,
        source_directory,
        work_directory,
        backend_config,
        vars,
        var_file,
        state_file,
        plan_file,
        destroy,
        no_color,
    })
}

fn resolve_field<T>(
    parameter: &Parameter<T>,
    args: &RuntimeArgs,
    resolved: &mut ResolvedFields,
) -> ResolutionResult<Option<T>>
where
    T: Clone + Into<FieldValue>,
{
    let value = parameter.resolve(args, resolved)?;
    match &value {
        Some(v) => {
            debug!(field = parameter.name(), "resolved");
            resolved.record(parameter.name(), v.clone());
        }
        None => debug!(field = parameter.name(), "absent"),
    }
    Ok(value)
}

fn resolve_required<T>(
    parameter: &Parameter<T>,
    args: &RuntimeArgs,
    resolved: &mut ResolvedFields,
) -> ResolutionResult<T>
where
    T: Clone + Into<FieldValue>,
{
    resolve_field(parameter, args, resolved)?
        .ok_or_else(|| ResolutionError::MissingRequiredParameter(parameter.name().to_string()))
}
