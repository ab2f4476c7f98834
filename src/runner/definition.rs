//! Plan task definitions
//!
//! A [`PlanTask`] is the static schema for one terraform plan action: its
//! identity, the runtime arguments it accepts, and one [`Parameter`] per
//! configurable field. Definitions are immutable once built; every invocation
//! resolves them into a fresh [`PlanInvocation`](crate::runner::PlanInvocation).

use crate::config;
use crate::error::{ConfigError, ConfigResult};
use crate::runner::{
    interpolate_strict, is_template, template_vars, Param, Parameter, RuntimeArgs, Vars,
};
use anyhow::bail;
use std::collections::HashSet;
use std::path::PathBuf;

/// Task name used when none is given
pub const DEFAULT_TASK_NAME: &str = "plan";

/// Prerequisite that makes sure terraform is available
pub const DEFAULT_ENSURE_TASK: &str = "terraform:ensure";

/// Everything a caller may customise on a plan task
///
/// Each field is independently optional. Identity fields left as `None` take
/// their defaults; parameter fields left as [`Param::Absent`] take the schema
/// default, if any.
#[derive(Debug, Clone, Default)]
pub struct PlanTaskOptions {
    pub name: Option<String>,
    pub namespace: Option<String>,
    pub description: Option<String>,
    /// Replaces the default `terraform:ensure` prerequisite
    pub ensure_task: Option<String>,
    /// Full prerequisite list; takes precedence over `ensure_task`
    pub prerequisites: Option<Vec<String>>,
    pub argument_names: Vec<String>,

    pub configuration_name: Param<String>,
    pub source_directory: Param<PathBuf>,
    pub work_directory: Param<PathBuf>,
    pub backend_config: Param<Vars>,
    pub vars: Param<Vars>,
    pub var_file: Param<PathBuf>,
    pub state_file: Param<PathBuf>,
    pub plan_file: Param<PathBuf>,
    pub destroy: Param<bool>,
    pub no_color: Param<bool>,
}

/// The parameter slots of a plan task, in resolution order
#[derive(Debug, Clone)]
pub struct PlanParameters {
    pub configuration_name: Parameter<String>,
    pub source_directory: Parameter<PathBuf>,
    pub work_directory: Parameter<PathBuf>,
    pub backend_config: Parameter<Vars>,
    pub vars: Parameter<Vars>,
    pub var_file: Parameter<PathBuf>,
    pub state_file: Parameter<PathBuf>,
    pub plan_file: Parameter<PathBuf>,
    pub destroy: Parameter<bool>,
    pub no_color: Parameter<bool>,
}

impl PlanParameters {
    /// The declared schema with no caller values applied
    pub fn schema() -> Self {
        PlanParameters {
            configuration_name: Parameter::required("configuration_name"),
            source_directory: Parameter::required("source_directory"),
            work_directory: Parameter::required("work_directory"),
            backend_config: Parameter::optional("backend_config"),
            vars: Parameter::with_default("vars", Vars::new()),
            var_file: Parameter::optional("var_file"),
            state_file: Parameter::optional("state_file"),
            plan_file: Parameter::optional("plan_file"),
            destroy: Parameter::with_default("destroy", false),
            no_color: Parameter::with_default("no_color", false),
        }
    }

    fn assign(options: PlanTaskOptions) -> Self {
        let schema = Self::schema();
        PlanParameters {
            configuration_name: schema.configuration_name.assign(options.configuration_name),
            source_directory: schema.source_directory.assign(options.source_directory),
            work_directory: schema.work_directory.assign(options.work_directory),
            backend_config: schema.backend_config.assign(options.backend_config),
            vars: schema.vars.assign(options.vars),
            var_file: schema.var_file.assign(options.var_file),
            state_file: schema.state_file.assign(options.state_file),
            plan_file: schema.plan_file.assign(options.plan_file),
            destroy: schema.destroy.assign(options.destroy),
            no_color: schema.no_color.assign(options.no_color),
        }
    }

    /// Names of required slots nothing was supplied for
    fn unsatisfied(&self) -> Vec<&'static str> {
        [
            (self.configuration_name.name(), self.configuration_name.is_satisfiable()),
            (self.source_directory.name(), self.source_directory.is_satisfiable()),
            (self.work_directory.name(), self.work_directory.is_satisfiable()),
        ]
        .into_iter()
        .filter(|(_, ok)| !ok)
        .map(|(name, _)| name)
        .collect()
    }
}

/// A terraform plan task definition
#[derive(Debug, Clone)]
pub struct PlanTask {
    name: String,
    description: String,
    prerequisites: Vec<String>,
    argument_names: Vec<String>,
    parameters: PlanParameters,
}

impl PlanTask {
    /// Build a task from options, checking that required fields were supplied
    pub fn define(options: PlanTaskOptions) -> ConfigResult<Self> {
        let base_name = options
            .name
            .clone()
            .unwrap_or_else(|| DEFAULT_TASK_NAME.to_string());
        let name = match &options.namespace {
            Some(ns) => format!("{}:{}", ns, base_name),
            None => base_name,
        };

        let mut seen = HashSet::new();
        for arg in &options.argument_names {
            if !seen.insert(arg.as_str()) {
                return Err(ConfigError::DuplicateArgument(arg.clone()));
            }
        }

        let description = options.description.clone().unwrap_or_else(|| {
            match options.configuration_name.literal() {
                Some(configuration_name) => {
                    format!("Plan {} using terraform", configuration_name)
                }
                None => "Plan using terraform".to_string(),
            }
        });

        let prerequisites = match (&options.prerequisites, &options.ensure_task) {
            (Some(prerequisites), _) => prerequisites.clone(),
            (None, Some(ensure)) => vec![ensure.clone()],
            (None, None) => vec![DEFAULT_ENSURE_TASK.to_string()],
        };

        let argument_names = options.argument_names.clone();
        let parameters = PlanParameters::assign(options);

        if let Some(missing) = parameters.unsatisfied().first() {
            return Err(ConfigError::MissingRequiredParameter {
                task: name,
                name: missing.to_string(),
            });
        }

        Ok(PlanTask {
            name,
            description,
            prerequisites,
            argument_names,
            parameters,
        })
    }

    /// Build a task by customising default options in a closure
    pub fn configure<F>(configure: F) -> ConfigResult<Self>
    where
        F: FnOnce(&mut PlanTaskOptions),
    {
        let mut options = PlanTaskOptions::default();
        configure(&mut options);
        Self::define(options)
    }

    /// Build a task from a task file entry
    ///
    /// String values containing `${...}` become factories evaluated at
    /// invocation time; everything else is a literal.
    pub fn from_config(name: String, config: config::Task) -> ConfigResult<Self> {
        let options = PlanTaskOptions {
            name: Some(name),
            namespace: None,
            description: config.description,
            ensure_task: config.ensure_task,
            prerequisites: config.prerequisites,
            argument_names: config.argument_names,
            configuration_name: text_param(config.configuration_name),
            source_directory: path_param(config.source_directory),
            work_directory: path_param(config.work_directory),
            backend_config: map_param(config.backend_config),
            vars: map_param(config.vars),
            var_file: path_param(config.var_file),
            state_file: path_param(config.state_file),
            plan_file: path_param(config.plan_file),
            destroy: flag_param(config.destroy),
            no_color: flag_param(config.no_color),
        };

        Self::define(options)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn prerequisites(&self) -> &[String] {
        &self.prerequisites
    }

    pub fn argument_names(&self) -> &[String] {
        &self.argument_names
    }

    pub fn parameters(&self) -> &PlanParameters {
        &self.parameters
    }

    /// Bind positional values to this task's argument names
    pub fn bind_args<V: AsRef<str>>(&self, values: &[V]) -> RuntimeArgs {
        RuntimeArgs::bind(&self.argument_names, values)
    }
}

fn template_factory(template: String) -> Param<String> {
    Param::factory(move |args, resolved| {
        let vars = template_vars(args, resolved);
        Ok(interpolate_strict(&template, &vars)?)
    })
}

fn text_param(value: Option<String>) -> Param<String> {
    match value {
        Some(s) if is_template(&s) => template_factory(s),
        Some(s) => Param::Literal(s),
        None => Param::Absent,
    }
}

fn path_param(value: Option<String>) -> Param<PathBuf> {
    match value {
        Some(s) if is_template(&s) => Param::factory(move |args, resolved| {
            let vars = template_vars(args, resolved);
            Ok(PathBuf::from(interpolate_strict(&s, &vars)?))
        }),
        Some(s) => Param::Literal(PathBuf::from(s)),
        None => Param::Absent,
    }
}

fn map_param(value: Option<config::ScalarMap>) -> Param<Vars> {
    let Some(map) = value else {
        return Param::Absent;
    };

    let rendered: Vars = map.into_iter().map(|(k, v)| (k, v.to_string())).collect();
    if !rendered.values().any(|v| is_template(v)) {
        return Param::Literal(rendered);
    }

    Param::factory(move |args, resolved| {
        let vars = template_vars(args, resolved);
        let mut result = Vars::new();
        for (key, value) in &rendered {
            result.insert(key.clone(), interpolate_strict(value, &vars)?);
        }
        Ok(result)
    })
}

fn flag_param(value: Option<config::Flag>) -> Param<bool> {
    match value {
        Some(config::Flag::Literal(b)) => Param::Literal(b),
        Some(config::Flag::Template(s)) if is_template(&s) => {
            Param::factory(move |args, resolved| {
                let vars = template_vars(args, resolved);
                parse_flag(&interpolate_strict(&s, &vars)?)
            })
        }
        Some(config::Flag::Template(s)) => match parse_flag(&s) {
            Ok(b) => Param::Literal(b),
            Err(_) => Param::factory(move |_, _| parse_flag(&s)),
        },
        None => Param::Absent,
    }
}

fn parse_flag(value: &str) -> anyhow::Result<bool> {
    match value.trim() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" | "" => Ok(false),
        other => bail!("expected a boolean, got '{}'", other),
    }
}
