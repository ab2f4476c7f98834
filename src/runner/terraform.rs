//! Terraform invocation
//!
//! This module turns a resolved invocation into the option bags for
//! `terraform init` and `terraform plan`, and runs them.

use crate::error::{ToolError, ToolResult};
use crate::runner::{PlanInvocation, Vars};
use std::path::{Path, PathBuf};
use std::process::{Command as StdCommand, Stdio};
use tracing::info;

/// Options for `terraform init`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InitFlags {
    pub backend_config: Option<Vars>,
    pub no_color: bool,
}

impl InitFlags {
    pub fn from_invocation(invocation: &PlanInvocation) -> Self {
        InitFlags {
            backend_config: invocation.backend_config.clone(),
            no_color: invocation.no_color,
        }
    }

    /// Command-line arguments, omitting options that were never supplied
    pub fn args(&self) -> Vec<String> {
        let mut args = vec!["init".to_string()];
        if let Some(backend_config) = &self.backend_config {
            for (key, value) in backend_config {
                args.push(format!("-backend-config={}={}", key, value));
            }
        }
        if self.no_color {
            args.push("-no-color".to_string());
        }
        args
    }
}

/// Options for `terraform plan`
///
/// Destroy plans use the same verb with `destroy` set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanFlags {
    pub no_color: bool,
    pub destroy: bool,
    pub state: Option<PathBuf>,
    pub plan: Option<PathBuf>,
    pub vars: Vars,
    pub var_file: Option<PathBuf>,
}

impl PlanFlags {
    pub fn from_invocation(invocation: &PlanInvocation) -> Self {
        PlanFlags {
            no_color: invocation.no_color,
            destroy: invocation.destroy,
            state: invocation.state_file.clone(),
            plan: invocation.plan_file.clone(),
            vars: invocation.vars.clone(),
            var_file: invocation.var_file.clone(),
        }
    }

    /// Command-line arguments, omitting options that were never supplied
    pub fn args(&self) -> Vec<String> {
        let mut args = vec!["plan".to_string()];
        if self.no_color {
            args.push("-no-color".to_string());
        }
        if self.destroy {
            args.push("-destroy".to_string());
        }
        if let Some(state) = &self.state {
            args.push(format!("-state={}", state.display()));
        }
        if let Some(plan) = &self.plan {
            args.push(format!("-out={}", plan.display()));
        }
        for (key, value) in &self.vars {
            args.push("-var".to_string());
            args.push(format!("{}={}", key, value));
        }
        if let Some(var_file) = &self.var_file {
            args.push(format!("-var-file={}", var_file.display()));
        }
        args
    }
}

/// The external provisioning tool
pub trait Provisioner {
    /// Check that the tool can be run at all
    fn ensure(&self) -> ToolResult<()>;

    /// Initialise the configuration in `dir`
    fn init(&self, dir: &Path, flags: &InitFlags) -> ToolResult<()>;

    /// Plan the configuration in `dir`
    fn plan(&self, dir: &Path, flags: &PlanFlags) -> ToolResult<()>;
}

/// [`Provisioner`] that runs the terraform binary
#[derive(Debug, Clone)]
pub struct TerraformCli {
    binary: String,
}

impl TerraformCli {
    pub fn new(binary: impl Into<String>) -> Self {
        TerraformCli {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    fn run(
        &self,
        operation: &str,
        args: &[String],
        dir: Option<&Path>,
        quiet: bool,
    ) -> ToolResult<()> {
        let mut command = StdCommand::new(&self.binary);
        command.args(args);

        if let Some(dir) = dir {
            command.current_dir(dir);
        }

        command.stdin(Stdio::inherit());
        if quiet {
            command.stdout(Stdio::null());
            command.stderr(Stdio::null());
        } else {
            command.stdout(Stdio::inherit());
            command.stderr(Stdio::inherit());
        }

        info!(binary = %self.binary, args = ?args, "running terraform {}", operation);

        let status = command.status().map_err(|source| ToolError::Spawn {
            program: self.binary.clone(),
            source,
        })?;

        if !status.success() {
            return Err(ToolError::Failed {
                operation: operation.to_string(),
                code: status.code(),
            });
        }

        Ok(())
    }
}

impl Default for TerraformCli {
    fn default() -> Self {
        Self::new("terraform")
    }
}

impl Provisioner for TerraformCli {
    fn ensure(&self) -> ToolResult<()> {
        self.run("version", &["version".to_string()], None, true)
    }

    fn init(&self, dir: &Path, flags: &InitFlags) -> ToolResult<()> {
        self.run("init", &flags.args(), Some(dir), false)
    }

    fn plan(&self, dir: &Path, flags: &PlanFlags) -> ToolResult<()> {
        self.run("plan", &flags.args(), Some(dir), false)
    }
}
