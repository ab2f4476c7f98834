//! Plan task execution
//!
//! Runs one plan task end to end: resolve, stage, `terraform init`,
//! `terraform plan`. Also runs a task's prerequisites ahead of it.

use crate::error::{ConfigError, Result};
use crate::runner::{
    stage, Context, Filesystem, InitFlags, PlanFlags, PlanInvocation, PlanTask, Provisioner,
    RuntimeArgs, DEFAULT_ENSURE_TASK,
};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

impl PlanTask {
    /// Run this task for one set of runtime arguments
    ///
    /// Nothing touches the filesystem until resolution has succeeded, and
    /// terraform is not run unless staging succeeded. The context's working
    /// directory is restored before this returns, on success or failure.
    pub fn invoke(
        &self,
        args: &RuntimeArgs,
        ctx: &mut Context,
        fs: &dyn Filesystem,
        tool: &dyn Provisioner,
    ) -> Result<PlanInvocation> {
        let invocation = self.resolve(args)?;

        ctx.print_status(
            &format!("Planning {}", invocation.configuration_name),
            invocation.no_color,
        );

        let staged = stage(
            fs,
            ctx,
            &invocation.source_directory,
            &invocation.work_directory,
        )?;

        debug!(task = %self.name(), dir = %staged.dir().display(), "initialising");
        tool.init(staged.dir(), &InitFlags::from_invocation(&invocation))?;

        debug!(task = %self.name(), dir = %staged.dir().display(), "planning");
        tool.plan(staged.dir(), &PlanFlags::from_invocation(&invocation))?;

        Ok(invocation)
    }
}

/// Runs named tasks after their prerequisites
///
/// Each task runs at most once per runner. The built-in `terraform:ensure`
/// prerequisite checks that terraform can be run.
pub struct TaskRunner<'a> {
    tasks: &'a BTreeMap<String, PlanTask>,
    fs: &'a dyn Filesystem,
    tool: &'a dyn Provisioner,
    completed: HashSet<String>,
}

impl<'a> TaskRunner<'a> {
    pub fn new(
        tasks: &'a BTreeMap<String, PlanTask>,
        fs: &'a dyn Filesystem,
        tool: &'a dyn Provisioner,
    ) -> Self {
        TaskRunner {
            tasks,
            fs,
            tool,
            completed: HashSet::new(),
        }
    }

    /// Run a task with positional argument values
    pub fn run<V: AsRef<str>>(
        &mut self,
        name: &str,
        values: &[V],
        ctx: &mut Context,
    ) -> Result<()> {
        if self.completed.contains(name) {
            ctx.print_debug(&format!("Skipping task '{}': already run", name));
            return Ok(());
        }

        if ctx.is_task_in_stack(name) {
            let mut chain = ctx.task_stack.clone();
            chain.push(name.to_string());
            return Err(ConfigError::CircularDependency(chain.join(" -> ")).into());
        }

        if name == DEFAULT_ENSURE_TASK && !self.tasks.contains_key(name) {
            ctx.print_debug("Checking terraform is available");
            self.tool.ensure()?;
            self.completed.insert(name.to_string());
            return Ok(());
        }

        let tasks = self.tasks;
        let task = tasks
            .get(name)
            .ok_or_else(|| ConfigError::TaskNotFound(name.to_string()))?;

        ctx.push_task(name.to_string());
        let result = self.run_task(task, values, ctx);
        ctx.pop_task();

        result?;
        self.completed.insert(name.to_string());
        Ok(())
    }

    fn run_task<V: AsRef<str>>(
        &mut self,
        task: &PlanTask,
        values: &[V],
        ctx: &mut Context,
    ) -> Result<()> {
        for prerequisite in task.prerequisites() {
            self.run::<&str>(prerequisite, &[], ctx)?;
        }

        ctx.print_info(&format!("Running task: {}", task.name()));
        let args = task.bind_args(values);
        let result = task.invoke(&args, ctx, self.fs, self.tool);
        if result.is_err() {
            ctx.print_error(&format!("Task '{}' failed", task.name()));
        }
        result.map(|_| ())
    }
}
