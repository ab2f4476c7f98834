//! Per-run state shared by every task in one terrask invocation
//!
//! The context carries the working directory terraform is run from. The
//! process-wide current directory is never changed; entering a directory is
//! scoped by a [`WorkingDirGuard`].

use colored::Colorize;
use std::env;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

/// State threaded through task runs
pub struct Context {
    /// Directory terraform is run from; relative task paths start here
    pub working_dir: PathBuf,

    /// Task file path
    pub config_path: Option<PathBuf>,

    /// Tasks currently running, outermost first
    pub task_stack: Vec<String>,

    /// Verbosity level
    pub verbosity: Verbosity,
}

/// How much terrask itself prints
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Silent = 0,
    Quiet = 1,
    Normal = 2,
    Verbose = 3,
}

impl Context {
    /// Create a new context rooted at the process current directory
    pub fn new() -> Self {
        Context {
            working_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_path: None,
            task_stack: Vec::new(),
            verbosity: Verbosity::Normal,
        }
    }

    /// Root the context at `dir`
    pub fn with_working_dir(mut self, dir: PathBuf) -> Self {
        self.working_dir = dir;
        self
    }

    /// Set the task file path
    pub fn with_config_path(mut self, path: PathBuf) -> Self {
        self.config_path = Some(path);
        self
    }

    /// Set verbosity level
    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Enter a directory relative to the current working directory
    ///
    /// The previous working directory comes back when the guard is dropped,
    /// whether the work done under it succeeded or not.
    pub fn enter(&mut self, dir: &Path) -> WorkingDirGuard<'_> {
        let entered = self.working_dir.join(dir);
        let previous = std::mem::replace(&mut self.working_dir, entered);
        WorkingDirGuard {
            ctx: self,
            previous: Some(previous),
        }
    }

    /// Mark a task as running
    pub fn push_task(&mut self, task_name: String) {
        self.task_stack.push(task_name);
    }

    /// Mark the innermost running task as finished
    pub fn pop_task(&mut self) -> Option<String> {
        self.task_stack.pop()
    }

    /// Whether `task_name` is already running further up the chain
    pub fn is_task_in_stack(&self, task_name: &str) -> bool {
        self.task_stack.iter().any(|t| t == task_name)
    }

    /// Get the directory for the task file (or current dir)
    pub fn config_dir(&self) -> PathBuf {
        self.config_path
            .as_ref()
            .and_then(|p| p.parent())
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| self.working_dir.clone())
    }

    /// Print a task status line, cyan unless color is disabled
    pub fn print_status(&self, message: &str, no_color: bool) {
        if self.verbosity >= Verbosity::Normal {
            if no_color {
                println!("{}", message);
            } else {
                println!("{}", message.cyan());
            }
        }
    }

    /// Progress line, shown at normal verbosity
    pub fn print_info(&self, message: &str) {
        if self.verbosity >= Verbosity::Normal {
            eprintln!("[INFO] {}", message);
        }
    }

    /// Failure line, hidden only when silent
    pub fn print_error(&self, message: &str) {
        if self.verbosity >= Verbosity::Quiet {
            eprintln!("[ERROR] {}", message);
        }
    }

    /// Extra detail for `-v`
    pub fn print_debug(&self, message: &str) {
        if self.verbosity >= Verbosity::Verbose {
            eprintln!("[DEBUG] {}", message);
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

/// Scoped working directory; restores the previous one on drop
pub struct WorkingDirGuard<'a> {
    ctx: &'a mut Context,
    previous: Option<PathBuf>,
}

impl WorkingDirGuard<'_> {
    /// The directory entered
    pub fn dir(&self) -> &Path {
        &self.ctx.working_dir
    }
}

impl Deref for WorkingDirGuard<'_> {
    type Target = Context;

    fn deref(&self) -> &Context {
        self.ctx
    }
}

impl DerefMut for WorkingDirGuard<'_> {
    fn deref_mut(&mut self) -> &mut Context {
        self.ctx
    }
}

impl Drop for WorkingDirGuard<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            self.ctx.working_dir = previous;
        }
    }
}
