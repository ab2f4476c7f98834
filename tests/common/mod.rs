//! Common test utilities

#![allow(dead_code)]

use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use terrask::error::{StagingError, StagingResult, ToolError, ToolResult};
use terrask::runner::{Filesystem, InitFlags, PlanFlags, Provisioner};

/// Create a temporary directory with a terrask.yml file
pub fn create_test_config(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("terrask.yml");
    fs::write(&config_path, content).unwrap();
    (temp_dir, config_path)
}

/// Write a file below `root`, creating parent directories
pub fn write_file(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// One observed side effect
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Clean(PathBuf),
    MakeDirectories(PathBuf),
    Copy(PathBuf, PathBuf),
    Ensure,
    Init(PathBuf, InitFlags),
    Plan(PathBuf, PlanFlags),
}

/// Filesystem and terraform fake that records every call
#[derive(Default)]
pub struct Recorder {
    pub calls: RefCell<Vec<Call>>,
    pub fail_copy: bool,
    pub fail_init: bool,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn init_flags(&self) -> Option<InitFlags> {
        self.calls.borrow().iter().find_map(|c| match c {
            Call::Init(_, flags) => Some(flags.clone()),
            _ => None,
        })
    }

    pub fn plan_flags(&self) -> Option<PlanFlags> {
        self.calls.borrow().iter().find_map(|c| match c {
            Call::Plan(_, flags) => Some(flags.clone()),
            _ => None,
        })
    }

    pub fn touched_filesystem(&self) -> bool {
        self.calls.borrow().iter().any(|c| {
            matches!(
                c,
                Call::Clean(_) | Call::MakeDirectories(_) | Call::Copy(_, _)
            )
        })
    }

    pub fn ran_terraform(&self) -> bool {
        self.calls
            .borrow()
            .iter()
            .any(|c| matches!(c, Call::Init(..) | Call::Plan(..)))
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }
}

impl Filesystem for Recorder {
    fn clean(&self, directory: &Path) -> StagingResult<()> {
        self.record(Call::Clean(directory.to_path_buf()));
        Ok(())
    }

    fn make_directories(&self, path: &Path) -> StagingResult<()> {
        self.record(Call::MakeDirectories(path.to_path_buf()));
        Ok(())
    }

    fn copy_recursive(&self, source: &Path, destination: &Path) -> StagingResult<()> {
        self.record(Call::Copy(source.to_path_buf(), destination.to_path_buf()));
        if self.fail_copy {
            return Err(StagingError::Copy {
                from: source.to_path_buf(),
                to: destination.to_path_buf(),
                source: io::Error::new(io::ErrorKind::NotFound, "no such directory"),
            });
        }
        Ok(())
    }
}

impl Provisioner for Recorder {
    fn ensure(&self) -> ToolResult<()> {
        self.record(Call::Ensure);
        Ok(())
    }

    fn init(&self, dir: &Path, flags: &InitFlags) -> ToolResult<()> {
        self.record(Call::Init(dir.to_path_buf(), flags.clone()));
        if self.fail_init {
            return Err(ToolError::Failed {
                operation: "init".to_string(),
                code: Some(1),
            });
        }
        Ok(())
    }

    fn plan(&self, dir: &Path, flags: &PlanFlags) -> ToolResult<()> {
        self.record(Call::Plan(dir.to_path_buf(), flags.clone()));
        Ok(())
    }
}
