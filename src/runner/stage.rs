//! Staging of the source configuration tree
//!
//! Before terraform runs, the source directory is copied into
//! `work_directory/source_directory` so that terraform's own files
//! (`.terraform`, plan output, lock files) never land in the source tree.

use crate::error::{StagingError, StagingResult};
use crate::runner::{Context, WorkingDirGuard};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Filesystem operations needed to stage a configuration
pub trait Filesystem {
    /// Remove a directory and everything under it; a missing directory is fine
    fn clean(&self, directory: &Path) -> StagingResult<()>;

    /// Create a directory and all of its missing parents
    fn make_directories(&self, path: &Path) -> StagingResult<()>;

    /// Copy a file or directory tree to a destination that does not exist yet
    fn copy_recursive(&self, source: &Path, destination: &Path) -> StagingResult<()>;

    /// Fail if `destination` lies inside `source`
    ///
    /// Compares paths lexically; implementations that can see the disk should
    /// compare resolved paths instead.
    fn check_not_nested(&self, source: &Path, destination: &Path) -> StagingResult<()> {
        if normalize(destination).starts_with(normalize(source)) {
            return Err(StagingError::CopyIntoItself {
                from: source.to_path_buf(),
                to: destination.to_path_buf(),
            });
        }
        Ok(())
    }
}

/// [`Filesystem`] on local disk, resolving relative paths against a root
#[derive(Debug, Clone)]
pub struct LocalFilesystem {
    root: PathBuf,
}

impl LocalFilesystem {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalFilesystem { root: root.into() }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}

impl Filesystem for LocalFilesystem {
    fn check_not_nested(&self, source: &Path, destination: &Path) -> StagingResult<()> {
        let from = canonicalize_existing(&self.resolve(source));
        let to = canonicalize_existing(&self.resolve(destination));
        if to.starts_with(&from) {
            return Err(StagingError::CopyIntoItself {
                from: source.to_path_buf(),
                to: destination.to_path_buf(),
            });
        }
        Ok(())
    }

    fn clean(&self, directory: &Path) -> StagingResult<()> {
        let path = self.resolve(directory);
        match fs::remove_dir_all(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StagingError::Clean { path, source }),
        }
    }

    fn make_directories(&self, path: &Path) -> StagingResult<()> {
        let path = self.resolve(path);
        fs::create_dir_all(&path).map_err(|source| StagingError::CreateDirectories { path, source })
    }

    fn copy_recursive(&self, source: &Path, destination: &Path) -> StagingResult<()> {
        self.check_not_nested(source, destination)?;

        let from = self.resolve(source);
        let to = self.resolve(destination);

        let metadata = fs::metadata(&from).map_err(|e| StagingError::Copy {
            from: from.clone(),
            to: to.clone(),
            source: e,
        })?;

        if metadata.is_dir() {
            copy_dir_recursive(&from, &to)
        } else {
            fs::copy(&from, &to).map(|_| ()).map_err(|e| StagingError::Copy {
                from,
                to,
                source: e,
            })
        }
    }
}

/// Lexically normalized path: `.` dropped, `..` folded where possible
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let last = normalized.components().next_back();
                if matches!(last, Some(Component::Normal(_))) {
                    normalized.pop();
                } else {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// Canonical form of a path that may not exist yet
///
/// The longest existing ancestor is canonicalized and the rest appended.
fn canonicalize_existing(path: &Path) -> PathBuf {
    let mut existing = path.to_path_buf();
    let mut rest = Vec::new();
    loop {
        if let Ok(canonical) = existing.canonicalize() {
            return rest.iter().rev().fold(canonical, |acc, part| acc.join(part));
        }
        let name = existing.file_name().map(|n| n.to_os_string());
        match (name, existing.parent()) {
            (Some(name), Some(parent)) => {
                rest.push(name);
                existing = parent.to_path_buf();
            }
            _ => return normalize(path),
        }
    }
}

/// Recursively copy directory contents
fn copy_dir_recursive(src: &Path, dst: &Path) -> StagingResult<()> {
    let copy_error = |source: io::Error| StagingError::Copy {
        from: src.to_path_buf(),
        to: dst.to_path_buf(),
        source,
    };

    if !dst.exists() {
        fs::create_dir_all(dst).map_err(copy_error)?;
    }

    for entry in fs::read_dir(src).map_err(copy_error)? {
        let entry = entry.map_err(copy_error)?;
        let path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if path.is_dir() {
            copy_dir_recursive(&path, &dst_path)?;
        } else {
            fs::copy(&path, &dst_path).map_err(|source| StagingError::Copy {
                from: path.clone(),
                to: dst_path.clone(),
                source,
            })?;
        }
    }

    Ok(())
}

/// Stage `source_directory` under `work_directory` and enter it
///
/// Refuses a work directory inside the source directory, then cleans `work_directory/source_directory`, creates its parent chain, copies
/// the source tree into it and returns a guard with the context's working
/// directory set to the staged copy. Staging twice yields the same tree.
///
/// Two invocations staging the same directory at the same time will corrupt
/// each other; callers must not do that.
pub fn stage<'a>(
    fs: &dyn Filesystem,
    ctx: &'a mut Context,
    source_directory: &Path,
    work_directory: &Path,
) -> StagingResult<WorkingDirGuard<'a>> {
    let configuration_directory = work_directory.join(source_directory);

    // Nothing is touched when the work directory sits inside the source
    fs.check_not_nested(source_directory, &configuration_directory)?;

    debug!(directory = %configuration_directory.display(), "cleaning");
    fs.clean(&configuration_directory)?;

    if let Some(parent) = configuration_directory.parent() {
        if !parent.as_os_str().is_empty() {
            debug!(directory = %parent.display(), "creating parent directories");
            fs.make_directories(parent)?;
        }
    }

    debug!(
        from = %source_directory.display(),
        to = %configuration_directory.display(),
        "copying"
    );
    fs.copy_recursive(source_directory, &configuration_directory)?;

    Ok(ctx.enter(&configuration_directory))
}
