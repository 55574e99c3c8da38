//! Purpose: Locate the enclosing project root and clear scratch directories under it.
//! Exports: `find_project_root`, `clear_dir`.
//! Invariants: A project root is the nearest directory holding both `src` and `.git` entries.
//! Invariants: `clear_dir` empties a directory but never removes the directory itself.
//! Invariants: Relative start paths resolve against the current directory before the walk.
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::core::error::{Error, ErrorKind, Result};

pub fn find_project_root(start: &Path) -> Result<PathBuf> {
    let resolved = absolute_dir(start)?;
    for dir in resolved.ancestors() {
        if dir.join("src").exists() && dir.join(".git").exists() {
            return Ok(dir.to_path_buf());
        }
    }
    Err(Error::new(ErrorKind::NotFound)
        .with_message("no directory containing both src and .git")
        .with_path(start)
        .with_hint("Run from inside a project checkout or pass --start."))
}

/// Joins `path` onto the current directory and folds `.` and `..` lexically.
fn absolute_dir(path: &Path) -> Result<PathBuf> {
    let joined = std::path::absolute(path).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to resolve path")
            .with_path(path)
            .with_source(err)
    })?;
    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    Ok(out)
}

/// Removes every entry of `path`; relative paths resolve against `root`.
///
/// Returns the resolved directory and the number of entries removed.
pub fn clear_dir(path: &Path, root: &Path) -> Result<(PathBuf, usize)> {
    let dir = if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    };
    if !dir.is_dir() {
        return Err(Error::new(ErrorKind::NotFound)
            .with_message("not a directory")
            .with_path(&dir));
    }

    let io_err = |dir: &Path, err: std::io::Error| {
        Error::new(ErrorKind::Io)
            .with_message("failed to clear directory")
            .with_path(dir)
            .with_source(err)
    };

    let mut removed = 0;
    for entry in fs::read_dir(&dir).map_err(|err| io_err(dir.as_path(), err))? {
        let entry = entry.map_err(|err| io_err(dir.as_path(), err))?;
        let entry_path = entry.path();
        let file_type = entry.file_type().map_err(|err| io_err(entry_path.as_path(), err))?;
        if file_type.is_dir() {
            fs::remove_dir_all(&entry_path).map_err(|err| io_err(entry_path.as_path(), err))?;
        } else {
            fs::remove_file(&entry_path).map_err(|err| io_err(entry_path.as_path(), err))?;
        }
        removed += 1;
    }
    tracing::debug!(dir = %dir.display(), removed, "cleared directory");
    Ok((dir, removed))
}
