//! Relocation policy: validating a "move output to D" target, detecting
//! unsafe base-name collisions and moving finished artifacts.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{JczError, Result};
use crate::naming::TimestampOption;

/// Checks that `dir` names an existing directory.
pub fn check_move_to(dir: &Path) -> Result<()> {
    if dir.as_os_str().is_empty() {
        return Err(JczError::InvalidRelocationTarget {
            path: dir.to_path_buf(),
            reason: "directory is not specified",
        });
    }
    let metadata = fs::metadata(dir).map_err(|_| JczError::InvalidRelocationTarget {
        path: dir.to_path_buf(),
        reason: "does not exist",
    })?;
    if !metadata.is_dir() {
        return Err(JczError::InvalidRelocationTarget {
            path: dir.to_path_buf(),
            reason: "is not a directory",
        });
    }
    Ok(())
}

/// Returns the base names shared by two or more inputs, sorted.
pub fn duplicate_base_names(inputs: &[PathBuf]) -> Vec<String> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for input in inputs {
        let base = crate::path_util::base_name(input);
        *counts.entry(base).or_default() += 1;
    }
    counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(name, _)| name)
        .collect()
}

/// Refuses to send same-named outputs into one directory unless the
/// timestamp option keeps their names apart.
pub fn check_name_collision(inputs: &[PathBuf], option: TimestampOption) -> Result<()> {
    if option.disambiguates() {
        return Ok(());
    }
    let duplicates = duplicate_base_names(inputs);
    if duplicates.is_empty() {
        Ok(())
    } else {
        Err(JczError::NameCollision(duplicates))
    }
}

/// Moves `source` into `dir`, returning the new path. An entry of the
/// same name already in `dir` is never replaced.
pub fn relocate(source: &Path, dir: &Path) -> Result<PathBuf> {
    let file_name = source
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "no file name to relocate"))?;
    let dest = dir.join(file_name);
    if fs::symlink_metadata(&dest).is_ok() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} already exists", dest.display()),
        )
        .into());
    }
    debug!("Move {} to {}", source.display(), dir.display());
    move_path(source, &dest)?;
    Ok(dest)
}

/// Moves `source` to `dest` if a relocation target is configured,
/// otherwise leaves it where it is.
pub fn relocate_if_needed(source: PathBuf, move_to: Option<&Path>) -> Result<PathBuf> {
    match move_to {
        Some(dir) => relocate(&source, dir),
        None => Ok(source),
    }
}

fn move_path(source: &Path, dest: &Path) -> io::Result<()> {
    match fs::rename(source, dest) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            copy_across(source, dest)?;
            if source.is_dir() {
                fs::remove_dir_all(source)
            } else {
                fs::remove_file(source)
            }
        }
        Err(e) => Err(e),
    }
}

fn copy_across(source: &Path, dest: &Path) -> io::Result<()> {
    if source.is_dir() {
        crate::path_util::copy_recursive(source, dest)
    } else {
        fs::copy(source, dest).map(|_| ())
    }
}
