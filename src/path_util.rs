use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use walkdir::WalkDir;

use crate::error::{JczError, Result};
use crate::naming::trim_trailing_slash;

/// Checks if the given path exists and is accessible.
///
/// # Errors
/// Returns [`JczError::MissingInput`] naming the problematic path.
pub fn check_path(path: &Path) -> Result<()> {
    fs::symlink_metadata(path).map_err(|_| JczError::MissingInput(path.to_path_buf()))?;
    Ok(())
}

/// Validates the input list of a batch and removes paths naming the same
/// file, keeping the first spelling of each.
pub fn check_inputs(inputs: Vec<PathBuf>) -> Result<Vec<PathBuf>> {
    if inputs.is_empty() {
        return Err(JczError::NoInputFiles);
    }
    let mut seen = HashSet::new();
    let mut checked = Vec::with_capacity(inputs.len());
    for input in inputs {
        check_path(&input)?;
        // Dangling symlinks have no canonical form.
        let key = fs::canonicalize(&input).unwrap_or_else(|_| trim_trailing_slash(&input));
        if seen.insert(key) {
            checked.push(input);
        } else {
            debug!("Skip repeated input {}", input.display());
        }
    }
    Ok(checked)
}

/// Last path component as a string, ignoring a trailing separator.
pub fn base_name(path: &Path) -> String {
    let trimmed = trim_trailing_slash(path);
    trimmed
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| trimmed.to_string_lossy().into_owned())
}

/// Recursively copies a file or a directory tree from `src` to `dest`.
pub fn copy_recursive(src: &Path, dest: &Path) -> io::Result<()> {
    if !src.is_dir() {
        fs::copy(src, dest)?;
        return Ok(());
    }
    for entry in WalkDir::new(src).follow_links(true) {
        let entry = entry.map_err(io::Error::other)?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(io::Error::other)?;
        let target = dest.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
