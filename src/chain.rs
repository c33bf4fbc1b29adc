//! Compound transforms: unwrapping `.tar.gz`-style names step by step, and
//! the two-stage TAR-then-compress pipeline.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;

use crate::codec::{self, Codec};
use crate::error::{JczError, Result};

/// Outcome of a successful [`unwrap_chain`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unwrapped {
    /// Output of the last decompression step.
    pub output: PathBuf,
    /// Intermediate files produced along the way and removed afterwards.
    pub intermediates: Vec<PathBuf>,
}

/// Fully decompresses `input`, keeping only the last result.
///
/// Each produced codec is given `move_to` as its relocation target.
pub fn unwrap_chain(input: &Path, move_to: Option<&Path>) -> Result<Unwrapped> {
    unwrap_chain_with(input, |path| {
        let mut codec = codec::resolve(path)?;
        if let Some(dir) = move_to {
            codec.config_mut().move_to = Some(dir.to_path_buf());
        }
        Some(codec)
    })
}

/// [`unwrap_chain`] over an arbitrary codec factory.
///
/// Stops when the factory no longer recognises the current name. Every
/// step must shorten the file name, which bounds the number of steps. On
/// failure every produced file is removed, including the input of the
/// failing step, and the error carries `input` as context.
pub fn unwrap_chain_with<F>(input: &Path, mut factory: F) -> Result<Unwrapped>
where
    F: FnMut(&Path) -> Option<Box<dyn Codec>>,
{
    let mut current = input.to_path_buf();
    let mut intermediates = Vec::new();
    let mut steps = 0usize;

    let result = loop {
        let Some(codec) = factory(&current) else {
            break Ok(());
        };
        debug!("Decompress {} with {}", current.display(), codec.name());
        let next = match codec.decompress(&current) {
            Ok(next) => next,
            // Permissive match on an already unwrapped name, e.g. `bigz`.
            Err(JczError::SuffixMismatch { .. }) if steps > 0 => break Ok(()),
            Err(e) => {
                // The failing step's input was produced by an earlier step.
                if current != input {
                    intermediates.push(current.clone());
                }
                break Err(e);
            }
        };
        steps += 1;
        if current != input {
            intermediates.push(current.clone());
        }
        if !shortens(&current, &next) {
            // Still counts as produced, so it is cleaned up below.
            if next != input && !intermediates.contains(&next) {
                intermediates.push(next.clone());
            }
            break Err(JczError::ChainStalled {
                input: current.clone(),
                step: next,
            });
        }
        current = next;
    };

    for tmp in &intermediates {
        debug!("Remove intermediate file {}", tmp.display());
        remove_intermediate(tmp);
    }

    match result {
        Ok(()) if steps == 0 => Err(JczError::Unwrap {
            path: input.to_path_buf(),
            source: Box::new(JczError::SuffixMismatch {
                path: input.to_path_buf(),
                expected: "gz, tar, xz or bz2",
            }),
        }),
        Ok(()) => Ok(Unwrapped {
            output: current,
            intermediates,
        }),
        Err(source) => Err(JczError::Unwrap {
            path: input.to_path_buf(),
            source: Box::new(source),
        }),
    }
}

/// Runs `first` on `input`, then `second` on its output. The intermediate
/// is removed whether or not the second stage succeeds; `second` is never
/// run when `first` fails.
pub fn compress_chain(first: &dyn Codec, second: &dyn Codec, input: &Path) -> Result<PathBuf> {
    let intermediate = first.compress(input)?;
    debug!(
        "{} produced {}, handing over to {}",
        first.name(),
        intermediate.display(),
        second.name()
    );
    compress_then_discard(second, &intermediate)
}

/// Compresses `intermediate` with `codec` and removes it afterwards,
/// whatever the outcome.
pub fn compress_then_discard(codec: &dyn Codec, intermediate: &Path) -> Result<PathBuf> {
    let result = codec.compress(intermediate);
    remove_intermediate(intermediate);
    result
}

/// Relocation may lengthen the directory part, so only file names count.
fn shortens(from: &Path, to: &Path) -> bool {
    match (from.file_name(), to.file_name()) {
        (Some(from), Some(to)) => to.len() < from.len(),
        _ => false,
    }
}

fn remove_intermediate(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("Unable to remove {}: {e}", path.display()),
    }
}
