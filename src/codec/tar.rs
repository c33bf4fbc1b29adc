use std::fs;
use std::path::{self, Path, PathBuf};
use std::process::Command;

use log::{debug, info};

use super::{Codec, CodecConfig, CodecName, process, report_output};
use crate::error::{JczError, Result};
use crate::naming;
use crate::relocate;

/// Archiver backed by the system `tar`. Accepts directories and has no
/// notion of a compression level.
#[derive(Debug, Clone)]
pub struct TarCodec {
    config: CodecConfig,
}

impl Default for TarCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl TarCodec {
    pub fn new() -> Self {
        Self {
            config: CodecConfig::new(CodecName::Tar),
        }
    }

    /// Creates `output` from `members`, each resolved relative to `dir`.
    fn create_archive(&self, output: &Path, dir: &Path, members: &[PathBuf]) -> Result<()> {
        // The archive path is handed to tar before `-C`, so make it absolute.
        let archive = path::absolute(output)?;
        if fs::symlink_metadata(&archive).is_ok() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("{} already exists", archive.display()),
            )
            .into());
        }
        let mut cmd = Command::new(CodecName::Tar.program());
        cmd.arg("-cf").arg(&archive).arg("-C").arg(dir).args(members);
        let result = process::run_quiet(cmd, CodecName::Tar.program());
        if result.is_err() {
            if let Err(e) = fs::remove_file(&archive) {
                debug!("Unable to remove partial archive {}: {e}", archive.display());
            }
        }
        result
    }

    fn finish(&self, output: PathBuf) -> Result<PathBuf> {
        let output = relocate::relocate_if_needed(output, self.config.move_to.as_deref())?;
        info!("Compressed file: {}", output.display());
        report_output(&self.config, &output);
        Ok(output)
    }
}

impl Codec for TarCodec {
    fn name(&self) -> CodecName {
        CodecName::Tar
    }

    fn config(&self) -> &CodecConfig {
        &self.config
    }

    fn config_mut(&mut self) -> &mut CodecConfig {
        &mut self.config
    }

    fn compress(&self, input: &Path) -> Result<PathBuf> {
        debug!("Compress {} with tar", input.display());
        let input = naming::trim_trailing_slash(input);
        let output = naming::output_name(&input, self.suffix(), self.config.timestamp);

        let parent = match input.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let base = input.file_name().ok_or_else(|| JczError::NotAFile {
            path: input.clone(),
            codec: CodecName::Tar,
        })?;
        debug!("Tar {} to {}", input.display(), output.display());
        self.create_archive(&output, &parent, &[PathBuf::from(base)])?;
        self.finish(output)
    }

    fn decompress(&self, input: &Path) -> Result<PathBuf> {
        debug!("TAR.decompress: {}", input.display());
        let output =
            naming::strip_suffix(input, self.suffix()).ok_or_else(|| JczError::SuffixMismatch {
                path: input.to_path_buf(),
                expected: self.suffix(),
            })?;

        // Extract straight into the relocation target instead of moving afterwards.
        let dest = match (&self.config.move_to, output.parent()) {
            (Some(dir), _) => dir.clone(),
            (None, Some(p)) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut cmd = Command::new(CodecName::Tar.program());
        cmd.arg("-xf").arg(input).arg("-C").arg(&dest);
        process::run_quiet(cmd, CodecName::Tar.program())?;

        let output = match &self.config.move_to {
            Some(dir) => dir.join(output.file_name().unwrap_or_default()),
            None => output,
        };
        info!("Decompressed file: {}", output.display());
        report_output(&self.config, &output);
        Ok(output)
    }

    fn compress_multiple(&self, package_name: &str, source_dir: &Path) -> Result<PathBuf> {
        debug!("Compress files in {} with tar", source_dir.display());
        let source_dir = naming::trim_trailing_slash(source_dir);
        let package = match source_dir.parent() {
            Some(parent) => parent.join(package_name),
            None => PathBuf::from(package_name),
        };
        let output = naming::output_name(&package, self.suffix(), self.config.timestamp);

        let mut members = fs::read_dir(&source_dir)?
            .map(|entry| entry.map(|e| PathBuf::from(e.file_name())))
            .collect::<std::io::Result<Vec<_>>>()?;
        members.sort();
        debug!("Tar {}/{:?} to {}", source_dir.display(), members, output.display());

        self.create_archive(&output, &source_dir, &members)?;
        self.finish(output)
    }
}
