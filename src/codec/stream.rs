use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, info};

use super::{Codec, CodecConfig, CodecName, process, report_output};
use crate::error::{JczError, Result};
use crate::naming;
use crate::relocate;

/// Single-stream compressor (gzip, bzip2, xz). These tools only handle
/// regular files; directories have to go through TAR first.
#[derive(Debug, Clone)]
pub struct StreamCodec {
    name: CodecName,
    config: CodecConfig,
}

impl StreamCodec {
    fn new(name: CodecName) -> Self {
        Self {
            name,
            config: CodecConfig::new(name),
        }
    }

    pub fn gzip() -> Self {
        Self::new(CodecName::Gzip)
    }

    pub fn bzip2() -> Self {
        Self::new(CodecName::Bzip2)
    }

    pub fn xz() -> Self {
        Self::new(CodecName::Xz)
    }

    fn command(&self) -> Command {
        Command::new(self.name.program())
    }

    fn dump_config(&self) {
        debug!(
            "{}: level={} timestamp={} move_to={:?}",
            self.name, self.config.level, self.config.timestamp, self.config.move_to
        );
    }
}

impl Codec for StreamCodec {
    fn name(&self) -> CodecName {
        self.name
    }

    fn config(&self) -> &CodecConfig {
        &self.config
    }

    fn config_mut(&mut self) -> &mut CodecConfig {
        &mut self.config
    }

    fn compress(&self, input: &Path) -> Result<PathBuf> {
        debug!("Compress {} with {}", input.display(), self.name.program());
        if input.is_dir() {
            return Err(JczError::NotAFile {
                path: input.to_path_buf(),
                codec: self.name,
            });
        }
        let output = naming::output_name(input, self.suffix(), self.config.timestamp);
        self.dump_config();

        let mut cmd = self.command();
        cmd.arg(format!("-{}", self.config.level))
            .arg("--keep")
            .arg("--stdout")
            .arg(input);
        process::run_to_file(cmd, self.name.program(), &output)?;

        let output = relocate::relocate_if_needed(output, self.config.move_to.as_deref())?;
        info!("Compressed file: {}", output.display());
        report_output(&self.config, &output);
        Ok(output)
    }

    fn decompress(&self, input: &Path) -> Result<PathBuf> {
        debug!("{}.decompress: {}", self.name, input.display());
        let output =
            naming::strip_suffix(input, self.suffix()).ok_or_else(|| JczError::SuffixMismatch {
                path: input.to_path_buf(),
                expected: self.suffix(),
            })?;

        let mut cmd = self.command();
        cmd.arg("--decompress").arg("--stdout").arg(input);
        process::run_to_file(cmd, self.name.program(), &output)?;

        let output = relocate::relocate_if_needed(output, self.config.move_to.as_deref())?;
        info!("Decompressed file: {}", output.display());
        report_output(&self.config, &output);
        Ok(output)
    }
}
