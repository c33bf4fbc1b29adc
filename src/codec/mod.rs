//! Codec backends and the extension-driven codec factory.
//!
//! Each backend wraps one external tool behind the [`Codec`] capability
//! contract. Callers never look at the concrete type: the factory hands out
//! `Box<dyn Codec>` and everything downstream talks to the trait.

mod process;
mod stream;
mod tar;

use std::fmt;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{JczError, Result};
use crate::naming::TimestampOption;
use crate::relocate;

pub use stream::StreamCodec;
pub use tar::TarCodec;

/// Identity of a codec backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodecName {
    Gzip,
    Bzip2,
    Xz,
    Tar,
}

impl CodecName {
    /// Suffix appended on compression and expected on decompression.
    pub fn suffix(self) -> &'static str {
        match self {
            CodecName::Gzip => "gz",
            CodecName::Bzip2 => "bz2",
            CodecName::Xz => "xz",
            CodecName::Tar => "tar",
        }
    }

    /// Name of the external executable.
    pub fn program(self) -> &'static str {
        match self {
            CodecName::Gzip => "gzip",
            CodecName::Bzip2 => "bzip2",
            CodecName::Xz => "xz",
            CodecName::Tar => "tar",
        }
    }

    /// Valid compression levels, `None` for codecs without a level.
    pub fn level_range(self) -> Option<RangeInclusive<i32>> {
        match self {
            CodecName::Gzip | CodecName::Bzip2 => Some(1..=9),
            CodecName::Xz => Some(0..=9),
            CodecName::Tar => None,
        }
    }

    pub fn default_level(self) -> i32 {
        match self {
            CodecName::Gzip | CodecName::Xz => 6,
            CodecName::Bzip2 => 9,
            CodecName::Tar => 0,
        }
    }

    /// Whether the codec can take a directory as its input.
    pub fn archives_directories(self) -> bool {
        self == CodecName::Tar
    }
}

impl fmt::Display for CodecName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CodecName::Gzip => "GZIP",
            CodecName::Bzip2 => "BZIP2",
            CodecName::Xz => "XZ",
            CodecName::Tar => "TAR",
        };
        f.write_str(name)
    }
}

/// Configuration owned by one codec instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecConfig {
    pub level: i32,
    pub timestamp: TimestampOption,
    /// Directory the finished output is moved into; `None` leaves it beside the input.
    pub move_to: Option<PathBuf>,
    /// Log the size of each finished artifact.
    pub show_output_size: bool,
}

impl CodecConfig {
    pub fn new(name: CodecName) -> Self {
        Self {
            level: name.default_level(),
            timestamp: TimestampOption::None,
            move_to: None,
            show_output_size: false,
        }
    }
}

/// Capability contract shared by every codec backend.
///
/// The setters validate before they mutate: a rejected value leaves the
/// previous configuration in place.
pub trait Codec: Send + Sync {
    fn name(&self) -> CodecName;

    fn config(&self) -> &CodecConfig;

    fn config_mut(&mut self) -> &mut CodecConfig;

    /// Compresses `input` into a new file named by [`crate::naming::output_name`],
    /// relocating it when a target is configured.
    fn compress(&self, input: &Path) -> Result<PathBuf>;

    /// Reverses [`Codec::compress`]: the output is `input` without the codec suffix.
    fn decompress(&self, input: &Path) -> Result<PathBuf>;

    /// Archives every direct child of `source_dir` into one file named after
    /// `package_name`. Only archiving codecs support this.
    fn compress_multiple(&self, _package_name: &str, _source_dir: &Path) -> Result<PathBuf> {
        Err(JczError::Unsupported {
            codec: self.name(),
            operation: "compressing multiple files",
        })
    }

    fn suffix(&self) -> &'static str {
        self.name().suffix()
    }

    /// Returns whether `level` was accepted.
    fn set_compression_level(&mut self, level: i32) -> bool {
        match self.name().level_range() {
            Some(range) if range.contains(&level) => {
                self.config_mut().level = level;
                true
            }
            Some(_) => false,
            None => true,
        }
    }

    fn set_timestamp_option(&mut self, option: TimestampOption) {
        self.config_mut().timestamp = option;
    }

    fn set_move_to(&mut self, dir: &Path) -> Result<()> {
        relocate::check_move_to(dir)?;
        self.config_mut().move_to = Some(dir.to_path_buf());
        Ok(())
    }

    fn set_show_output_size(&mut self, show: bool) {
        self.config_mut().show_output_size = show;
    }
}

/// Instantiates the backend for `name` with its default configuration.
pub fn create(name: CodecName) -> Box<dyn Codec> {
    match name {
        CodecName::Gzip => Box::new(StreamCodec::gzip()),
        CodecName::Bzip2 => Box::new(StreamCodec::bzip2()),
        CodecName::Xz => Box::new(StreamCodec::xz()),
        CodecName::Tar => Box::new(TarCodec::new()),
    }
}

/// Suffix table consulted by [`resolve`], in priority order.
const SUFFIX_TABLE: [(&str, CodecName); 4] = [
    ("gz", CodecName::Gzip),
    ("tar", CodecName::Tar),
    ("xz", CodecName::Xz),
    ("bz2", CodecName::Bzip2),
];

/// Picks the codec whose suffix ends `path`.
///
/// The match is a plain trailing-characters test: `filegz` selects GZIP
/// just like `file.gz` does.
pub fn detect(path: &Path) -> Option<CodecName> {
    let name = path.to_string_lossy();
    SUFFIX_TABLE
        .iter()
        .find(|(suffix, _)| name.ends_with(suffix))
        .map(|(_, codec)| *codec)
}

/// Codec factory: a fresh backend for `path`, or `None` when no suffix matches.
pub fn resolve(path: &Path) -> Option<Box<dyn Codec>> {
    let codec = detect(path);
    match codec {
        Some(name) => debug!("resolve: {} handles {}", name, path.display()),
        None => debug!("resolve: no codec for {}", path.display()),
    }
    codec.map(create)
}

/// Logs the size of a finished artifact when the codec asks for it.
pub(crate) fn report_output(config: &CodecConfig, output: &Path) {
    if !config.show_output_size {
        return;
    }
    match std::fs::metadata(output) {
        Ok(metadata) => log::info!("{}: {} bytes", output.display(), metadata.len()),
        Err(e) => log::warn!("Unable to stat {}: {e}", output.display()),
    }
}
