//! Error taxonomy shared by the codec backends, the chain resolver,
//! the collection packager and the orchestrator.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::codec::CodecName;

/// Result alias used across the core.
pub type Result<T> = std::result::Result<T, JczError>;

#[derive(Debug, Error)]
pub enum JczError {
    #[error("Compress command '{0}' is invalid (expected gzip, bzip2, xz, tar, tgz, txz or tbz2)")]
    InvalidCodec(String),

    #[error("Compression level {level} is out of range for {codec}")]
    InvalidCompressionLevel { codec: CodecName, level: i32 },

    #[error("Invalid timestamp option {0} (expected 0, 1, 2 or 3)")]
    InvalidTimestampOption(i64),

    #[error("Relocation target {path:?} is invalid: {reason}")]
    InvalidRelocationTarget { path: PathBuf, reason: &'static str },

    #[error("No input files")]
    NoInputFiles,

    #[error("{0:?} is not found")]
    MissingInput(PathBuf),

    #[error("{path:?} is a directory and can not be compressed by {codec}")]
    NotAFile { path: PathBuf, codec: CodecName },

    #[error("{path:?}: suffix is not {expected}")]
    SuffixMismatch { path: PathBuf, expected: &'static str },

    #[error("Can not relocate or collect files that have the same name: {}", .0.join(", "))]
    NameCollision(Vec<String>),

    #[error("{tool} failed: {}", .stderr.trim_end())]
    ExternalToolFailure { tool: &'static str, stderr: String },

    #[error("Unable to run {tool}: {source}")]
    ToolUnavailable {
        tool: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("{codec} does not support {operation}")]
    Unsupported {
        codec: CodecName,
        operation: &'static str,
    },

    #[error("{step:?} did not shorten {input:?}; refusing to continue the chain")]
    ChainStalled { input: PathBuf, step: PathBuf },

    #[error("{path:?}: {source}")]
    Unwrap {
        path: PathBuf,
        #[source]
        source: Box<JczError>,
    },

    #[error("Package name is empty")]
    PackageNameEmpty,

    #[error("{0:?} exists and can not be used as package name")]
    PackageNameCollision(PathBuf),

    #[error("No input files to collect")]
    NoInputs,

    #[error("Job for {0:?} was aborted before it finished")]
    JobAborted(PathBuf),

    #[error(transparent)]
    Io(#[from] io::Error),
}
