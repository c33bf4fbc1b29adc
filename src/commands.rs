//! Command-line interface definition for jcz.
//!
//! This module defines the flags, turns them (plus the optional settings
//! file) into a validated [`Plan`], and runs that plan on a tokio runtime.
//! Every configuration error is raised here, before any job starts.

use crate::codec::{self, Codec, CodecName};
use crate::config::Settings;
use crate::error::JczError;
use crate::naming::{self, TimestampOption};
use crate::orchestrator::{self, BatchReport, Operation};
use crate::package::Collection;
use crate::path_util;
use crate::relocate;
use anyhow::{Result, bail};
use clap::Parser;
use log::{debug, warn};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tokio::runtime::Builder;

/// Compress command used when neither the flags nor the settings name one.
pub const DEFAULT_COMMAND: &str = "tgz";

/// Command-line interface definition for jcz.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Files or directories to compress, or archives to decompress.
    pub inputs: Vec<PathBuf>,
    /// Decompress, unwrapping every recognised suffix (.tar.gz -> plain files).
    #[arg(short = 'd', long, conflicts_with_all = ["collect", "collect_flat"])]
    pub decompress: bool,
    /// Move the results into this directory.
    #[arg(short = 'C', long = "move-to", value_name = "DIR")]
    pub move_to: Option<PathBuf>,
    /// Compress command: gzip, bzip2, xz, tar, tgz, txz or tbz2 [default: tgz].
    #[arg(short = 'c', long = "codec", value_name = "CODEC")]
    pub codec: Option<String>,
    /// Compression level.
    #[arg(short, long, allow_negative_numbers = true)]
    pub level: Option<i32>,
    /// Collect all inputs into one archive NAME, under a NAME/ directory.
    #[arg(short = 'a', long, value_name = "NAME", conflicts_with = "collect_flat")]
    pub collect: Option<String>,
    /// Collect all inputs into one archive NAME, without a parent directory.
    #[arg(short = 'A', long = "collect-flat", value_name = "NAME")]
    pub collect_flat: Option<String>,
    /// Timestamp in output names: 0 none, 1 date, 2 date and time, 3 high resolution.
    #[arg(short, long, allow_negative_numbers = true)]
    pub timestamp: Option<i64>,
    /// Log the size of every produced file.
    #[arg(short = 's', long = "show-size")]
    pub show_size: bool,
}

/// Compress commands accepted by `-c`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressCmd {
    Gzip,
    Bzip2,
    Xz,
    Tar,
    Tgz,
    Txz,
    Tbz2,
}

impl CompressCmd {
    /// Whether the command archives with TAR first.
    pub fn archives(self) -> bool {
        matches!(
            self,
            CompressCmd::Tar | CompressCmd::Tgz | CompressCmd::Txz | CompressCmd::Tbz2
        )
    }

    /// The stream codec applied after (or instead of) TAR, if any.
    pub fn stream(self) -> Option<CodecName> {
        match self {
            CompressCmd::Gzip | CompressCmd::Tgz => Some(CodecName::Gzip),
            CompressCmd::Bzip2 | CompressCmd::Tbz2 => Some(CodecName::Bzip2),
            CompressCmd::Xz | CompressCmd::Txz => Some(CodecName::Xz),
            CompressCmd::Tar => None,
        }
    }
}

impl FromStr for CompressCmd {
    type Err = JczError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gzip" => Ok(CompressCmd::Gzip),
            "bzip2" => Ok(CompressCmd::Bzip2),
            "xz" => Ok(CompressCmd::Xz),
            "tar" => Ok(CompressCmd::Tar),
            "tgz" => Ok(CompressCmd::Tgz),
            "txz" => Ok(CompressCmd::Txz),
            "tbz2" => Ok(CompressCmd::Tbz2),
            other => Err(JczError::InvalidCodec(other.to_string())),
        }
    }
}

/// Everything one invocation asks for, flags merged over settings.
#[derive(Debug, Clone, Default)]
pub struct Request {
    pub inputs: Vec<PathBuf>,
    pub decompress: bool,
    pub move_to: Option<PathBuf>,
    pub command: String,
    pub level: Option<i32>,
    pub timestamp: i64,
    /// Package name and whether members are flattened.
    pub collect: Option<(String, bool)>,
    pub show_output_size: bool,
}

impl Request {
    pub fn new(cli: Cli, settings: Settings) -> Self {
        let collect = match (cli.collect, cli.collect_flat) {
            (_, Some(name)) => Some((name, true)),
            (Some(name), None) => Some((name, false)),
            (None, None) => None,
        };
        Self {
            inputs: cli.inputs,
            decompress: cli.decompress,
            move_to: cli.move_to.or(settings.move_to),
            command: cli
                .codec
                .or(settings.codec)
                .unwrap_or_else(|| DEFAULT_COMMAND.to_string()),
            level: cli.level.or(settings.level),
            timestamp: cli
                .timestamp
                .or_else(|| settings.timestamp.map(i64::from))
                .unwrap_or(0),
            collect,
            show_output_size: cli.show_size || settings.show_output_size,
        }
    }
}

/// A validated invocation, ready to run.
pub enum Plan {
    Batch {
        operation: Operation,
        inputs: Vec<PathBuf>,
    },
    Collection(Collection),
}

/// Validates a request and configures its codecs.
///
/// # Errors
/// Any configuration error; nothing has touched the filesystem yet.
pub fn prepare(request: Request) -> Result<Plan, JczError> {
    if request.decompress {
        prepare_decompress(request)
    } else {
        prepare_compress(request)
    }
}

fn prepare_decompress(request: Request) -> Result<Plan, JczError> {
    let inputs = path_util::check_inputs(request.inputs)?;
    for input in &inputs {
        if codec::detect(input).is_none() {
            return Err(JczError::SuffixMismatch {
                path: input.clone(),
                expected: "gz, tar, xz or bz2",
            });
        }
    }

    if let Some(dir) = &request.move_to {
        relocate::check_move_to(dir)?;
        warn!("Moving decompressed files may overwrite existing files");
        let outputs: Vec<PathBuf> = inputs.iter().map(|i| unwrapped_name(i)).collect();
        relocate::check_name_collision(&outputs, TimestampOption::None)?;
    }

    Ok(Plan::Batch {
        operation: Operation::Decompress {
            move_to: request.move_to,
        },
        inputs,
    })
}

fn prepare_compress(request: Request) -> Result<Plan, JczError> {
    let inputs = path_util::check_inputs(request.inputs)?;
    let command = CompressCmd::from_str(&request.command)?;
    let timestamp = TimestampOption::try_from(request.timestamp)?;
    debug!("Using {}", request.command);

    if let Some((package_name, flatten)) = request.collect {
        let duplicates = relocate::duplicate_base_names(&inputs);
        if !duplicates.is_empty() {
            return Err(JczError::NameCollision(duplicates));
        }
        if let Some(dir) = &request.move_to {
            relocate::check_move_to(dir)?;
        }
        let codec = command
            .stream()
            .map(|name| stream_codec(name, request.level, request.show_output_size))
            .transpose()?;
        let mut collection = Collection::new(package_name, inputs);
        collection.codec = codec;
        collection.relocate_to = request.move_to;
        collection.timestamp = timestamp;
        collection.flatten = flatten;
        return Ok(Plan::Collection(collection));
    }

    let last_stage = match command.stream() {
        Some(name) => stream_codec(name, request.level, request.show_output_size)?,
        None => {
            let mut tar = codec::create(CodecName::Tar);
            tar.set_show_output_size(request.show_output_size);
            tar
        }
    };

    let operation = if command.archives() && command.stream().is_some() {
        let mut first = codec::create(CodecName::Tar);
        first.set_timestamp_option(timestamp);
        let mut second = last_stage;
        configure_move_to(second.as_mut(), &inputs, request.move_to.as_deref(), timestamp)?;
        Operation::CompressChain {
            first: Arc::from(first),
            second: Arc::from(second),
        }
    } else {
        let mut codec = last_stage;
        codec.set_timestamp_option(timestamp);
        configure_move_to(codec.as_mut(), &inputs, request.move_to.as_deref(), timestamp)?;
        Operation::Compress(Arc::from(codec))
    };

    Ok(Plan::Batch { operation, inputs })
}

fn stream_codec(name: CodecName, level: Option<i32>, show_size: bool) -> Result<Box<dyn Codec>, JczError> {
    let mut codec = codec::create(name);
    if let Some(level) = level {
        if !codec.set_compression_level(level) {
            return Err(JczError::InvalidCompressionLevel { codec: name, level });
        }
    }
    codec.set_show_output_size(show_size);
    Ok(codec)
}

fn configure_move_to(
    codec: &mut dyn Codec,
    inputs: &[PathBuf],
    move_to: Option<&Path>,
    timestamp: TimestampOption,
) -> Result<(), JczError> {
    let Some(dir) = move_to else {
        return Ok(());
    };
    relocate::check_move_to(dir)?;
    relocate::check_name_collision(inputs, timestamp)?;
    codec.set_move_to(dir)
}

/// Name left once every recognised suffix is stripped.
fn unwrapped_name(input: &Path) -> PathBuf {
    let mut current = input.to_path_buf();
    while let Some(next) = codec::detect(&current).and_then(|name| naming::strip_suffix(&current, name.suffix())) {
        current = next;
    }
    current
}

/// Runs a plan to completion on a multi-threaded runtime.
///
/// # Errors
/// Returns an error if at least one job failed.
pub fn execute(plan: Plan) -> Result<()> {
    let rt = Builder::new_multi_thread().enable_all().build()?;
    let report: BatchReport = rt.block_on(async move {
        match plan {
            Plan::Batch { operation, inputs } => orchestrator::run_batch(operation, inputs).await,
            Plan::Collection(collection) => orchestrator::run_collection(collection).await,
        }
    });

    let failed = report.failures().count();
    if failed > 0 {
        bail!("{failed} of {} jobs failed", report.outcomes.len());
    }
    Ok(())
}
