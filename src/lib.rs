//! jcz: compress and decompress files by driving the system's gzip,
//! bzip2, xz and tar tools.
//!
//! This crate provides the codecs, the chain and collection pipelines, and
//! the concurrent batch driver used by the jcz CLI application.

pub mod chain;
pub mod codec;
pub mod commands;
pub mod config;
pub mod error;
pub mod logger;
pub mod naming;
pub mod orchestrator;
pub mod package;
pub mod path_util;
pub mod relocate;

mod constants;

pub use error::{JczError, Result};
