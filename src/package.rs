//! Collection packaging: stage many inputs into one directory, archive it
//! with TAR, optionally compress the archive again, then move the result.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::chain;
use crate::codec::{Codec, TarCodec};
use crate::error::{JczError, Result};
use crate::naming::TimestampOption;
use crate::path_util;
use crate::relocate;

/// Prefix of the staging directory created for each collection.
pub const STAGING_PREFIX: &str = "jcpkg_";

/// One collection job.
///
/// Callers must reject inputs that share a base name beforehand; staging
/// copies every input into the same directory.
pub struct Collection {
    pub package_name: String,
    pub inputs: Vec<PathBuf>,
    /// Second codec applied to the archive, if any.
    pub codec: Option<Box<dyn Codec>>,
    /// Where the final artifact ends up; defaults to `work_dir`.
    pub relocate_to: Option<PathBuf>,
    pub timestamp: TimestampOption,
    /// Archive the inputs as top-level members instead of under `package_name/`.
    pub flatten: bool,
    /// Directory the package name is checked against and staging happens in.
    pub work_dir: PathBuf,
}

impl Collection {
    pub fn new(package_name: impl Into<String>, inputs: Vec<PathBuf>) -> Self {
        Self {
            package_name: package_name.into(),
            inputs,
            codec: None,
            relocate_to: None,
            timestamp: TimestampOption::None,
            flatten: false,
            work_dir: PathBuf::from("."),
        }
    }

    /// Packages all inputs and returns the path of the final artifact.
    ///
    /// The staging directory is removed on every exit path.
    pub fn package(&self) -> Result<PathBuf> {
        if self.package_name.is_empty() {
            return Err(JczError::PackageNameEmpty);
        }
        let claimed = self.work_dir.join(&self.package_name);
        if fs::symlink_metadata(&claimed).is_ok() {
            return Err(JczError::PackageNameCollision(claimed));
        }
        if self.inputs.is_empty() {
            return Err(JczError::NoInputs);
        }

        let staging = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(&self.work_dir)?;
        debug!("Staging {} in {}", self.package_name, staging.path().display());

        let result = self.package_in(staging.path());
        if let Err(e) = staging.close() {
            log::error!("Unable to remove staging directory: {e}");
        }
        result
    }

    fn package_in(&self, staging: &Path) -> Result<PathBuf> {
        let package_dir = staging.join(&self.package_name);
        fs::create_dir(&package_dir)?;
        for input in &self.inputs {
            let dest = package_dir.join(path_util::base_name(input));
            debug!("Copy {} to {}", input.display(), dest.display());
            path_util::copy_recursive(input, &dest)?;
        }

        let mut tar = TarCodec::new();
        tar.set_timestamp_option(self.timestamp);
        let archive = if self.flatten {
            tar.compress_multiple(&self.package_name, &package_dir)?
        } else {
            tar.compress(&package_dir)?
        };

        let artifact = match &self.codec {
            Some(codec) => chain::compress_then_discard(codec.as_ref(), &archive)?,
            None => archive,
        };

        let dest = self.relocate_to.as_deref().unwrap_or(&self.work_dir);
        let output = relocate::relocate(&artifact, dest)?;
        info!("Package created: {}", output.display());
        Ok(output)
    }
}
