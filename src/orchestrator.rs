//! Batch driver: one concurrent unit of work per input file, or a single
//! unit for a collection, with every per-file outcome collected.
//!
//! Codec work is blocking (it waits on external processes), so each job is
//! handed to tokio's blocking pool. There is no concurrency cap and no
//! cancellation: a failing job never stops its siblings.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use log::{debug, error, info};

use crate::chain;
use crate::codec::Codec;
use crate::error::{JczError, Result};
use crate::package::Collection;

/// What every job of a batch does with its input.
#[derive(Clone)]
pub enum Operation {
    /// Single-codec compression.
    Compress(Arc<dyn Codec>),
    /// Two-stage compression, e.g. TAR then GZIP.
    CompressChain {
        first: Arc<dyn Codec>,
        second: Arc<dyn Codec>,
    },
    /// Unwrap every recognised suffix.
    Decompress { move_to: Option<PathBuf> },
}

impl Operation {
    fn apply(&self, input: &Path) -> Result<PathBuf> {
        match self {
            Operation::Compress(codec) => codec.compress(input),
            Operation::CompressChain { first, second } => {
                chain::compress_chain(first.as_ref(), second.as_ref(), input)
            }
            Operation::Decompress { move_to } => {
                chain::unwrap_chain(input, move_to.as_deref()).map(|unwrapped| unwrapped.output)
            }
        }
    }
}

/// Terminal state of one job.
#[derive(Debug)]
pub struct JobOutcome {
    pub input: PathBuf,
    pub result: Result<PathBuf>,
}

impl JobOutcome {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

/// Every outcome of a batch, in completion order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<JobOutcome>,
}

impl BatchReport {
    /// A batch succeeds iff every job succeeded.
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(JobOutcome::succeeded)
    }

    pub fn failures(&self) -> impl Iterator<Item = &JobOutcome> {
        self.outcomes.iter().filter(|o| !o.succeeded())
    }

    pub fn outputs(&self) -> impl Iterator<Item = &PathBuf> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    fn record(&mut self, outcome: JobOutcome) {
        match &outcome.result {
            Ok(output) => debug!("{} -> {}", outcome.input.display(), output.display()),
            Err(e) => error!("{e}"),
        }
        self.outcomes.push(outcome);
    }
}

/// Runs `operation` on every input concurrently and waits for all of them.
pub async fn run_batch(operation: Operation, inputs: Vec<PathBuf>) -> BatchReport {
    let operation = Arc::new(operation);
    let mut tasks = FuturesUnordered::new();
    for input in inputs {
        let op = Arc::clone(&operation);
        let job_input = input.clone();
        debug!("Launch job for {}", input.display());
        let handle = tokio::task::spawn_blocking(move || op.apply(&job_input));
        tasks.push(async move { (input, handle.await) });
    }

    let mut report = BatchReport::default();
    while let Some((input, joined)) = tasks.next().await {
        let result = joined.unwrap_or_else(|e| {
            debug!("Job for {} did not finish: {e}", input.display());
            Err(JczError::JobAborted(input.clone()))
        });
        report.record(JobOutcome { input, result });
    }
    info!(
        "{} of {} jobs finished successfully",
        report.outcomes.len() - report.failures().count(),
        report.outcomes.len()
    );
    report
}

/// Runs a collection as the single job of its batch.
pub async fn run_collection(collection: Collection) -> BatchReport {
    let input = PathBuf::from(&collection.package_name);
    let joined = tokio::task::spawn_blocking(move || collection.package()).await;
    let result = joined.unwrap_or_else(|_| Err(JczError::JobAborted(input.clone())));
    let mut report = BatchReport::default();
    report.record(JobOutcome { input, result });
    report
}
