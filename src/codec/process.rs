//! Runs an external codec tool to completion.
//!
//! stdout and stderr are each drained on their own scoped reader thread so
//! a chatty tool can never block on a full pipe; both readers are joined
//! before the caller continues.

use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;

use log::{debug, warn};

use crate::error::{JczError, Result};

/// Runs `cmd`, streaming its stdout into a newly created file at `output`.
///
/// The output must not exist yet. It is removed again if the tool fails.
pub(crate) fn run_to_file(mut cmd: Command, tool: &'static str, output: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(output)?;
    let mut writer = BufWriter::new(file);
    let result = run(&mut cmd, tool, &mut writer).and_then(|()| Ok(writer.flush()?));
    if result.is_err() {
        drop(writer);
        if let Err(e) = fs::remove_file(output) {
            debug!("Unable to remove partial output {}: {e}", output.display());
        }
    }
    result
}

/// Runs `cmd` for its side effects, discarding stdout.
pub(crate) fn run_quiet(mut cmd: Command, tool: &'static str) -> Result<()> {
    run(&mut cmd, tool, &mut io::sink())
}

fn run<W: Write + Send>(cmd: &mut Command, tool: &'static str, sink: &mut W) -> Result<()> {
    debug!("Executing: {cmd:?}");
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| JczError::ToolUnavailable { tool, source })?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let (copied, stderr_text) = thread::scope(|s| {
        let out_reader = s.spawn(move || match stdout {
            Some(mut out) => io::copy(&mut out, sink).map(|_| ()),
            None => Ok(()),
        });
        let err_reader = s.spawn(move || {
            let mut buf = Vec::new();
            if let Some(mut err) = stderr {
                if let Err(e) = err.read_to_end(&mut buf) {
                    warn!("Unable to read {tool} stderr: {e}");
                }
            }
            String::from_utf8_lossy(&buf).into_owned()
        });
        let copied = out_reader
            .join()
            .unwrap_or_else(|_| Err(io::Error::other("stdout reader panicked")));
        let stderr_text = err_reader.join().unwrap_or_default();
        (copied, stderr_text)
    });

    let status = child.wait()?;
    if !status.success() {
        let stderr = if stderr_text.trim().is_empty() {
            format!("exited with {status}")
        } else {
            stderr_text
        };
        return Err(JczError::ExternalToolFailure { tool, stderr });
    }
    copied?;
    Ok(())
}
