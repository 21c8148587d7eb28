//! Runs the external `git` binary with bounded waits.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::time::Duration;

use once_cell::sync::Lazy;

use crate::errors::{Error, Result};

/// Upper bound on one external git invocation. Process start failures
/// surface synchronously from `spawn`, so only the execution wait is timed.
pub const EXECUTION_TIMEOUT: Duration = Duration::from_secs(10);

static GIT: Lazy<std::result::Result<PathBuf, which::Error>> = Lazy::new(|| which::which("git"));

/// Run `git <args>` in `working_dir` and return its stdout.
///
/// A non-zero exit, a failed spawn, or an execution timeout all raise
/// [`Error::ExternalTool`]; stderr (or stdout as a fallback) is folded into
/// the message.
pub fn run_git(args: &[&str], working_dir: &Path) -> Result<Vec<u8>> {
    let git = GIT
        .as_ref()
        .map_err(|err| Error::ExternalTool(format!("failed to find git: {err}")))?;

    let child = Command::new(git)
        .args(args)
        .current_dir(working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|err| Error::ExternalTool(format!("failed to start git {args:?}: {err}")))?;

    // The child is handed to a waiter thread; on timeout the abandoned wait
    // finishes (and reaps) in the background while the caller gives up.
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let _ = tx.send(child.wait_with_output());
    });

    let output = match rx.recv_timeout(EXECUTION_TIMEOUT) {
        Ok(Ok(output)) => output,
        Ok(Err(err)) => {
            return Err(Error::ExternalTool(format!(
                "failed to run git {args:?}: {err}"
            )))
        }
        Err(_) => {
            return Err(Error::ExternalTool(format!(
                "git {args:?} did not finish within {EXECUTION_TIMEOUT:?}"
            )))
        }
    };

    if !output.status.success() {
        let mut detail = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if detail.is_empty() {
            detail = String::from_utf8_lossy(&output.stdout).trim().to_string();
        }
        return Err(Error::ExternalTool(format!(
            "failed to run git {:?} [{}]: {}",
            args,
            output.status.code().unwrap_or(-1),
            detail
        )));
    }

    Ok(output.stdout)
}
