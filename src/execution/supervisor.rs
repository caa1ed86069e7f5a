//! Timeout supervisor.
//!
//! Drives a [`StreamCapture`] under an optional deadline. The supervisor is a
//! two-outcome state machine: the child either exits on its own
//! ([`Outcome::Exited`]) or the deadline fires first ([`Outcome::TimedOut`]),
//! in which case the child is killed, the pipes get one short last drain, and
//! the partial output is returned inside a [`TimeoutError`].

use std::process::ExitStatus;
use std::time::Duration;

use super::capture::StreamCapture;
use super::command::{Command, ExecutionOptions};
use super::result::ExecutionResult;
use crate::error::{SubcallError, TimeoutError};
use crate::Result;

/// How long output is still collected after a timeout kill.
pub const KILL_GRACE_PERIOD: Duration = Duration::from_millis(100);

enum Outcome {
    Exited(ExitStatus),
    TimedOut(Duration),
}

/// Run `command` to completion and capture its output.
///
/// A non-zero exit code is not an error here; see
/// [`crate::policy::Caller`] for the policies built on top.
///
/// # Errors
///
/// - [`SubcallError::Launch`] if the program cannot be started.
/// - [`SubcallError::Timeout`] if `options.timeout` elapses first.
/// - [`SubcallError::Io`] if talking to the child fails.
pub async fn execute(command: &Command, options: &ExecutionOptions) -> Result<ExecutionResult> {
    let mut capture = StreamCapture::spawn(command, options)?;
    let input = options.input.as_deref();

    let outcome = match options.timeout {
        None => Outcome::Exited(capture.run_to_completion(input).await?),
        Some(limit) => match tokio::time::timeout(limit, capture.run_to_completion(input)).await {
            Ok(status) => Outcome::Exited(status?),
            Err(_elapsed) => Outcome::TimedOut(limit),
        },
    };

    match outcome {
        Outcome::Exited(status) => Ok(capture.into_result(command, status)),
        Outcome::TimedOut(limit) => {
            capture.kill();
            // Whatever is left after the grace period is dropped with the pipes.
            let _ = tokio::time::timeout(KILL_GRACE_PERIOD, capture.drain_remaining()).await;
            let (stdout, stderr) = capture.into_output();
            Err(TimeoutError {
                command: command.clone(),
                timeout: limit,
                stdout,
                stderr,
            }
            .into())
        }
    }
}

/// Blocking variant of [`execute`].
///
/// Drives the execution on a private current-thread runtime, so it must not
/// be called from within an async context.
pub fn execute_blocking(command: &Command, options: &ExecutionOptions) -> Result<ExecutionResult> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(SubcallError::Io)?;
    runtime.block_on(execute(command, options))
}
