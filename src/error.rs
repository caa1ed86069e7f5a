//! Error types for subcall.

use std::time::Duration;

use thiserror::Error;

use crate::execution::{Command, ExecutionResult};
use crate::output::OutputSanitizer;
use crate::policy::ValidationError;

/// Main error type for subcall operations.
#[derive(Error, Debug)]
pub enum SubcallError {
    /// The command was rejected before anything was spawned.
    #[error("invalid command: {0}")]
    Validation(#[from] ValidationError),

    /// The OS could not start the program.
    #[error("failed to launch \"{command}\": {source}")]
    Launch {
        /// The command that could not be started.
        command: Command,
        /// Underlying OS error (e.g. `NotFound`).
        #[source]
        source: std::io::Error,
    },

    /// The deadline elapsed and the child was killed.
    #[error(transparent)]
    Timeout(#[from] TimeoutError),

    /// The child exited with a non-zero status.
    #[error(transparent)]
    Execution(#[from] ExecutionError),

    /// I/O error while talking to the child.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SubcallError {
    /// Whether this is a launch failure caused by a missing executable.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Launch { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

/// A child exited with a non-zero status while success was required.
///
/// Holds the head of each output stream, not the full capture.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "Command \"{command}\" returned non-zero exit status {exit_code}: stdout=b'{}' stderr=b'{}'",
    OutputSanitizer::escape(.stdout),
    OutputSanitizer::escape(.stderr)
)]
pub struct ExecutionError {
    /// The command as invoked.
    pub command: Command,
    /// The child's exit code.
    pub exit_code: i32,
    /// Truncated standard output.
    pub stdout: Vec<u8>,
    /// Truncated standard error.
    pub stderr: Vec<u8>,
}

impl ExecutionError {
    /// Build the error from a finished execution.
    pub fn from_result(result: &ExecutionResult) -> Self {
        Self {
            command: result.command().clone(),
            exit_code: result.exit_code(),
            stdout: OutputSanitizer::head(result.stdout()).into_owned(),
            stderr: OutputSanitizer::head(result.stderr()).into_owned(),
        }
    }
}

/// The deadline elapsed before the child exited.
///
/// Carries everything captured up to the kill, including the short drain
/// that follows it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "Command \"{command}\" timed out after {timeout:?}: stdout=b'{}' stderr=b'{}'",
    OutputSanitizer::render(.stdout),
    OutputSanitizer::render(.stderr)
)]
pub struct TimeoutError {
    /// The command as invoked.
    pub command: Command,
    /// The configured timeout.
    pub timeout: Duration,
    /// Partial standard output.
    pub stdout: Vec<u8>,
    /// Partial standard error. Empty when merged into standard output.
    pub stderr: Vec<u8>,
}

/// Convenience Result type for subcall operations.
pub type Result<T> = std::result::Result<T, SubcallError>;
