//! Execution result types.

use std::borrow::Cow;
use std::fmt;

use super::command::Command;
use crate::error::{ExecutionError, SubcallError};
use crate::output::OutputSanitizer;

/// Outcome of a completed execution.
///
/// Built once when the child exits and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    command: Command,
    exit_code: i32,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

impl ExecutionResult {
    /// Create a new execution result.
    pub fn new(
        command: Command,
        exit_code: i32,
        stdout: impl Into<Vec<u8>>,
        stderr: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            command,
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// The command as invoked.
    pub fn command(&self) -> &Command {
        &self.command
    }

    /// Exit code; negative signal number if the child was killed by a signal.
    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    /// Captured standard output.
    pub fn stdout(&self) -> &[u8] {
        &self.stdout
    }

    /// Captured standard error. Empty when merged into standard output.
    pub fn stderr(&self) -> &[u8] {
        &self.stderr
    }

    /// Standard output decoded as UTF-8, lossily.
    pub fn stdout_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stdout)
    }

    /// Standard error decoded as UTF-8, lossily.
    pub fn stderr_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stderr)
    }

    /// Check if the command succeeded (exit code 0).
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Fail with [`ExecutionError`] unless the exit code is 0.
    pub fn assert_zero_exit_status(&self) -> Result<(), SubcallError> {
        if self.success() {
            return Ok(());
        }
        Err(ExecutionError::from_result(self).into())
    }

    /// Split into captured standard output and standard error.
    pub fn into_output(self) -> (Vec<u8>, Vec<u8>) {
        (self.stdout, self.stderr)
    }
}

impl fmt::Display for ExecutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<ExecutionResult cmd=\"{}\" ret={} stdout=b'{}' stderr=b'{}'>",
            self.command,
            self.exit_code,
            OutputSanitizer::render(&self.stdout),
            OutputSanitizer::render(&self.stderr),
        )
    }
}
