//! The `call` entry point: validate, execute, then apply exit-status policies.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::observer::{ExecutionObserver, TracingObserver};
use super::validation;
use crate::error::SubcallError;
use crate::execution::{self, Command, ExecutionOptions, ExecutionResult};
use crate::Result;

/// Options for [`Caller::call`].
#[derive(Debug, Clone)]
pub struct CallOptions {
    /// Fail with an execution error when the exit code is non-zero.
    pub assert_zero_exit_status: bool,
    /// Report a non-zero exit code to the observer.
    pub warn_on_non_zero_exit_status: bool,
    /// How the command is executed.
    pub execution: ExecutionOptions,
}

impl CallOptions {
    /// Create options with the defaults: assert success, no warning.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether a non-zero exit code is an error.
    pub fn assert_zero_exit_status(mut self, assert: bool) -> Self {
        self.assert_zero_exit_status = assert;
        self
    }

    /// Set whether a non-zero exit code is reported to the observer.
    pub fn warn_on_non_zero_exit_status(mut self, warn: bool) -> Self {
        self.warn_on_non_zero_exit_status = warn;
        self
    }

    /// Replace the execution options.
    pub fn execution(mut self, execution: ExecutionOptions) -> Self {
        self.execution = execution;
        self
    }

    /// Set the standard input bytes.
    pub fn input(mut self, input: impl Into<Vec<u8>>) -> Self {
        self.execution = self.execution.input(input);
        self
    }

    /// Set the execution timeout.
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.execution = self.execution.timeout(duration);
        self
    }

    /// Set the working directory.
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.execution = self.execution.working_dir(dir);
        self
    }

    /// Add an environment variable.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.execution = self.execution.env(key, value);
        self
    }

    /// Add multiple environment variables.
    pub fn envs(mut self, vars: HashMap<String, String>) -> Self {
        self.execution = self.execution.envs(vars);
        self
    }

    /// Set whether standard error is merged into standard output.
    pub fn merge_stderr(mut self, merge: bool) -> Self {
        self.execution = self.execution.merge_stderr(merge);
        self
    }

    /// Set whether the child is detached from our controlling terminal.
    pub fn detach(mut self, detach: bool) -> Self {
        self.execution = self.execution.detach(detach);
        self
    }

    /// Set whether the command runs through the shell.
    pub fn shell(mut self, shell: bool) -> Self {
        self.execution = self.execution.shell(shell);
        self
    }
}

impl Default for CallOptions {
    fn default() -> Self {
        Self {
            assert_zero_exit_status: true,
            warn_on_non_zero_exit_status: false,
            execution: ExecutionOptions::default(),
        }
    }
}

/// Runs commands and applies the exit-status policies.
#[derive(Clone)]
pub struct Caller {
    observer: Arc<dyn ExecutionObserver>,
}

impl Caller {
    /// Create a caller reporting to the given observer.
    pub fn new(observer: Arc<dyn ExecutionObserver>) -> Self {
        Self { observer }
    }

    /// Validate, execute, then apply the policies in `options`.
    ///
    /// # Errors
    ///
    /// Validation, launch and timeout failures, plus
    /// [`SubcallError::Execution`] when `assert_zero_exit_status` is set and
    /// the child exits non-zero.
    pub async fn call(
        &self,
        command: impl Into<Command>,
        options: &CallOptions,
    ) -> Result<ExecutionResult> {
        let command = command.into();
        validation::validate(&command, &options.execution)?;

        debug!(command = %command, timeout = ?options.execution.timeout, "Executing");
        let result = execution::execute(&command, &options.execution).await?;
        debug!(command = %command, exit_code = result.exit_code(), "Finished");

        self.apply_policies(result, options)
    }

    /// Blocking variant of [`Caller::call`].
    ///
    /// Must not be called from within an async context.
    pub fn call_blocking(
        &self,
        command: impl Into<Command>,
        options: &CallOptions,
    ) -> Result<ExecutionResult> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(SubcallError::Io)?;
        runtime.block_on(self.call(command, options))
    }

    fn apply_policies(
        &self,
        result: ExecutionResult,
        options: &CallOptions,
    ) -> Result<ExecutionResult> {
        if options.warn_on_non_zero_exit_status && !result.success() {
            self.observer.non_zero_exit(&result);
        }
        if options.assert_zero_exit_status {
            result.assert_zero_exit_status()?;
        }
        Ok(result)
    }
}

impl Default for Caller {
    fn default() -> Self {
        Self::new(Arc::new(TracingObserver))
    }
}

impl fmt::Debug for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Caller").finish_non_exhaustive()
    }
}

/// One-shot [`Caller::call`] reporting through `tracing`.
pub async fn call(command: impl Into<Command>, options: &CallOptions) -> Result<ExecutionResult> {
    Caller::default().call(command, options).await
}

/// One-shot [`Caller::call_blocking`] reporting through `tracing`.
pub fn call_blocking(command: impl Into<Command>, options: &CallOptions) -> Result<ExecutionResult> {
    Caller::default().call_blocking(command, options)
}
