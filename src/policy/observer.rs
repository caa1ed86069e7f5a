//! Reporting hooks for the policy layer.

use tracing::warn;

use crate::execution::ExecutionResult;

/// Receives notable execution outcomes.
///
/// The capture engine never logs; everything the policy layer wants to
/// report goes through an observer chosen by the caller.
pub trait ExecutionObserver: Send + Sync {
    /// A child exited non-zero and warnings were requested.
    fn non_zero_exit(&self, result: &ExecutionResult);
}

/// Observer that reports through `tracing` at warn level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ExecutionObserver for TracingObserver {
    fn non_zero_exit(&self, result: &ExecutionResult) {
        warn!(exit_code = result.exit_code(), "subprocess failed {}", result);
    }
}
