//! # subcall
//!
//! Run a child process, capture everything it prints, and never hang.
//!
//! This crate wraps process creation in a single primitive that avoids the
//! usual subprocess traps: pipe-buffer deadlock when both output streams
//! fill up, children blocking on a terminal prompt, and unreadable or
//! unbounded output in error messages.
//!
//! ## Features
//!
//! - **Deadlock-free capture**: stdin, stdout and stderr are serviced concurrently
//! - **Timeouts**: the child's session is killed and partial output kept
//! - **No terminal prompts**: children run in a new session with stdin on `/dev/null`
//! - **Safe diagnostics**: results and errors render as bounded 7-bit text
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use subcall::{call, CallOptions};
//!
//! #[tokio::main]
//! async fn main() -> subcall::Result<()> {
//!     // Initialize logging
//!     subcall::logging::try_init().ok();
//!
//!     let options = CallOptions::new().timeout(Duration::from_secs(10));
//!     let result = call(["echo", "foo"], &options).await?;
//!
//!     assert_eq!(result.stdout(), b"foo\n");
//!     println!("{}", result);
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod execution;
pub mod logging;
pub mod output;
pub mod policy;

// Re-export commonly used types
pub use error::{ExecutionError, Result, SubcallError, TimeoutError};
pub use execution::{execute, execute_blocking, Command, ExecutionOptions, ExecutionResult};
pub use output::OutputSanitizer;
pub use policy::{
    call, call_blocking, CallOptions, Caller, ExecutionObserver, TracingObserver, ValidationError,
};
