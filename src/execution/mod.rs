//! Command execution engine.
//!
//! This module runs one child process per call:
//! - standard input fed from a buffer or connected to the null device
//! - standard output and standard error captured in full, concurrently
//! - optional deadline with a kill and a short final drain
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use subcall::execution::{execute_blocking, Command, ExecutionOptions};
//!
//! let options = ExecutionOptions::new()
//!     .input(&b"hello"[..])
//!     .timeout(Duration::from_secs(5));
//! let result = execute_blocking(&Command::new(["cat"]), &options).unwrap();
//! assert_eq!(result.stdout(), b"hello");
//! ```

mod capture;
mod command;
mod result;
mod supervisor;

pub use command::{Command, ExecutionOptions};
pub use result::ExecutionResult;
pub use supervisor::{execute, execute_blocking, KILL_GRACE_PERIOD};

#[cfg(unix)]
pub use command::SHELL;
