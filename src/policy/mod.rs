//! Policy layer around the execution engine.
//!
//! The engine only reports what happened. This module decides what a
//! non-zero exit means for the caller:
//!
//! - **Validation**: argument lists only, unless the shell is requested
//! - **Assertion**: non-zero exit becomes an [`ExecutionError`](crate::ExecutionError)
//! - **Warning**: non-zero exit is reported to an [`ExecutionObserver`]
//!
//! ## Example
//!
//! ```no_run
//! use subcall::policy::{call_blocking, CallOptions};
//!
//! let result = call_blocking(["cat"], &CallOptions::new().input(&b"foo"[..])).unwrap();
//! assert_eq!(result.stdout(), b"foo");
//!
//! // A joined command line is refused unless it goes through the shell.
//! assert!(call_blocking("echo foo", &CallOptions::new()).is_err());
//! assert!(call_blocking("echo foo", &CallOptions::new().shell(true)).is_ok());
//! ```

mod caller;
mod observer;
pub mod validation;

pub use caller::{call, call_blocking, CallOptions, Caller};
pub use observer::{ExecutionObserver, TracingObserver};
pub use validation::{validate, validate_command, validate_timeout, ValidationError};
