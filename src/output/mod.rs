//! Output rendering for diagnostics.
//!
//! Captured streams are raw bytes. This module turns them into bounded,
//! 7-bit printable text suitable for logs and error messages:
//! - whitespace stripping and head truncation
//! - byte escaping
//! - copy-paste command rendering
//!
//! # Example
//!
//! ```
//! use subcall::output::OutputSanitizer;
//!
//! let rendered = OutputSanitizer::render(b"  caf\xc3\xa9\n");
//! assert_eq!(rendered, "caf\\xc3\\xa9");
//!
//! let cmd = OutputSanitizer::render_command(&["ls", "my dir"]);
//! assert_eq!(cmd, "ls 'my dir'");
//! ```

mod sanitizer;

pub use sanitizer::{OutputSanitizer, CUT_MARKER, MAX_HEAD_SIZE};
