//! Truncation-safe rendering of captured output and command lines.

use std::borrow::Cow;
use std::fmt::Write as _;

/// Maximum number of bytes of a stream rendered for diagnostics.
pub const MAX_HEAD_SIZE: usize = 4000;

/// Marker appended to a rendering that was cut at [`MAX_HEAD_SIZE`].
pub const CUT_MARKER: &[u8] = b" ... [cut]";

/// Output sanitizer producing 7-bit printable text from raw bytes.
pub struct OutputSanitizer;

impl OutputSanitizer {
    /// Strip surrounding whitespace and cut the buffer at [`MAX_HEAD_SIZE`].
    ///
    /// Buffers shorter than the limit (after stripping) are returned as-is.
    /// Longer ones keep their first `MAX_HEAD_SIZE` bytes followed by
    /// [`CUT_MARKER`].
    pub fn head(input: &[u8]) -> Cow<'_, [u8]> {
        Self::head_with_limit(input, MAX_HEAD_SIZE)
    }

    /// Like [`OutputSanitizer::head`] with a custom limit.
    pub fn head_with_limit(input: &[u8], limit: usize) -> Cow<'_, [u8]> {
        let stripped = strip(input);
        if stripped.len() < limit {
            return Cow::Borrowed(stripped);
        }

        let mut cut = Vec::with_capacity(limit + CUT_MARKER.len());
        cut.extend_from_slice(&stripped[..limit]);
        cut.extend_from_slice(CUT_MARKER);
        Cow::Owned(cut)
    }

    /// Escape arbitrary bytes into printable ASCII.
    ///
    /// Printable ASCII passes through (a backslash is doubled), tab, newline
    /// and carriage return become `\t`, `\n` and `\r`, everything else is
    /// written as `\xNN`.
    pub fn escape(input: &[u8]) -> String {
        let mut out = String::with_capacity(input.len());
        for &byte in input {
            match byte {
                b'\\' => out.push_str("\\\\"),
                b'\t' => out.push_str("\\t"),
                b'\n' => out.push_str("\\n"),
                b'\r' => out.push_str("\\r"),
                0x20..=0x7e => out.push(char::from(byte)),
                _ => {
                    let _ = write!(out, "\\x{:02x}", byte);
                }
            }
        }
        out
    }

    /// Bounded, copy-paste-safe rendering of a captured stream.
    pub fn render(input: &[u8]) -> String {
        Self::escape(&Self::head(input))
    }

    /// Join a command line for pasting into an interactive shell.
    ///
    /// Arguments containing a space are wrapped in single quotes.
    pub fn render_command<S: AsRef<str>>(argv: &[S]) -> String {
        argv.iter()
            .map(|arg| {
                let arg = arg.as_ref();
                if arg.contains(' ') {
                    format!("'{}'", arg.replace('\'', r"'\''"))
                } else {
                    arg.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Escape characters outside printable ASCII as `\u{..}`.
    pub fn ascii_only(input: &str) -> Cow<'_, str> {
        if input.chars().all(|c| matches!(c, ' '..='~')) {
            return Cow::Borrowed(input);
        }

        let mut out = String::with_capacity(input.len());
        for c in input.chars() {
            if matches!(c, ' '..='~') {
                out.push(c);
            } else {
                let _ = write!(out, "\\u{{{:x}}}", u32::from(c));
            }
        }
        Cow::Owned(out)
    }
}

/// Whitespace as understood by byte-string stripping (includes VT and FF).
fn is_strippable(byte: &u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

fn strip(input: &[u8]) -> &[u8] {
    let start = input
        .iter()
        .position(|b| !is_strippable(b))
        .unwrap_or(input.len());
    let end = input
        .iter()
        .rposition(|b| !is_strippable(b))
        .map_or(start, |i| i + 1);
    &input[start..end]
}
