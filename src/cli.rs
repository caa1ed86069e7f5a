//! Command-line interface for subcall.
//!
//! Uses lexopt for minimal binary size overhead.

use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

/// Command-line arguments.
#[derive(Debug, Clone, Default)]
pub struct Args {
    /// Program and arguments to run.
    pub command: Vec<String>,
    /// Timeout (overrides config file).
    pub timeout: Option<Duration>,
    /// Text written to the child's standard input.
    pub input: Option<String>,
    /// File whose contents are written to the child's standard input.
    pub input_file: Option<PathBuf>,
    /// Working directory for the child.
    pub cwd: Option<PathBuf>,
    /// Extra environment variables.
    pub env: Vec<(String, String)>,
    /// Merge standard error into standard output.
    pub merge_stderr: bool,
    /// Keep the child attached to our controlling terminal.
    pub no_detach: bool,
    /// Run the command through the shell.
    pub shell: bool,
    /// Do not treat a non-zero exit code as an error.
    pub no_assert: bool,
    /// Warn on a non-zero exit code.
    pub warn: bool,
    /// Path to configuration file.
    pub config: Option<PathBuf>,
    /// Log level (error, warn, info, debug, trace).
    pub log_level: Option<String>,
    /// Show version and exit.
    pub version: bool,
    /// Show help and exit.
    pub help: bool,
}

/// Parse command-line arguments.
pub fn parse_args() -> Result<Args, ArgsError> {
    parse_args_from(std::env::args_os())
}

/// Parse arguments from an iterator (for testing).
pub fn parse_args_from<I>(args: I) -> Result<Args, ArgsError>
where
    I: IntoIterator<Item = OsString>,
{
    use lexopt::prelude::*;

    let mut result = Args::default();
    let mut parser = lexopt::Parser::from_iter(args);

    while let Some(arg) = parser.next()? {
        match arg {
            Short('h') | Long("help") => {
                result.help = true;
            }
            Short('V') | Long("version") => {
                result.version = true;
            }
            Short('t') | Long("timeout") => {
                let value: String = parser.value()?.parse()?;
                result.timeout = Some(parse_timeout(&value)?);
            }
            Short('i') | Long("input") => {
                result.input = Some(parser.value()?.parse()?);
            }
            Long("input-file") => {
                result.input_file = Some(parser.value()?.parse()?);
            }
            Short('C') | Long("cwd") => {
                result.cwd = Some(parser.value()?.parse()?);
            }
            Short('e') | Long("env") => {
                let value: String = parser.value()?.parse()?;
                let (key, val) = value
                    .split_once('=')
                    .filter(|(key, _)| !key.is_empty())
                    .ok_or_else(|| ArgsError::InvalidValue("env", value.clone()))?;
                result.env.push((key.to_string(), val.to_string()));
            }
            Long("merge-stderr") => {
                result.merge_stderr = true;
            }
            Long("no-detach") => {
                result.no_detach = true;
            }
            Long("shell") => {
                result.shell = true;
            }
            Long("no-assert") => {
                result.no_assert = true;
            }
            Long("warn") => {
                result.warn = true;
            }
            Short('c') | Long("config") => {
                result.config = Some(parser.value()?.parse()?);
            }
            Short('l') | Long("log-level") => {
                result.log_level = Some(parser.value()?.parse()?);
            }
            Value(val) => {
                // Everything from the program name on belongs to the child.
                result.command.push(into_string(val)?);
                for rest in parser.raw_args()? {
                    result.command.push(into_string(rest)?);
                }
            }
            _ => return Err(arg.unexpected().into()),
        }
    }

    if result.input.is_some() && result.input_file.is_some() {
        return Err(ArgsError::Conflict("input", "input-file"));
    }

    Ok(result)
}

fn parse_timeout(value: &str) -> Result<Duration, ArgsError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|secs| secs.is_finite() && *secs > 0.0)
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .ok_or_else(|| ArgsError::InvalidValue("timeout", value.to_string()))
}

fn into_string(value: OsString) -> Result<String, ArgsError> {
    value
        .into_string()
        .map_err(|raw| ArgsError::NotUnicode(raw.to_string_lossy().into_owned()))
}

/// Print help message.
pub fn print_help() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        r#"subcall {version}
Run a command, capture its output in full, and enforce a timeout

USAGE:
    subcall [OPTIONS] [--] <PROGRAM> [ARGS...]

OPTIONS:
    -t, --timeout <SECS>    Kill the command after this many seconds
    -i, --input <TEXT>      Write TEXT to the command's standard input
        --input-file <FILE> Write FILE to the command's standard input
    -C, --cwd <DIR>         Run the command in DIR
    -e, --env <KEY=VALUE>   Set an environment variable (repeatable)
        --merge-stderr      Capture standard error into standard output
        --no-detach         Keep the command in our session
        --shell             Run the command through /bin/sh -c
        --no-assert         Pass the output through even if the command fails
        --warn              Log a warning if the command fails
    -c, --config <FILE>     Path to configuration file (JSON)
    -l, --log-level <LVL>   Log level (error, warn, info, debug, trace)
    -h, --help              Print help
    -V, --version           Print version

ENVIRONMENT VARIABLES:
    SUBCALL_TIMEOUT         Timeout in seconds (overrides config)
    SUBCALL_LOG_LEVEL       Log level (overrides config)
    RUST_LOG                Alternative log level setting

EXIT STATUS:
    The command's own exit code (128 + N if killed by signal N), 124 on
    timeout, 127 if the command could not be started, 2 on usage errors.

EXAMPLES:
    subcall -- ls -la /tmp
    subcall -t 10 -- cat /dev/tty
    subcall --shell 'echo $HOME'
"#
    );
}

/// Print version.
pub fn print_version() {
    println!("subcall {}", env!("CARGO_PKG_VERSION"));
}

/// Argument parsing errors.
#[derive(Debug)]
pub enum ArgsError {
    /// Lexopt parsing error.
    Lexopt(lexopt::Error),
    /// Invalid argument value.
    InvalidValue(&'static str, String),
    /// Two options that cannot be combined.
    Conflict(&'static str, &'static str),
    /// Command argument is not valid Unicode.
    NotUnicode(String),
}

impl std::fmt::Display for ArgsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lexopt(e) => write!(f, "{}", e),
            Self::InvalidValue(name, value) => {
                write!(f, "invalid value for --{}: '{}'", name, value)
            }
            Self::Conflict(a, b) => write!(f, "--{} cannot be used with --{}", a, b),
            Self::NotUnicode(arg) => write!(f, "argument is not valid unicode: '{}'", arg),
        }
    }
}

impl std::error::Error for ArgsError {}

impl From<lexopt::Error> for ArgsError {
    fn from(e: lexopt::Error) -> Self {
        Self::Lexopt(e)
    }
}
