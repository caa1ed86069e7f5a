//! Command and execution option types.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::output::OutputSanitizer;

/// Shell used when [`ExecutionOptions::shell`] is set.
#[cfg(unix)]
pub const SHELL: &str = "/bin/sh";

/// A program and its arguments.
///
/// Built either from an argument sequence ([`Command::new`]) or from a single
/// joined command line ([`Command::from_line`]). A joined line is only valid
/// when it is run through the shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    argv: Vec<String>,
    joined_line: bool,
}

impl Command {
    /// Create a command from a program and its arguments.
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
            joined_line: false,
        }
    }

    /// Create a command from a single joined command line.
    pub fn from_line(line: impl Into<String>) -> Self {
        Self {
            argv: vec![line.into()],
            joined_line: true,
        }
    }

    /// Append an argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.argv.push(arg.into());
        self
    }

    /// The program and arguments, as given.
    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    /// The program name, if any.
    pub fn program(&self) -> Option<&str> {
        self.argv.first().map(String::as_str)
    }

    /// Whether this command was given as a single joined line.
    pub fn is_joined_line(&self) -> bool {
        self.joined_line
    }

    /// Whether there is no program to run.
    pub fn is_empty(&self) -> bool {
        self.argv.is_empty()
    }

    /// Render the command for pasting into an interactive shell.
    pub fn render_for_copy_paste(&self) -> String {
        OutputSanitizer::render_command(&self.argv)
    }

    /// The argument vector handed to the OS.
    ///
    /// With `shell` set the first element becomes the shell script (`sh -c`
    /// on Unix, `cmd /C` elsewhere) and the rest its positional parameters.
    pub(crate) fn spawn_argv(&self, shell: bool) -> Vec<String> {
        if !shell {
            return self.argv.clone();
        }

        let mut argv = Vec::with_capacity(self.argv.len() + 2);
        argv.extend(shell_prefix().iter().map(|s| s.to_string()));
        argv.extend(self.argv.iter().cloned());
        argv
    }
}

#[cfg(unix)]
fn shell_prefix() -> [&'static str; 2] {
    [SHELL, "-c"]
}

#[cfg(not(unix))]
fn shell_prefix() -> [&'static str; 2] {
    ["cmd", "/C"]
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&OutputSanitizer::ascii_only(&self.render_for_copy_paste()))
    }
}

impl From<&str> for Command {
    fn from(line: &str) -> Self {
        Self::from_line(line)
    }
}

impl From<String> for Command {
    fn from(line: String) -> Self {
        Self::from_line(line)
    }
}

impl From<Vec<String>> for Command {
    fn from(argv: Vec<String>) -> Self {
        Self::new(argv)
    }
}

impl From<&[&str]> for Command {
    fn from(argv: &[&str]) -> Self {
        Self::new(argv.iter().copied())
    }
}

impl<const N: usize> From<[&str; N]> for Command {
    fn from(argv: [&str; N]) -> Self {
        Self::new(argv)
    }
}

/// How a command is executed.
#[derive(Debug, Clone)]
pub struct ExecutionOptions {
    /// Bytes written to standard input, which is then closed.
    ///
    /// `None` connects standard input to the null device.
    pub input: Option<Vec<u8>>,
    /// Wall-clock limit. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// Working directory override.
    pub working_dir: Option<PathBuf>,
    /// Environment variables to set.
    pub env: HashMap<String, String>,
    /// Start from an empty environment instead of inheriting ours.
    pub env_clear: bool,
    /// Send standard error into the standard output pipe.
    pub merge_stderr: bool,
    /// Start the child in a new session, without a controlling terminal.
    pub detach: bool,
    /// Run the command through the system shell.
    pub shell: bool,
}

impl ExecutionOptions {
    /// Create options with the defaults: no input, no timeout, detached.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the standard input bytes.
    pub fn input(mut self, input: impl Into<Vec<u8>>) -> Self {
        self.input = Some(input.into());
        self
    }

    /// Set the execution timeout.
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Set the working directory.
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Add an environment variable.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Add multiple environment variables.
    pub fn envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in vars {
            self.env.insert(k.into(), v.into());
        }
        self
    }

    /// Clear the inherited environment.
    pub fn env_clear(mut self, clear: bool) -> Self {
        self.env_clear = clear;
        self
    }

    /// Set whether standard error is merged into standard output.
    pub fn merge_stderr(mut self, merge: bool) -> Self {
        self.merge_stderr = merge;
        self
    }

    /// Set whether the child is detached from our controlling terminal.
    pub fn detach(mut self, detach: bool) -> Self {
        self.detach = detach;
        self
    }

    /// Set whether the command runs through the shell.
    pub fn shell(mut self, shell: bool) -> Self {
        self.shell = shell;
        self
    }
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            input: None,
            timeout: None,
            working_dir: None,
            env: HashMap::new(),
            env_clear: false,
            merge_stderr: false,
            detach: true,
            shell: false,
        }
    }
}
