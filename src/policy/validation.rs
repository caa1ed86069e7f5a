//! Input validation for commands handed to the policy layer.

use std::time::Duration;

use crate::execution::{Command, ExecutionOptions};

/// Validate a command before anything is spawned.
///
/// Rejects empty commands, arguments containing NUL bytes, and joined
/// command lines unless they are meant for the shell.
pub fn validate_command(command: &Command, shell: bool) -> Result<(), ValidationError> {
    let Some(program) = command.program() else {
        return Err(ValidationError::EmptyCommand);
    };

    if command.is_joined_line() && !shell {
        return Err(ValidationError::JoinedCommandLine(program.to_string()));
    }

    if program.is_empty() {
        return Err(ValidationError::EmptyProgram);
    }

    if let Some(arg) = command.argv().iter().find(|a| a.contains('\0')) {
        return Err(ValidationError::InvalidCharacter {
            argument: arg.replace('\0', "\\0"),
        });
    }

    Ok(())
}

/// Validate a timeout value.
pub fn validate_timeout(timeout: Duration) -> Result<(), ValidationError> {
    if timeout.is_zero() {
        return Err(ValidationError::ZeroTimeout);
    }
    Ok(())
}

/// Validate a command together with the options it will run with.
pub fn validate(command: &Command, options: &ExecutionOptions) -> Result<(), ValidationError> {
    validate_command(command, options.shell)?;
    if let Some(timeout) = options.timeout {
        validate_timeout(timeout)?;
    }
    Ok(())
}

/// Validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// No program was given.
    EmptyCommand,
    /// The program name is an empty string.
    EmptyProgram,
    /// A single joined command line was given without the shell flag.
    JoinedCommandLine(String),
    /// An argument contains a NUL byte.
    InvalidCharacter { argument: String },
    /// A timeout of zero can never be met.
    ZeroTimeout,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyCommand => write!(f, "Command cannot be empty"),
            Self::EmptyProgram => write!(f, "Program name cannot be empty"),
            Self::JoinedCommandLine(line) => write!(
                f,
                "Command should be a list of arguments, not a single string: {:?}",
                line
            ),
            Self::InvalidCharacter { argument } => {
                write!(f, "Argument contains a NUL byte: {:?}", argument)
            }
            Self::ZeroTimeout => write!(f, "Timeout must be greater than zero"),
        }
    }
}

impl std::error::Error for ValidationError {}
