//! Configuration management for subcall.
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file (JSON)
//! 4. Default values

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cli::Args;
use crate::policy::CallOptions;

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Execution defaults.
    pub execution: ExecutionSection,
    /// Exit-status policy.
    pub policy: PolicySection,
    /// Logging configuration.
    pub logging: LoggingSection,
}

/// Execution defaults section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionSection {
    /// Timeout in seconds. Absent means no timeout.
    pub timeout_secs: Option<f64>,
    /// Start children in a new session.
    pub detach: bool,
    /// Merge standard error into standard output.
    pub merge_stderr: bool,
    /// Extra environment variables for every child.
    pub env: HashMap<String, String>,
}

impl Default for ExecutionSection {
    fn default() -> Self {
        Self {
            timeout_secs: None,
            detach: true,
            merge_stderr: false,
            env: HashMap::new(),
        }
    }
}

/// Exit-status policy section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicySection {
    /// Treat a non-zero exit code as an error.
    pub assert_zero_exit_status: bool,
    /// Log a warning on a non-zero exit code.
    pub warn_on_non_zero_exit_status: bool,
}

impl Default for PolicySection {
    fn default() -> Self {
        Self {
            assert_zero_exit_status: true,
            warn_on_non_zero_exit_status: false,
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level (error, warn, info, debug, trace).
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Json)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup (for testing).
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(timeout) = lookup("SUBCALL_TIMEOUT") {
            let secs = timeout
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidTimeout(timeout.clone()))?;
            self.execution.timeout_secs = Some(secs);
        }

        if let Some(level) = lookup("SUBCALL_LOG_LEVEL") {
            self.logging.level = level;
        } else if let Some(level) = lookup("RUST_LOG") {
            self.logging.level = level;
        }

        Ok(())
    }

    /// Apply CLI argument overrides.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(timeout) = args.timeout {
            self.execution.timeout_secs = Some(timeout.as_secs_f64());
        }

        for (key, value) in &args.env {
            self.execution.env.insert(key.clone(), value.clone());
        }

        if args.merge_stderr {
            self.execution.merge_stderr = true;
        }

        if args.no_detach {
            self.execution.detach = false;
        }

        if args.no_assert {
            self.policy.assert_zero_exit_status = false;
        }

        if args.warn {
            self.policy.warn_on_non_zero_exit_status = true;
        }

        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Load configuration with full priority chain.
    ///
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        // Start with defaults
        let mut config = Config::default();

        // Load from config file if specified
        if let Some(ref path) = args.config {
            config = Config::from_file(path)?;
        }

        // Apply environment variable overrides
        config.apply_env()?;

        // Apply CLI argument overrides (highest priority)
        config.apply_args(args);

        Ok(config)
    }

    /// The configured timeout, if any.
    pub fn timeout(&self) -> Result<Option<Duration>, ConfigError> {
        self.execution
            .timeout_secs
            .map(|secs| {
                Duration::try_from_secs_f64(secs)
                    .ok()
                    .filter(|d| !d.is_zero())
                    .ok_or_else(|| ConfigError::InvalidTimeout(secs.to_string()))
            })
            .transpose()
    }

    /// Convert to call options for the policy layer.
    pub fn to_call_options(&self) -> Result<CallOptions, ConfigError> {
        let mut options = CallOptions::new()
            .assert_zero_exit_status(self.policy.assert_zero_exit_status)
            .warn_on_non_zero_exit_status(self.policy.warn_on_non_zero_exit_status)
            .detach(self.execution.detach)
            .merge_stderr(self.execution.merge_stderr)
            .envs(self.execution.env.clone());

        if let Some(timeout) = self.timeout()? {
            options = options.timeout(timeout);
        }

        Ok(options)
    }

    /// Get the log level filter string.
    pub fn log_filter(&self) -> &str {
        &self.logging.level
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    Io(std::io::Error),
    /// JSON parsing error.
    Json(serde_json::Error),
    /// Timeout that is not a positive number of seconds.
    InvalidTimeout(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read config file: {}", e),
            Self::Json(e) => write!(f, "failed to parse config file: {}", e),
            Self::InvalidTimeout(value) => write!(f, "invalid timeout: {}", value),
        }
    }
}

impl std::error::Error for ConfigError {}
