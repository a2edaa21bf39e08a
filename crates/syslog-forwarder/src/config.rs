// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::errors::ConfigError;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_CACHE_PATH: &str = "/tmp/url";
/// facility mail (2), severity informational (6)
pub const DEFAULT_PRIORITY: u8 = 22;
pub const DEFAULT_VERSION: u8 = 1;
const DEFAULT_TIMEOUT_MS: u64 = 5000;
const MAX_PRIORITY: u8 = 191;

/// Configuration for a forwarder process
#[derive(Debug, Clone)]
pub struct ForwarderConfig {
    /// Name of the function; the stack lookup key
    pub function_name: String,
    /// HOSTNAME field of every formatted message
    pub hostname: String,
    /// Single-slot endpoint cache file
    pub cache_path: PathBuf,
    /// Syslog PRI value
    pub priority: u8,
    /// Syslog protocol version
    pub version: u8,
    pub connect_timeout: Duration,
    pub write_timeout: Duration,
    /// Log level (e.g., trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            function_name: String::new(),
            hostname: String::new(),
            cache_path: PathBuf::from(DEFAULT_CACHE_PATH),
            priority: DEFAULT_PRIORITY,
            version: DEFAULT_VERSION,
            connect_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            write_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            log_level: "info".to_string(),
        }
    }
}

impl ForwarderConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let function_name = env::var("AWS_LAMBDA_FUNCTION_NAME")
            .ok()
            .filter(|name| !name.trim().is_empty())
            .ok_or(ConfigError::Missing("AWS_LAMBDA_FUNCTION_NAME"))?;
        let hostname = env::var("SYSLOG_HOSTNAME")
            .ok()
            .filter(|host| !host.trim().is_empty())
            .unwrap_or_else(|| function_name.clone());
        let cache_path = env::var("SYSLOG_CACHE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CACHE_PATH));
        let priority = parse_var("SYSLOG_PRIORITY", DEFAULT_PRIORITY)?;
        let version = parse_var("SYSLOG_VERSION", DEFAULT_VERSION)?;
        let connect_timeout =
            Duration::from_millis(parse_var("SYSLOG_CONNECT_TIMEOUT_MS", DEFAULT_TIMEOUT_MS)?);
        let write_timeout =
            Duration::from_millis(parse_var("SYSLOG_WRITE_TIMEOUT_MS", DEFAULT_TIMEOUT_MS)?);
        let log_level = env::var("SYSLOG_FORWARDER_LOG_LEVEL")
            .map(|val| val.to_lowercase())
            .unwrap_or_else(|_| "info".to_string());

        let config = Self {
            function_name,
            hostname,
            cache_path,
            priority,
            version,
            connect_timeout,
            write_timeout,
            log_level,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.function_name.trim().is_empty() {
            return Err(ConfigError::Missing("AWS_LAMBDA_FUNCTION_NAME"));
        }

        // HOSTNAME is a single syslog header field
        if self.hostname.is_empty() || self.hostname.contains(char::is_whitespace) {
            return Err(ConfigError::Invalid(format!(
                "Hostname '{}' must be non-empty and contain no whitespace",
                self.hostname
            )));
        }

        if self.priority > MAX_PRIORITY {
            return Err(ConfigError::Invalid(format!(
                "Syslog priority {} is out of range 0..={MAX_PRIORITY}",
                self.priority
            )));
        }

        if !(1..=9).contains(&self.version) {
            return Err(ConfigError::Invalid(format!(
                "Syslog version {} must be a single non-zero digit",
                self.version
            )));
        }

        if self.connect_timeout.is_zero() || self.write_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "Connect and write timeouts must be greater than 0".to_string(),
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.log_level.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.log_level
            )));
        }

        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(val) => val
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid(format!("{name} has invalid value '{val}'"))),
        Err(_) => Ok(default),
    }
}
