/*!
 * Kernel Configuration
 *
 * Defaults, optional JSON file, and environment overrides.
 *
 * Environment variables:
 * - KERNEL_CONFIG: path to a JSON config file
 * - KERNEL_CPUS: number of simulated CPUs
 * - KERNEL_EPOCH_MS: accounting epoch length in milliseconds
 * - KERNEL_QUANTUM_US: dispatch quantum in microseconds
 */

use super::limits::{
    DEFAULT_CPUS, DEFAULT_EPOCH_LENGTH, DEFAULT_QUANTUM, MAX_CPUS, MAX_EPOCH_LENGTH, MAX_QUANTUM,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Kernel configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct KernelConfig {
    /// Number of simulated CPUs
    pub num_cpus: usize,
    /// Accounting epoch length in milliseconds (default: 10s)
    pub epoch_length_ms: u64,
    /// Dispatch quantum in microseconds (default: 10ms)
    pub quantum_us: u64,
}

impl KernelConfig {
    /// Create default configuration
    pub fn new() -> Self {
        Self {
            num_cpus: DEFAULT_CPUS,
            epoch_length_ms: DEFAULT_EPOCH_LENGTH.as_millis() as u64,
            quantum_us: DEFAULT_QUANTUM.as_micros() as u64,
        }
    }

    /// Load configuration: file named by KERNEL_CONFIG (if any), then env overrides
    pub fn load() -> Result<Self, ConfigError> {
        let base = match std::env::var("KERNEL_CONFIG") {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::new(),
        };
        let config = base.with_env_overrides()?;
        config.validate()?;

        info!(
            num_cpus = config.num_cpus,
            epoch_length_ms = config.epoch_length_ms,
            quantum_us = config.quantum_us,
            "Kernel configuration loaded"
        );
        Ok(config)
    }

    /// Read a JSON config file; missing keys keep their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw)?;
        debug!(path = %path.display(), "Read kernel config file");
        config.validate()?;
        Ok(config)
    }

    /// Apply KERNEL_CPUS / KERNEL_EPOCH_MS / KERNEL_QUANTUM_US
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("KERNEL_CPUS") {
            self.num_cpus = parse_value("KERNEL_CPUS", &v)?;
        }
        if let Some(v) = lookup("KERNEL_EPOCH_MS") {
            self.epoch_length_ms = parse_value("KERNEL_EPOCH_MS", &v)?;
        }
        if let Some(v) = lookup("KERNEL_QUANTUM_US") {
            self.quantum_us = parse_value("KERNEL_QUANTUM_US", &v)?;
        }
        Ok(self)
    }

    /// Reject values the kernel cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_cpus == 0 || self.num_cpus > MAX_CPUS {
            return Err(ConfigError::InvalidValue {
                key: "num_cpus",
                value: self.num_cpus.to_string(),
            });
        }
        if self.epoch_length_ms == 0 || self.epoch_length() > MAX_EPOCH_LENGTH {
            return Err(ConfigError::InvalidValue {
                key: "epoch_length_ms",
                value: self.epoch_length_ms.to_string(),
            });
        }
        if self.quantum_us == 0 || self.quantum() > MAX_QUANTUM {
            return Err(ConfigError::InvalidValue {
                key: "quantum_us",
                value: self.quantum_us.to_string(),
            });
        }
        Ok(())
    }

    #[inline]
    pub fn epoch_length(&self) -> Duration {
        Duration::from_millis(self.epoch_length_ms)
    }

    #[inline]
    pub fn quantum(&self) -> Duration {
        Duration::from_micros(self.quantum_us)
    }
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_value<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
    })
}
