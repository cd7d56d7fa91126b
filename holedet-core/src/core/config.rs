//! Configuration error types and validation traits.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::constants::{DEFAULT_FACTOR, DEFAULT_MAX_PIXELS, DEFAULT_MIN_PIXELS};

/// Errors that can occur during configuration validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A worker or retry count was zero.
    #[error("{field} must be greater than 0")]
    ZeroCount { field: &'static str },

    /// Error indicating that a configuration is invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Error indicating that a resource limit has been exceeded.
    #[error("resource limit exceeded: {message}")]
    ResourceLimitExceeded { message: String },
}

/// A trait for validating configuration parameters.
pub trait ConfigValidator {
    /// Validates the configuration.
    fn validate(&self) -> Result<(), ConfigError>;

    /// Returns the default configuration.
    fn get_defaults() -> Self
    where
        Self: Sized;

    /// Validates that a count (workers, retries) is non-zero.
    fn validate_count(&self, field: &'static str, value: usize) -> Result<(), ConfigError> {
        if value == 0 {
            Err(ConfigError::ZeroCount { field })
        } else {
            Ok(())
        }
    }

    /// Validates a count against an upper limit.
    fn validate_count_with_limit(
        &self,
        field: &'static str,
        value: usize,
        max: usize,
    ) -> Result<(), ConfigError> {
        self.validate_count(field, value)?;
        if value > max {
            return Err(ConfigError::ResourceLimitExceeded {
                message: format!("{field} {value} exceeds maximum {max}"),
            });
        }
        Ok(())
    }
}

/// Constraints handed to the resize planner.
///
/// Defaults match the 32-pixel patch grid of the target model with a budget of
/// `[2*2*32*32, 32*32*4*2560]` pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResizeConfig {
    /// Both output dimensions are multiples of this value.
    pub factor: u32,
    /// Lower bound on the output area.
    pub min_pixels: u64,
    /// Upper bound on the output area.
    pub max_pixels: u64,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            factor: DEFAULT_FACTOR,
            min_pixels: DEFAULT_MIN_PIXELS,
            max_pixels: DEFAULT_MAX_PIXELS,
        }
    }
}

impl ConfigValidator for ResizeConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.factor == 0 {
            return Err(ConfigError::InvalidConfig {
                message: "resize factor must be >= 1".to_string(),
            });
        }
        if self.min_pixels == 0 || self.max_pixels == 0 {
            return Err(ConfigError::InvalidConfig {
                message: "min_pixels and max_pixels must be > 0".to_string(),
            });
        }
        if self.min_pixels > self.max_pixels {
            return Err(ConfigError::InvalidConfig {
                message: format!(
                    "min_pixels ({}) must be <= max_pixels ({})",
                    self.min_pixels, self.max_pixels
                ),
            });
        }
        Ok(())
    }

    fn get_defaults() -> Self {
        Self::default()
    }
}
