//! Core error handling, constants and configuration validation.

pub mod config;
pub mod constants;
pub mod errors;

pub use config::{ConfigError, ConfigValidator, ResizeConfig};
pub use errors::{HoleError, HoleResult, ProcessingStage};
