//! Error types for the hole-detection data pipeline.
//!
//! This module defines the errors that can occur while preparing training data,
//! planning resizes, downloading source drawings and parsing model output. It
//! also provides helper constructors for creating these errors with context.

use thiserror::Error;

use super::config::ConfigError;

/// Enum representing different stages of processing in the pipeline.
///
/// Used to tag [`HoleError::Processing`] so a failure can be traced back to the
/// step that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    /// Cropping a drawing to its view region.
    Crop,
    /// Resizing an image to the planned dimensions.
    Resize,
    /// Rotating an image for augmentation.
    Rotation,
    /// Writing an image or label file.
    Export,
    /// Drawing QA overlays.
    Rendering,
    /// Generic processing error.
    Generic,
}

impl std::fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingStage::Crop => write!(f, "crop"),
            ProcessingStage::Resize => write!(f, "resize"),
            ProcessingStage::Rotation => write!(f, "rotation"),
            ProcessingStage::Export => write!(f, "export"),
            ProcessingStage::Rendering => write!(f, "rendering"),
            ProcessingStage::Generic => write!(f, "processing"),
        }
    }
}

/// Errors that can occur anywhere in the pipeline.
#[derive(Error, Debug)]
pub enum HoleError {
    /// Image dimensions or resize constraints are unusable.
    #[error("invalid dimension: {message}")]
    InvalidDimension {
        /// A message describing the violated precondition.
        message: String,
    },

    /// An annotation record could not be used for training.
    #[error("malformed annotation for '{image}': {reason}")]
    MalformedAnnotation {
        /// Source image reference of the record.
        image: String,
        /// Why the record was rejected.
        reason: String,
    },

    /// A download did not succeed within the retry budget.
    #[error("download of '{url}' failed after {attempts} attempt(s): {message}")]
    Download {
        /// The URL or path that was fetched.
        url: String,
        /// Number of attempts made.
        attempts: usize,
        /// The last failure message.
        message: String,
    },

    /// The model response did not contain a usable JSON block.
    #[error("model output: {message}")]
    ModelOutput {
        /// A message describing the parse failure.
        message: String,
    },

    /// Error indicating invalid input.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// A message describing the invalid input.
        message: String,
    },

    /// Error indicating a configuration problem.
    #[error("configuration: {message}")]
    ConfigError {
        /// A message describing the configuration error.
        message: String,
    },

    /// Error occurred during processing.
    #[error("{kind} failed: {context}")]
    Processing {
        /// The stage of processing where the error occurred.
        kind: ProcessingStage,
        /// Additional context about the error.
        context: String,
        /// The underlying error that caused this error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Error occurred while loading an image.
    #[error("image load")]
    ImageLoad(#[source] image::ImageError),

    /// JSON (de)serialization error.
    #[error("json")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("io")]
    Io(#[from] std::io::Error),
}

impl HoleError {
    /// Creates an error for a violated resize/dimension precondition.
    pub fn invalid_dimension(message: impl Into<String>) -> Self {
        Self::InvalidDimension {
            message: message.into(),
        }
    }

    /// Creates an error for an annotation record that cannot be used.
    pub fn malformed_annotation(image: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedAnnotation {
            image: image.into(),
            reason: reason.into(),
        }
    }

    /// Creates an error for unparsable model output.
    pub fn model_output(message: impl Into<String>) -> Self {
        Self::ModelOutput {
            message: message.into(),
        }
    }

    /// Creates an error for invalid input.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates an error for configuration errors.
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Creates a processing error tagged with the stage that failed.
    ///
    /// # Arguments
    ///
    /// * `kind` - The stage of processing where the error occurred.
    /// * `context` - Additional context about the error.
    /// * `error` - The underlying error that caused this error.
    pub fn processing_error(
        kind: ProcessingStage,
        context: impl Into<String>,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Processing {
            kind,
            context: context.into(),
            source: Box::new(error),
        }
    }

    /// Creates an error for a failed image write.
    pub fn export_error(
        context: impl Into<String>,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::processing_error(ProcessingStage::Export, context, error)
    }

    /// Returns true when the error only affects a single item and the batch
    /// it belongs to can keep going.
    pub fn is_item_local(&self) -> bool {
        matches!(
            self,
            Self::InvalidDimension { .. }
                | Self::MalformedAnnotation { .. }
                | Self::Download { .. }
                | Self::ModelOutput { .. }
        )
    }
}

impl From<image::ImageError> for HoleError {
    fn from(error: image::ImageError) -> Self {
        Self::ImageLoad(error)
    }
}

impl From<ConfigError> for HoleError {
    fn from(error: ConfigError) -> Self {
        Self::ConfigError {
            message: error.to_string(),
        }
    }
}

/// Convenient result alias for pipeline operations.
pub type HoleResult<T> = Result<T, HoleError>;
