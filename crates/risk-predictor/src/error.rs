// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for risk prediction operations
//!
//! This module provides error handling for model descriptor loading,
//! preprocessing and inference. Request validation failures are not errors:
//! they are reported through [`crate::validation::ValidationReport`].

use thiserror::Error;

/// Result type alias for risk prediction operations
pub type PredictorResult<T> = Result<T, PredictorError>;

/// Error types for risk prediction operations
#[derive(Debug, Error)]
pub enum PredictorError {
    /// Configuration is missing or invalid
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message
        message: String,
    },

    /// I/O error while reading a model descriptor
    #[error("I/O error: {message}")]
    Io {
        /// Error message
        message: String,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {message}")]
    Json {
        /// Error message
        message: String,
    },

    /// Model descriptor is structurally invalid
    #[error("Invalid model artifact: {message}")]
    InvalidArtifact {
        /// Error message
        message: String,
    },

    /// No model has been loaded yet
    #[error("pipeline not loaded")]
    NotLoaded,

    /// Feature row could not be built or transformed
    #[error("Feature error: {message}")]
    Feature {
        /// Error message
        message: String,
    },

    /// Classifier failed during inference
    #[error("Inference error: {message}")]
    Inference {
        /// Error message
        message: String,
    },
}

impl PredictorError {
    /// Create a configuration error
    pub fn config<T: ToString>(message: T) -> Self {
        Self::Configuration {
            message: message.to_string(),
        }
    }

    /// Create an I/O error
    pub fn io<T: ToString>(message: T) -> Self {
        Self::Io {
            message: message.to_string(),
        }
    }

    /// Create a JSON error
    pub fn json<T: ToString>(message: T) -> Self {
        Self::Json {
            message: message.to_string(),
        }
    }

    /// Create an invalid artifact error
    pub fn invalid_artifact<T: ToString>(message: T) -> Self {
        Self::InvalidArtifact {
            message: message.to_string(),
        }
    }

    /// Create a feature error
    pub fn feature<T: ToString>(message: T) -> Self {
        Self::Feature {
            message: message.to_string(),
        }
    }

    /// Create an inference error
    pub fn inference<T: ToString>(message: T) -> Self {
        Self::Inference {
            message: message.to_string(),
        }
    }

    /// Check if this error happened while loading a model descriptor
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            PredictorError::Io { .. }
                | PredictorError::Json { .. }
                | PredictorError::InvalidArtifact { .. }
        )
    }

    /// Check if this error happened while serving a prediction
    pub fn is_inference_error(&self) -> bool {
        matches!(
            self,
            PredictorError::NotLoaded
                | PredictorError::Feature { .. }
                | PredictorError::Inference { .. }
        )
    }
}

/// Convert from JSON errors
impl From<serde_json::Error> for PredictorError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json {
            message: err.to_string(),
        }
    }
}

/// Convert from I/O errors
impl From<std::io::Error> for PredictorError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
        }
    }
}
