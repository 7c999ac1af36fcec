// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Model configuration
//!
//! Where the predictor finds its model descriptor, which version it expects,
//! and whether the descriptor is loaded eagerly at startup.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    error::{PredictorError, PredictorResult},
    types::ModelVersion,
};

/// Default location of the model descriptor, relative to the working directory
pub const DEFAULT_MODEL_PATH: &str = "assets/models/credit_risk_pipeline.json";

/// Model loading configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to the JSON model descriptor
    pub path: PathBuf,
    /// Version the deployment expects the descriptor to carry
    pub version: ModelVersion,
    /// Load the descriptor when the predictor is created
    pub load_on_startup: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_MODEL_PATH),
            version: ModelVersion::default(),
            load_on_startup: true,
        }
    }
}

impl ModelConfig {
    /// Configuration pointing at a specific descriptor
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Configuration that never loads a model on its own
    pub fn unloaded() -> Self {
        Self {
            load_on_startup: false,
            ..Self::default()
        }
    }

    /// Set the expected model version
    pub fn with_version(mut self, version: ModelVersion) -> Self {
        self.version = version;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> PredictorResult<()> {
        if self.path.as_os_str().is_empty() {
            return Err(PredictorError::config("Model path cannot be empty"));
        }
        if self.path.extension().is_none_or(|ext| ext != "json") {
            return Err(PredictorError::config(format!(
                "Model path {} must point at a .json descriptor",
                self.path.display()
            )));
        }
        Ok(())
    }
}
