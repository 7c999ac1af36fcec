// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Main credit risk prediction orchestrator
//!
//! This module provides the `Predictor` that owns the loaded model and turns
//! raw applicant payloads into structured prediction results. Failures while
//! predicting never escape as errors: they are folded into
//! [`PredictionResponse::Error`].

use std::{
    fmt,
    path::{Path, PathBuf},
    sync::{Arc, PoisonError, RwLock},
    time::Instant,
};

use chrono::{DateTime, Utc};
use shared_types::{ConfidenceLevel, FeatureName, RiskClass};
use tracing::{debug, error, info, instrument, warn};

use crate::{
    artifact::{ModelDescriptor, Preprocessor},
    classifier::Classifier,
    config::ModelConfig,
    error::{PredictorError, PredictorResult},
    types::{
        FeatureRecord, FeatureRow, HealthReport, HealthStatus, ModelInfo, ModelStatus,
        ModelSummary, ModelVersion, PredictionDetails, PredictionResponse, PredictionSuccess,
    },
    validation,
};

/// Metadata captured when a model is loaded
#[derive(Debug, Clone, PartialEq)]
pub struct ModelMetadata {
    /// Display name of the classifier
    pub model_name: String,
    /// Version of the fitted model
    pub model_version: ModelVersion,
    /// Input features in canonical order
    pub feature_names: Vec<FeatureName>,
    /// When the model was loaded
    pub loaded_at: DateTime<Utc>,
    /// Descriptor file the model came from, if any
    pub source: Option<PathBuf>,
}

/// A model ready to score applicants
pub struct LoadedModel {
    preprocessor: Preprocessor,
    classifier: Box<dyn Classifier>,
    metadata: ModelMetadata,
}

impl LoadedModel {
    /// Assemble a model from its parts
    pub fn new(
        model_name: impl Into<String>,
        model_version: ModelVersion,
        preprocessor: Preprocessor,
        classifier: Box<dyn Classifier>,
    ) -> Self {
        Self {
            preprocessor,
            classifier,
            metadata: ModelMetadata {
                model_name: model_name.into(),
                model_version,
                feature_names: FeatureName::all().to_vec(),
                loaded_at: Utc::now(),
                source: None,
            },
        }
    }

    /// Build a model from a validated descriptor
    pub fn from_descriptor(descriptor: ModelDescriptor) -> Self {
        let model_name = descriptor.display_name();
        Self::new(
            model_name,
            descriptor.model_version,
            descriptor.preprocessor,
            descriptor.classifier.into_classifier(),
        )
    }

    /// Record the descriptor path
    pub fn with_source<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.metadata.source = Some(path.as_ref().to_path_buf());
        self
    }

    /// Load metadata
    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    /// Class and default probability for one row
    fn score(&self, row: &FeatureRow) -> PredictorResult<(RiskClass, f64)> {
        let x = self.preprocessor.transform(row)?;

        let class = self.classifier.predict(&x)?;
        let risk_class = RiskClass::from_class_index(class).ok_or_else(|| {
            PredictorError::inference(format!("classifier returned unknown class {class}"))
        })?;

        let proba = self.classifier.predict_proba(&x)?;
        // single-column output means the model only ever saw one class
        let probability = match proba.as_slice() {
            [] => return Err(PredictorError::inference("probability vector is empty")),
            [only] => *only,
            [_, positive, ..] => *positive,
        };
        if !(0.0..=1.0).contains(&probability) {
            return Err(PredictorError::inference(format!(
                "probability {probability} is outside [0, 1]"
            )));
        }

        Ok((risk_class, probability))
    }
}

impl fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedModel")
            .field("classifier", &self.classifier.name())
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

/// Credit risk predictor
///
/// Readers clone the current model `Arc` under a short read lock and score
/// without holding it; a reload only takes the write lock to swap the pointer.
#[derive(Debug)]
pub struct Predictor {
    config: ModelConfig,
    model: RwLock<Option<Arc<LoadedModel>>>,
}

impl Predictor {
    /// Create a predictor with no model loaded
    pub fn new(config: ModelConfig) -> Self {
        Self {
            config,
            model: RwLock::new(None),
        }
    }

    /// Create a predictor and load the configured model if requested
    #[instrument(skip(config), fields(path = %config.path.display()))]
    pub async fn from_config(config: ModelConfig) -> Self {
        let predictor = Self::new(config);

        if predictor.config.load_on_startup {
            if predictor.reload().await {
                info!("Model loaded at startup");
            } else {
                warn!("Model could not be loaded at startup, serving unhealthy");
            }
        } else {
            debug!("Model loading deferred");
        }

        predictor
    }

    /// Model configuration
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Load the configured descriptor
    pub async fn reload(&self) -> bool {
        let path = self.config.path.clone();
        self.load_model(path).await
    }

    /// Load a descriptor and swap it in
    ///
    /// Returns `false` and keeps the current model when loading fails.
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub async fn load_model<P: AsRef<Path>>(&self, path: P) -> bool {
        let path = path.as_ref();
        let descriptor = match ModelDescriptor::from_file(path).await {
            Ok(descriptor) => descriptor,
            Err(e) => {
                error!(error = %e, "Failed to load model pipeline");
                return false;
            }
        };

        if descriptor.model_version != self.config.version {
            warn!(
                expected = %self.config.version,
                found = %descriptor.model_version,
                "Model version differs from configuration"
            );
        }

        let model = LoadedModel::from_descriptor(descriptor).with_source(path);
        info!(
            model_name = %model.metadata.model_name,
            model_version = %model.metadata.model_version,
            "Model loaded successfully"
        );
        self.install(model);
        true
    }

    /// Swap in an already built model
    pub fn install(&self, model: LoadedModel) {
        let model = Arc::new(model);
        let mut slot = self.model.write().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(model);
    }

    /// Check if a model is loaded
    pub fn is_loaded(&self) -> bool {
        self.current().is_some()
    }

    fn current(&self) -> Option<Arc<LoadedModel>> {
        self.model
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Score one applicant
    #[instrument(skip_all, fields(fields = record.len()))]
    pub fn predict(&self, record: &FeatureRecord) -> PredictionResponse {
        let start_time = Instant::now();

        let Some(model) = self.current() else {
            error!("Prediction requested with no model loaded");
            return PredictionResponse::prediction_error(PredictorError::NotLoaded);
        };

        let report = validation::validate(record);
        if !report.is_valid() {
            warn!(failures = report.len(), "Input validation failed");
            return PredictionResponse::validation_error(report);
        }

        let scored = FeatureRow::from_record(record).and_then(|row| model.score(&row));
        let (risk_class, probability) = match scored {
            Ok(scored) => scored,
            Err(e) => {
                error!(error = %e, "Prediction failed");
                return PredictionResponse::prediction_error(e);
            }
        };

        let confidence_level = ConfidenceLevel::from_probability(probability);
        let processing_time_ms = round_to(start_time.elapsed().as_secs_f64() * 1000.0, 2);

        info!(
            risk_class = risk_class.as_u8(),
            probability,
            confidence = %confidence_level,
            processing_time_ms,
            "Prediction completed"
        );

        let metadata = model.metadata();
        PredictionResponse::Success(PredictionSuccess {
            prediction: PredictionDetails {
                risk_class: risk_class.as_u8(),
                risk_label: risk_class.label().to_string(),
                probability_score: round_to(probability, 4),
                confidence_level,
            },
            model_info: ModelSummary {
                model_name: metadata.model_name.clone(),
                model_version: metadata.model_version.to_string(),
                features_used: metadata.feature_names.len(),
            },
            timestamp: Utc::now(),
            processing_time_ms,
        })
    }

    /// Metadata of the loaded model
    pub fn get_model_info(&self) -> PredictorResult<ModelInfo> {
        let model = self.current().ok_or(PredictorError::NotLoaded)?;
        let metadata = model.metadata();
        Ok(ModelInfo {
            model_name: metadata.model_name.clone(),
            model_version: metadata.model_version.to_string(),
            features: metadata.feature_names.clone(),
            features_count: metadata.feature_names.len(),
            loaded_at: metadata.loaded_at,
            status: ModelStatus::Loaded,
        })
    }

    /// Report whether predictions can be served
    pub fn health_check(&self) -> HealthReport {
        let pipeline_loaded = self.is_loaded();
        HealthReport {
            status: if pipeline_loaded {
                HealthStatus::Healthy
            } else {
                HealthStatus::Unhealthy
            },
            pipeline_loaded,
            timestamp: Utc::now(),
        }
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
