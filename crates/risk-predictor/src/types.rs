// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Type-safe domain models for credit risk prediction
//!
//! This module provides strongly-typed wrappers around the request payload,
//! the single feature row handed to a model, and the structured results the
//! predictor hands back to callers.

use std::{collections::BTreeMap, fmt, sync::LazyLock};

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use shared_types::{ConfidenceLevel, FeatureKind, FeatureName};
use utoipa::ToSchema;

use crate::{
    error::{PredictorError, PredictorResult},
    validation::{ValidationIssue, ValidationReport},
};

// Compile regex once at startup - safe because pattern is static
static VERSION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^v?\d+(\.\d+)*$").expect("version regex is valid"));

/// Model version with format validation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModelVersion(String);

impl ModelVersion {
    /// Version reported when nothing else is configured
    pub const DEFAULT: &'static str = "1.0";

    /// Create a new model version with validation
    ///
    /// # Errors
    ///
    /// Returns an error if the version format is invalid
    pub fn new(value: impl Into<String>) -> PredictorResult<Self> {
        let s = value.into();
        if s.is_empty() {
            return Err(PredictorError::config("Model version cannot be empty"));
        }

        // v1, v1.0, 1.2.3, ...
        if !VERSION_REGEX.is_match(&s) {
            return Err(PredictorError::config(format!(
                "Model version '{s}' must be a dotted version (e.g., 'v1', '1.0', '1.2.3')"
            )));
        }

        Ok(Self(s))
    }

    /// Get the string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ModelVersion {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl TryFrom<String> for ModelVersion {
    type Error = PredictorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ModelVersion> for String {
    fn from(version: ModelVersion) -> Self {
        version.0
    }
}

impl fmt::Display for ModelVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw credit applicant payload as received from a client
///
/// Keys that are not recognized features are kept but never read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureRecord(Map<String, Value>);

impl FeatureRecord {
    /// Wrap a JSON object
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Get the raw value of a feature
    pub fn get(&self, feature: FeatureName) -> Option<&Value> {
        self.0.get(feature.as_str())
    }

    /// Check whether a feature key is present
    pub fn contains(&self, feature: FeatureName) -> bool {
        self.0.contains_key(feature.as_str())
    }

    /// Number of keys in the payload, recognized or not
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check whether the payload has no keys at all
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Insert or replace a field
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    /// Borrow the underlying JSON object
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for FeatureRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

impl TryFrom<Value> for FeatureRecord {
    type Error = PredictorError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(PredictorError::feature(format!(
                "feature record must be a JSON object, got {}",
                json_type_name(&other)
            ))),
        }
    }
}

/// Single cell of a feature row
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    /// Numeric feature value
    Number(f64),
    /// Categorical feature value
    Category(String),
}

/// One applicant's features, selected and ordered canonically
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    values: Vec<FeatureValue>,
}

impl FeatureRow {
    /// Select the canonical columns out of a record
    ///
    /// # Errors
    ///
    /// Returns an error if a column is absent or has the wrong JSON type
    pub fn from_record(record: &FeatureRecord) -> PredictorResult<Self> {
        let values = FeatureName::all()
            .iter()
            .map(|&feature| {
                let raw = record.get(feature).ok_or_else(|| {
                    PredictorError::feature(format!("column '{feature}' is missing"))
                })?;

                match feature.kind() {
                    FeatureKind::Numeric => raw
                        .as_f64()
                        .map(FeatureValue::Number)
                        .ok_or_else(|| {
                            PredictorError::feature(format!(
                                "column '{feature}' must be numeric, got {}",
                                json_type_name(raw)
                            ))
                        }),
                    FeatureKind::Categorical => raw
                        .as_str()
                        .map(|s| FeatureValue::Category(s.to_string()))
                        .ok_or_else(|| {
                            PredictorError::feature(format!(
                                "column '{feature}' must be a string, got {}",
                                json_type_name(raw)
                            ))
                        }),
                }
            })
            .collect::<PredictorResult<Vec<_>>>()?;

        Ok(Self { values })
    }

    /// Get a numeric column
    pub fn number(&self, feature: FeatureName) -> Option<f64> {
        match self.values.get(feature.index()) {
            Some(FeatureValue::Number(n)) => Some(*n),
            _ => None,
        }
    }

    /// Get a categorical column
    pub fn category(&self, feature: FeatureName) -> Option<&str> {
        match self.values.get(feature.index()) {
            Some(FeatureValue::Category(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// All cells in canonical order
    pub fn values(&self) -> &[FeatureValue] {
        &self.values
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Machine-readable error codes returned to API clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Payload failed schema validation
    ValidationError,
    /// Model missing or inference failed
    PredictionError,
    /// Request body was empty
    EmptyRequest,
    /// Request was not sent as JSON
    InvalidContentType,
    /// Request body was not valid JSON
    InvalidJson,
    /// Route does not exist
    NotFound,
    /// Unexpected server failure
    InternalError,
}

impl ErrorCode {
    /// Returns the wire representation
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::PredictionError => "PREDICTION_ERROR",
            Self::EmptyRequest => "EMPTY_REQUEST",
            Self::InvalidContentType => "INVALID_CONTENT_TYPE",
            Self::InvalidJson => "INVALID_JSON",
            Self::NotFound => "NOT_FOUND",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PredictionResponse {
    /// Model produced a result
    Success(PredictionSuccess),
    /// Validation or inference failed
    Error(PredictionFailure),
}

impl PredictionResponse {
    /// Build a validation failure from a report
    pub fn validation_error(report: ValidationReport) -> Self {
        Self::Error(PredictionFailure {
            error_code: ErrorCode::ValidationError,
            message: "Invalid input data".to_string(),
            details: Some(ErrorDetails::Validation(report.into_errors())),
            timestamp: Utc::now(),
        })
    }

    /// Build a prediction failure carrying the underlying cause
    pub fn prediction_error(cause: impl ToString) -> Self {
        Self::Error(PredictionFailure {
            error_code: ErrorCode::PredictionError,
            message: "Prediction failed".to_string(),
            details: Some(ErrorDetails::Cause(ErrorCause {
                error: cause.to_string(),
            })),
            timestamp: Utc::now(),
        })
    }

    /// Check if the prediction succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Get the success payload
    pub fn as_success(&self) -> Option<&PredictionSuccess> {
        match self {
            Self::Success(success) => Some(success),
            Self::Error(_) => None,
        }
    }

    /// Get the failure payload
    pub fn as_failure(&self) -> Option<&PredictionFailure> {
        match self {
            Self::Success(_) => None,
            Self::Error(failure) => Some(failure),
        }
    }

    /// Error code of a failed prediction
    pub fn error_code(&self) -> Option<ErrorCode> {
        self.as_failure().map(|failure| failure.error_code)
    }
}

/// Successful prediction body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PredictionSuccess {
    /// Model output
    pub prediction: PredictionDetails,
    /// Model that produced the output
    pub model_info: ModelSummary,
    /// When the prediction finished
    pub timestamp: DateTime<Utc>,
    /// Wall time spent in the predictor, in milliseconds
    pub processing_time_ms: f64,
}

/// Risk class and probability produced by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PredictionDetails {
    /// 0 for low risk, 1 for high risk
    pub risk_class: u8,
    /// Human-readable label of the class
    pub risk_label: String,
    /// Probability of default, rounded to 4 decimals
    pub probability_score: f64,
    /// Bucketed distance of the probability from 0.5
    pub confidence_level: ConfidenceLevel,
}

/// Model identification attached to every prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ModelSummary {
    /// Display name of the classifier
    pub model_name: String,
    /// Model version
    pub model_version: String,
    /// Number of input features the model consumes
    pub features_used: usize,
}

/// Failed prediction body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PredictionFailure {
    /// Machine-readable error code
    pub error_code: ErrorCode,
    /// Human-readable summary
    pub message: String,
    /// Per-field validation errors or the underlying cause
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<ErrorDetails>,
    /// When the failure was recorded
    pub timestamp: DateTime<Utc>,
}

/// Extra information attached to a failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorDetails {
    /// Underlying error message
    Cause(ErrorCause),
    /// Validation errors keyed by field name or `missing_fields`
    Validation(BTreeMap<String, ValidationIssue>),
}

/// Wrapper for an underlying error message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ErrorCause {
    /// Error message
    pub error: String,
}

/// Status of a loaded model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ModelStatus {
    /// Model is loaded and serving
    Loaded,
}

/// Snapshot of the loaded model's metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ModelInfo {
    /// Display name of the classifier
    pub model_name: String,
    /// Model version
    pub model_version: String,
    /// Input features in canonical order
    #[schema(value_type = Vec<String>)]
    pub features: Vec<FeatureName>,
    /// Number of input features
    pub features_count: usize,
    /// When the model was loaded
    pub loaded_at: DateTime<Utc>,
    /// Always `loaded`
    pub status: ModelStatus,
}

/// Predictor health
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// A model is loaded
    Healthy,
    /// No model is loaded
    Unhealthy,
}

/// Result of a predictor health check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HealthReport {
    /// Overall status
    pub status: HealthStatus,
    /// Whether a model is loaded
    pub pipeline_loaded: bool,
    /// When the check ran
    pub timestamp: DateTime<Utc>,
}

impl HealthReport {
    /// Check if the predictor can serve predictions
    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}
