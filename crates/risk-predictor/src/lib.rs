// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Credit default risk prediction
//!
//! This crate scores credit applicants with a pre-fitted tabular model. The
//! model ships as a JSON descriptor that embeds its own preprocessing, so the
//! service forwards raw applicant fields and never re-implements feature
//! engineering.
//!
//! # Architecture
//!
//! - [`validation`]: schema checks on raw payloads, collecting every failure
//! - [`artifact`]: descriptor loading, standard scaling and one-hot encoding
//! - [`classifier`]: random forest and logistic regression evaluators
//! - [`predictor`]: model ownership, hot swapping and response shaping
//! - [`explain`]: rule-based explanation of a risk score
//! - [`config`]: where the descriptor lives and when it is loaded
//! - [`error`]: error types
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use risk_predictor::{FeatureRecord, ModelConfig, Predictor};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let predictor = Predictor::from_config(ModelConfig::default()).await;
//!
//! let record = FeatureRecord::try_from(serde_json::json!({
//!     "person_age": 30,
//!     "person_income": 50000,
//!     "person_emp_exp": 5,
//!     "loan_amnt": 15000,
//!     "loan_int_rate": 10.5,
//!     "loan_percent_income": 0.3,
//!     "cb_person_cred_hist_length": 7,
//!     "credit_score": 680,
//!     "person_gender": "Male",
//!     "person_education": "Bachelor",
//!     "person_home_ownership": "RENT",
//!     "loan_intent": "PERSONAL",
//!     "previous_loan_defaults_on_file": "No"
//! }))?;
//!
//! let response = predictor.predict(&record);
//! if let Some(success) = response.as_success() {
//!     println!("Risk: {}", success.prediction.risk_label);
//! }
//! # Ok(())
//! # }
//! ```

pub mod artifact;
pub mod classifier;
pub mod config;
pub mod error;
pub mod explain;
pub mod predictor;
pub mod types;
pub mod validation;

// Re-export main types for convenience
pub use artifact::{ModelDescriptor, Preprocessor};
pub use classifier::{Classifier, ClassifierSpec};
pub use config::ModelConfig;
pub use error::{PredictorError, PredictorResult};
pub use explain::{RiskBand, RiskExplanation, explain};
pub use predictor::{LoadedModel, ModelMetadata, Predictor};
pub use types::{
    ErrorCause, ErrorCode, ErrorDetails, FeatureRecord, HealthReport, HealthStatus, ModelInfo,
    ModelVersion, PredictionResponse, PredictionSuccess,
};
pub use validation::{ValidationIssue, ValidationReport, validate};
