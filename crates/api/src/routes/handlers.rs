// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! HTTP request handlers module
//!
//! This module provides HTTP request handlers for the credit risk server:
//! scoring, explanation, health, model metadata and documentation helpers.

use std::{collections::BTreeMap, time::Instant};

use axum::{
    Json,
    extract::State,
    http::{StatusCode, Uri},
    response::IntoResponse,
};
use risk_predictor::{
    ErrorCode, FeatureRecord, HealthReport, ModelInfo, PredictionResponse, PredictionSuccess,
    RiskExplanation, explain,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use shared_types::FeatureName;
use tracing::{debug, warn};
use utoipa::ToSchema;

use crate::{
    error::ServerError,
    extractors::JsonExtractor,
    metrics::{observe_prediction, set_model_loaded},
    state::ServerState,
};

/// Version reported by the service endpoints
pub const API_VERSION: &str = "1.0.0";

/// Message returned when no model is loaded
const NO_PIPELINE_LOADED: &str = "No pipeline loaded";

/// Liveness of the HTTP layer itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ApiStatus {
    /// Server is accepting requests
    Running,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthCheck {
    /// Model loading status
    #[serde(flatten)]
    pub report: HealthReport,
    /// Service version
    #[schema(example = "1.0.0")]
    pub version: String,
    /// HTTP layer status
    pub api_status: ApiStatus,
}

/// Successful prediction with an explanation attached
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ExplainedPrediction {
    /// Always `success`
    #[schema(example = "success")]
    pub status: String,
    /// Prediction result
    #[serde(flatten)]
    pub result: PredictionSuccess,
    /// Rule-based explanation of the probability
    pub explanation: RiskExplanation,
}

/// Accepted feature names and their descriptions
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FeaturesResponse {
    /// Canonical feature names
    #[schema(value_type = Vec<String>)]
    pub features: Vec<FeatureName>,
    /// Number of features
    pub count: usize,
    /// Description keyed by feature name
    #[schema(value_type = Object)]
    pub description: BTreeMap<FeatureName, String>,
}

/// Paths of the public endpoints
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EndpointMap {
    /// Scoring endpoint
    pub predict: String,
    /// Scoring with explanation
    pub explain: String,
    /// Health endpoint
    pub health: String,
    /// Model metadata endpoint
    pub model_info: String,
    /// Feature list endpoint
    pub features: String,
    /// Example request endpoint
    pub example: String,
}

/// Service index
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ServiceIndex {
    /// Service name
    pub message: String,
    /// Service version
    pub version: String,
    /// Public endpoints
    pub endpoints: EndpointMap,
    /// Where to start
    pub documentation: String,
}

fn prediction_outcome(response: &PredictionResponse) -> &'static str {
    match response.error_code() {
        None => "success",
        Some(ErrorCode::ValidationError) => "validation_error",
        Some(_) => "prediction_error",
    }
}

fn score(state: &ServerState, record: &FeatureRecord) -> Result<PredictionResponse, ServerError> {
    if record.is_empty() {
        return Err(ServerError::EmptyRequest);
    }

    let start = Instant::now();
    let response = state.predictor().predict(record);
    observe_prediction(
        prediction_outcome(&response),
        start.elapsed().as_secs_f64(),
    );

    Ok(response)
}

fn prediction_status(response: &PredictionResponse) -> StatusCode {
    if response.is_success() {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    }
}

/// Credit risk prediction
///
/// Scores a single applicant. Validation and scoring failures are reported in
/// the response body with status 400.
///
/// # Errors
///
/// Returns `ServerError` if the request is not a non-empty JSON object.
#[utoipa::path(
    post,
    path = "/api/v1/predict",
    tag = "prediction",
    summary = "Predict credit default risk",
    description = "Validates the applicant record and returns the predicted risk class, its probability and a confidence bucket, along with the model that produced it.",
    request_body(content = Object, description = "Applicant features keyed by name", content_type = "application/json"),
    responses(
        (status = 200, description = "Prediction succeeded", body = PredictionSuccess),
        (status = 400, description = "Validation error, prediction error or malformed request", body = Object),
        (status = 500, description = "Internal server error", body = Object)
    )
)]
pub async fn predict_handler(
    State(state): State<ServerState>,
    JsonExtractor(record): JsonExtractor<FeatureRecord>,
) -> Result<impl IntoResponse, ServerError> {
    let response = score(&state, &record)?;
    Ok((prediction_status(&response), Json(response)))
}

/// Credit risk prediction with explanation
///
/// # Errors
///
/// Returns `ServerError` if the request is not a non-empty JSON object.
#[utoipa::path(
    post,
    path = "/api/v1/explain",
    tag = "prediction",
    summary = "Predict and explain credit default risk",
    description = "Runs the same prediction as /api/v1/predict and, on success, attaches a risk band, one sentence per triggered applicant rule and recommended follow-up actions. Failures are identical to /api/v1/predict.",
    request_body(content = Object, description = "Applicant features keyed by name", content_type = "application/json"),
    responses(
        (status = 200, description = "Prediction succeeded", body = ExplainedPrediction),
        (status = 400, description = "Validation error, prediction error or malformed request", body = Object),
        (status = 500, description = "Internal server error", body = Object)
    )
)]
pub async fn explain_handler(
    State(state): State<ServerState>,
    JsonExtractor(record): JsonExtractor<FeatureRecord>,
) -> Result<axum::response::Response, ServerError> {
    let response = score(&state, &record)?;

    let PredictionResponse::Success(result) = response else {
        return Ok((prediction_status(&response), Json(response)).into_response());
    };

    let explanation = explain(&record, result.prediction.probability_score);
    debug!(
        band = ?explanation.risk_band,
        rules = explanation.explanations.len() - 1,
        "Explanation built"
    );

    Ok(Json(ExplainedPrediction {
        status: "success".to_string(),
        result,
        explanation,
    })
    .into_response())
}

/// Health check endpoint handler
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "health",
    summary = "Health check endpoint",
    description = "Reports whether a model is loaded. Returns 200 when healthy and 503 when no model is available.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthCheck),
        (status = 503, description = "No model loaded", body = HealthCheck)
    )
)]
pub async fn health_handler(State(state): State<ServerState>) -> impl IntoResponse {
    let report = state.predictor().health_check();
    set_model_loaded(report.pipeline_loaded);

    let status = if report.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthCheck {
            report,
            version: API_VERSION.to_string(),
            api_status: ApiStatus::Running,
        }),
    )
}

/// Model metadata endpoint handler
///
/// # Errors
///
/// Returns `ServerError::ModelUnavailable` if no model is loaded.
#[utoipa::path(
    get,
    path = "/api/v1/model/info",
    tag = "model",
    summary = "Loaded model metadata",
    responses(
        (status = 200, description = "Model metadata", body = ModelInfo),
        (status = 503, description = "No model loaded", body = Object)
    )
)]
pub async fn model_info_handler(
    State(state): State<ServerState>,
) -> Result<Json<ModelInfo>, ServerError> {
    state.predictor().get_model_info().map(Json).map_err(|e| {
        warn!(error = %e, "Model info requested with no model loaded");
        ServerError::ModelUnavailable {
            message: NO_PIPELINE_LOADED.to_string(),
        }
    })
}

/// Feature list endpoint handler
#[utoipa::path(
    get,
    path = "/api/v1/features",
    tag = "model",
    summary = "Accepted applicant features",
    responses(
        (status = 200, description = "Canonical feature list", body = FeaturesResponse)
    )
)]
pub async fn features_handler() -> Json<FeaturesResponse> {
    let features = FeatureName::all().to_vec();
    let description = features
        .iter()
        .map(|feature| (*feature, feature.description().to_string()))
        .collect();

    Json(FeaturesResponse {
        count: features.len(),
        features,
        description,
    })
}

/// Example request endpoint handler
#[utoipa::path(
    get,
    path = "/api/v1/example",
    tag = "model",
    summary = "Example prediction request",
    description = "Returns a documented example request body and the response it is expected to produce.",
    responses(
        (status = 200, description = "Example request and response", body = Object)
    )
)]
pub async fn example_handler() -> Json<Value> {
    Json(json!({
        "description": "Example request",
        "endpoint": "/api/v1/predict",
        "method": "POST",
        "headers": {
            "Content-Type": "application/json"
        },
        "body": {
            "person_age": 30,
            "person_income": 50000,
            "person_emp_exp": 5,
            "loan_amnt": 15000,
            "loan_int_rate": 10.5,
            "loan_percent_income": 0.3,
            "cb_person_cred_hist_length": 7,
            "credit_score": 680,
            "person_gender": "Male",
            "person_education": "Bachelor",
            "person_home_ownership": "RENT",
            "loan_intent": "PERSONAL",
            "previous_loan_defaults_on_file": "No"
        },
        "expected_response": {
            "status": "success",
            "prediction": {
                "risk_class": 0,
                "risk_label": "Faible risque",
                "probability_score": 0.23,
                "confidence_level": "High"
            },
            "model_info": {
                "model_name": "RandomForestClassifier",
                "model_version": "1.0",
                "features_used": 13
            }
        }
    }))
}

/// Service index handler
#[utoipa::path(
    get,
    path = "/",
    tag = "health",
    summary = "Service index",
    responses(
        (status = 200, description = "Service name, version and endpoints", body = ServiceIndex)
    )
)]
pub async fn index_handler() -> Json<ServiceIndex> {
    Json(ServiceIndex {
        message: "Credit Risk Prediction API".to_string(),
        version: API_VERSION.to_string(),
        endpoints: EndpointMap {
            predict: "/api/v1/predict".to_string(),
            explain: "/api/v1/explain".to_string(),
            health: "/api/v1/health".to_string(),
            model_info: "/api/v1/model/info".to_string(),
            features: "/api/v1/features".to_string(),
            example: "/api/v1/example".to_string(),
        },
        documentation: "See /api/v1/example for an example request".to_string(),
    })
}

/// Fallback for unknown routes
pub async fn not_found_handler(uri: Uri) -> ServerError {
    debug!(path = %uri.path(), "Unknown endpoint requested");
    ServerError::NotFound {
        path: uri.path().to_string(),
    }
}
