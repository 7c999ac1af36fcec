// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Prometheus metrics module
//!
//! Provides global metrics using the default Prometheus registry via macros and
//! an Axum-compatible metrics handler.

use std::sync::LazyLock;

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use prometheus::{
    Encoder, HistogramVec, IntCounterVec, IntGauge, TextEncoder, register_histogram_vec,
    register_int_counter_vec, register_int_gauge,
};

use crate::error::ServerError;

/// Total number of HTTP requests, labeled by method, route and status.
pub static HTTP_REQUESTS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "credit_risk_http_requests_total",
        "Total number of HTTP requests, labeled by method, route and status",
        &["method", "route", "status"]
    )
    .expect("Failed to create credit_risk_http_requests_total counter vec")
});

/// Histogram for HTTP request durations in seconds.
pub static HTTP_REQUEST_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    register_histogram_vec!(
        "credit_risk_http_request_duration_seconds",
        "HTTP request durations in seconds",
        &["method", "route"],
        vec![0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]
    )
    .expect("Failed to create HTTP request duration histogram")
});

/// Total number of predictions, labeled by outcome.
pub static PREDICTIONS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "credit_risk_predictions_total",
        "Total number of predictions, labeled by outcome",
        &["outcome"]
    )
    .expect("Failed to create credit_risk_predictions_total counter vec")
});

/// Histogram for prediction durations in seconds.
pub static PREDICTION_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    register_histogram_vec!(
        "credit_risk_prediction_duration_seconds",
        "Prediction durations in seconds, labeled by outcome",
        &["outcome"],
        vec![0.0001, 0.00025, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1]
    )
    .expect("Failed to create prediction duration histogram")
});

/// Whether a model is currently loaded (1) or not (0).
pub static MODEL_LOADED: LazyLock<IntGauge> = LazyLock::new(|| {
    register_int_gauge!(
        "credit_risk_model_loaded",
        "Whether a model is currently loaded (1) or not (0)"
    )
    .expect("Failed to create model loaded gauge")
});

/// Record a completed HTTP request
///
/// # Arguments
/// * `method` - HTTP method of the request
/// * `route` - Matched route template, or `unmatched`
/// * `status` - Response status code
/// * `duration_secs` - The duration of the request in seconds
pub fn observe_http_request(method: &str, route: &str, status: StatusCode, duration_secs: f64) {
    HTTP_REQUESTS
        .with_label_values(&[method, route, status.as_str()])
        .inc();
    HTTP_REQUEST_DURATION
        .with_label_values(&[method, route])
        .observe(duration_secs);
}

/// Record a prediction
///
/// # Arguments
/// * `outcome` - `success`, `validation_error`, `prediction_error` or `unavailable`
/// * `duration_secs` - The duration of the prediction in seconds
pub fn observe_prediction(outcome: &str, duration_secs: f64) {
    PREDICTIONS.with_label_values(&[outcome]).inc();
    PREDICTION_DURATION
        .with_label_values(&[outcome])
        .observe(duration_secs);
}

/// Update the model loaded gauge
pub fn set_model_loaded(loaded: bool) {
    MODEL_LOADED.set(i64::from(loaded));
}

/// Axum handler that exports metrics in Prometheus text format
///
/// # Errors
///
/// Returns `ServerError::Internal` if the metrics cannot be encoded.
pub async fn metrics_handler() -> Result<Response, ServerError> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = vec![];
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(ServerError::internal)?;
    let body = String::from_utf8(buffer).map_err(ServerError::internal)?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, encoder.format_type().to_string())],
        body,
    )
        .into_response())
}
