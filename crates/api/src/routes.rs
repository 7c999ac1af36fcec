// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Routes module
//!
//! This module provides route configuration and handlers for the credit risk server.

pub mod handlers;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
};
use handlers::{
    example_handler, explain_handler, features_handler, health_handler, index_handler,
    model_info_handler, not_found_handler, predict_handler,
};

use crate::{
    extractors::MAX_JSON_PAYLOAD_SIZE,
    metrics::metrics_handler,
    middleware::http_metrics_middleware,
    openapi::{openapi_spec, swagger_ui},
    state::ServerState,
};

/// Create application routes
pub fn create_routes() -> Router<ServerState> {
    // Operational endpoints
    let service_routes = Router::new()
        .route("/", get(index_handler))
        .route("/metrics", get(metrics_handler));

    // Documentation endpoints
    let docs_routes = Router::new()
        .route("/api-doc/openapi.json", get(openapi_spec))
        .route("/swagger-ui", get(swagger_ui));

    let api_routes = Router::new()
        .route("/predict", post(predict_handler))
        .route("/explain", post(explain_handler))
        .route("/health", get(health_handler))
        .route("/model/info", get(model_info_handler))
        .route("/features", get(features_handler))
        .route("/example", get(example_handler));

    let v1 = Router::new().nest("/api/v1", api_routes);

    Router::new()
        .merge(service_routes)
        .merge(docs_routes)
        .merge(v1)
        .fallback(not_found_handler)
        .layer(DefaultBodyLimit::max(MAX_JSON_PAYLOAD_SIZE))
        .layer(middleware::from_fn(http_metrics_middleware))
}
