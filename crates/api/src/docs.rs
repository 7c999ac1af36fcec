// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! `OpenAPI` document definition

use risk_predictor::{
    ErrorCode, HealthReport, HealthStatus, ModelInfo, PredictionSuccess, RiskBand,
    RiskExplanation,
};
use utoipa::OpenApi;

use crate::routes::handlers::{
    self, ApiStatus, EndpointMap, ExplainedPrediction, FeaturesResponse, HealthCheck,
    ServiceIndex,
};

/// `OpenAPI` document for the credit risk service
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "Credit Risk Prediction API",
        version = "1.0.0",
        description = "Scores credit applicants for default risk using a pre-trained classification pipeline.",
        license(name = "Apache-2.0")
    ),
    paths(
        handlers::index_handler,
        handlers::predict_handler,
        handlers::explain_handler,
        handlers::health_handler,
        handlers::model_info_handler,
        handlers::features_handler,
        handlers::example_handler,
    ),
    components(schemas(
        ApiStatus,
        EndpointMap,
        ErrorCode,
        ExplainedPrediction,
        FeaturesResponse,
        HealthCheck,
        HealthReport,
        HealthStatus,
        ModelInfo,
        PredictionSuccess,
        RiskBand,
        RiskExplanation,
        ServiceIndex,
    )),
    tags(
        (name = "prediction", description = "Credit risk scoring"),
        (name = "model", description = "Model metadata and request documentation"),
        (name = "health", description = "Service status")
    )
)]
pub struct ApiDoc;
