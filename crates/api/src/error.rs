// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Error handling module
//!
//! This module provides error types for server operations, including the
//! mapping of request failures onto the JSON error envelope
//! `{status: "error", error_code, message, details?}`.

use std::net::SocketAddr;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use risk_predictor::ErrorCode;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Endpoints listed in the not-found response
pub const AVAILABLE_ENDPOINTS: &[&str] = &[
    "/api/v1/predict",
    "/api/v1/explain",
    "/api/v1/health",
    "/api/v1/model/info",
    "/api/v1/features",
    "/api/v1/example",
];

/// Error types for server operations
#[derive(Error, Debug)]
pub enum ServerError {
    /// Configuration validation errors
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Network binding errors
    #[error("Failed to bind to {address}: {source}")]
    Bind {
        /// Socket address that failed to bind
        address: SocketAddr,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Server startup errors
    #[error("Server startup failed: {source}")]
    Startup {
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Server shutdown errors
    #[error("Server shutdown failed: {source}")]
    Shutdown {
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Task join errors for async operations
    #[error("Task join error: {source}")]
    TaskJoin {
        /// Underlying tokio join error
        #[source]
        source: tokio::task::JoinError,
    },

    /// Timeout errors for operations that exceed time limits
    #[error("Operation timed out after {timeout_seconds} seconds")]
    Timeout {
        /// Timeout duration in seconds
        timeout_seconds: u64,
    },

    /// Request body was missing or an empty object
    #[error("Empty request body")]
    EmptyRequest,

    /// Request was not declared as JSON
    #[error("Content-Type must be application/json: {message}")]
    InvalidContentType {
        /// Detailed error message
        message: String,
    },

    /// Request body could not be parsed as JSON
    #[error("Invalid JSON request: {message}")]
    JsonError {
        /// Detailed error message
        message: String,
    },

    /// Request body exceeded the size limit
    #[error("Request body too large (max: {limit} bytes)")]
    PayloadTooLarge {
        /// Maximum accepted size in bytes
        limit: usize,
    },

    /// No model is loaded
    #[error("{message}")]
    ModelUnavailable {
        /// Error message
        message: String,
    },

    /// Route does not exist
    #[error("Endpoint not found: {path}")]
    NotFound {
        /// Requested path
        path: String,
    },

    /// Unexpected failure while serving a request
    #[error("Internal server error: {message}")]
    Internal {
        /// Error message
        message: String,
    },
}

/// Result type for server operations
pub type ServerResult<T> = Result<T, ServerError>;

impl ServerError {
    /// Create an internal error
    pub fn internal<T: ToString>(message: T) -> Self {
        Self::Internal {
            message: message.to_string(),
        }
    }

    /// HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::EmptyRequest | Self::InvalidContentType { .. } | Self::JsonError { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::ModelUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Timeout { .. } => StatusCode::REQUEST_TIMEOUT,
            Self::Config { .. }
            | Self::Bind { .. }
            | Self::Startup { .. }
            | Self::Shutdown { .. }
            | Self::TaskJoin { .. }
            | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Error code reported to clients, if the envelope carries one
    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            Self::EmptyRequest => Some(ErrorCode::EmptyRequest),
            Self::InvalidContentType { .. } => Some(ErrorCode::InvalidContentType),
            Self::JsonError { .. } | Self::PayloadTooLarge { .. } => Some(ErrorCode::InvalidJson),
            Self::NotFound { .. } => Some(ErrorCode::NotFound),
            Self::ModelUnavailable { .. } => None,
            Self::Config { .. }
            | Self::Bind { .. }
            | Self::Startup { .. }
            | Self::Shutdown { .. }
            | Self::TaskJoin { .. }
            | Self::Timeout { .. }
            | Self::Internal { .. } => Some(ErrorCode::InternalError),
        }
    }

    /// Convert error to JSON response body
    pub fn to_json_response(&self) -> serde_json::Value {
        match self {
            Self::EmptyRequest => json!({
                "status": "error",
                "error_code": ErrorCode::EmptyRequest,
                "message": "Empty request body",
            }),
            Self::InvalidContentType { message } => json!({
                "status": "error",
                "error_code": ErrorCode::InvalidContentType,
                "message": "Content-Type must be application/json",
                "details": { "error": message },
            }),
            Self::JsonError { message } => json!({
                "status": "error",
                "error_code": ErrorCode::InvalidJson,
                "message": "Invalid JSON request",
                "details": { "error": message },
            }),
            Self::PayloadTooLarge { .. } => json!({
                "status": "error",
                "error_code": ErrorCode::InvalidJson,
                "message": self.to_string(),
            }),
            Self::ModelUnavailable { message } => json!({
                "status": "error",
                "message": message,
            }),
            Self::NotFound { .. } => json!({
                "status": "error",
                "error_code": ErrorCode::NotFound,
                "message": "Endpoint not found",
                "available_endpoints": AVAILABLE_ENDPOINTS,
            }),
            Self::Timeout { timeout_seconds } => json!({
                "status": "error",
                "error_code": ErrorCode::InternalError,
                "message": "Request timed out",
                "details": { "timeout_seconds": timeout_seconds },
            }),
            _ => json!({
                "status": "error",
                "error_code": ErrorCode::InternalError,
                "message": "Internal server error",
                "details": { "error": self.to_string() },
            }),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }

        (status, Json(self.to_json_response())).into_response()
    }
}

/// Convenient From implementations for common async error types
impl From<tokio::task::JoinError> for ServerError {
    fn from(source: tokio::task::JoinError) -> Self {
        Self::TaskJoin { source }
    }
}
