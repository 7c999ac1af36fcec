// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Credit Risk API Server Implementation
//!
//! This crate provides the HTTP server for the credit risk prediction service, built
//! with Axum and designed for production use with layered configuration, middleware,
//! and graceful shutdown capabilities.
//!
//! # Module Structure
//!
//! - [`config`]: Server configuration and environment management with hierarchical loading
//! - [`error`]: Error types and the JSON error envelope returned to clients
//! - [`extractors`]: JSON body extraction mapped onto the service error codes
//! - [`state`]: Shared application state holding the predictor and cancellation token
//! - [`server`]: Main server implementation, lifecycle, and coordinated shutdown
//! - [`routes`]: Route configuration and HTTP request handlers
//! - [`middleware`]: Per-route request metrics
//! - [`metrics`]: Prometheus metrics and the `/metrics` exporter
//! - [`docs`] and [`openapi`]: `OpenAPI` document and Swagger UI
//!
//! # Key Features
//!
//! - **Single Shared Predictor**: One model pipeline per process, injected via state
//! - **Graceful Shutdown**: Coordinated termination using `CancellationToken` with a drain timeout
//! - **Health Monitoring**: 503 from the health endpoint until a model is loaded
//! - **Request Tracing**: Request ids propagated through tracing spans and response headers

pub mod config;
pub mod docs;
pub mod error;
pub mod extractors;
pub mod metrics;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod server;
pub mod state;

pub use config::{Environment, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use routes::handlers::{API_VERSION, HealthCheck};
pub use server::{Server, ShutdownConfig};
pub use state::ServerState;
