// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Server implementation module
//!
//! This module provides the main server struct and implementation for the credit risk
//! server, including server lifecycle management, router configuration, and coordinated
//! graceful shutdown using `CancellationToken`.

use std::{any::Any, future::IntoFuture, net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    BoxError, Router,
    error_handling::HandleErrorLayer,
    http::{HeaderName, HeaderValue, Method, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use hyper::Request;
use risk_predictor::Predictor;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower::{
    ServiceBuilder,
    timeout::{TimeoutLayer, error::Elapsed},
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{error, info, info_span, warn};

use crate::{
    config::ServerConfig,
    error::{ServerError, ServerResult},
    metrics::set_model_loaded,
    routes::create_routes,
    state::ServerState,
};

// Server constants
const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");
const DEFAULT_GRACEFUL_SHUTDOWN_TIMEOUT_SECONDS: u64 = 30;

/// Configuration for server shutdown behavior
#[derive(Debug, Clone)]
pub struct ShutdownConfig {
    /// Maximum time to wait for in-flight requests once shutdown has started
    pub graceful_timeout: Duration,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            graceful_timeout: Duration::from_secs(DEFAULT_GRACEFUL_SHUTDOWN_TIMEOUT_SECONDS),
        }
    }
}

/// Main server struct
#[derive(Debug)]
pub struct Server {
    /// Server configuration
    config: ServerConfig,
    /// Application router
    router: Router,
    /// Server state
    state: ServerState,
    /// Cancellation token for coordinated shutdown
    cancellation_token: CancellationToken,
    /// Configuration for coordinated shutdown
    graceful_shutdown_config: ShutdownConfig,
}

impl Server {
    /// Create new server instance
    ///
    /// Builds the predictor from the model configuration. A model that fails to
    /// load leaves the server running and reporting unhealthy.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Config` if the configuration is invalid.
    pub async fn new(config: ServerConfig, shutdown_config: ShutdownConfig) -> ServerResult<Self> {
        let predictor = Predictor::from_config(config.model.clone()).await;
        if !predictor.is_loaded() && config.model.load_on_startup {
            warn!(
                path = %config.model.path.display(),
                "Starting without a model, predictions will fail until one is loaded"
            );
        }
        Self::with_predictor(config, shutdown_config, Arc::new(predictor))
    }

    /// Create server with a custom predictor for dependency injection
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Config` if the configuration is invalid.
    pub fn with_predictor(
        config: ServerConfig,
        graceful_shutdown_config: ShutdownConfig,
        predictor: Arc<Predictor>,
    ) -> ServerResult<Self> {
        set_model_loaded(predictor.is_loaded());

        let cancellation_token = CancellationToken::new();
        let state = ServerState::new(config.clone(), predictor, cancellation_token.child_token());
        let router = Self::create_router(state.clone())?;

        Ok(Self {
            config,
            router,
            state,
            cancellation_token,
            graceful_shutdown_config,
        })
    }

    /// Build the CORS layer from the configured origins
    fn cors_layer(origins: &[String]) -> ServerResult<CorsLayer> {
        if origins.is_empty() {
            return Ok(CorsLayer::permissive());
        }

        let origins = origins
            .iter()
            .map(|origin| {
                origin
                    .parse::<HeaderValue>()
                    .map_err(|e| ServerError::Config {
                        message: format!("invalid CORS origin '{origin}': {e}"),
                    })
            })
            .collect::<ServerResult<Vec<_>>>()?;

        Ok(CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([CONTENT_TYPE]))
    }

    /// Create application router with middleware
    fn create_router(state: ServerState) -> ServerResult<Router> {
        let router = Self::with_middleware(create_routes(), state.config())?;
        Ok(router.with_state(state))
    }

    /// Wrap a router in the request id, tracing, panic, CORS and timeout layers
    ///
    /// Panics and timeouts are rendered through the JSON error envelope like
    /// every other failure.
    fn with_middleware<S>(router: Router<S>, config: &ServerConfig) -> ServerResult<Router<S>>
    where
        S: Clone + Send + Sync + 'static,
    {
        let timeout_duration = config.timeout_seconds.value();
        let timeout_seconds = timeout_duration.as_secs();
        let cors = Self::cors_layer(&config.cors_allowed_origins)?;

        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(REQUEST_ID_HEADER, MakeRequestUuid))
            .layer(
                TraceLayer::new_for_http().make_span_with(|req: &Request<_>| {
                    if let Some(request_id) = req.headers().get(REQUEST_ID_HEADER) {
                        info_span!("http_request", ?request_id, method = %req.method(), uri = %req.uri())
                    } else {
                        error!("failed to extract id from request");
                        info_span!("http_request", request_id = "unknown", method = %req.method(), uri = %req.uri())
                    }
                }),
            )
            .layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER))
            .layer(CatchPanicLayer::custom(handle_panic))
            .layer(cors)
            .layer(HandleErrorLayer::new(move |err: BoxError| async move {
                handle_middleware_error(&err, timeout_seconds)
            }))
            .layer(TimeoutLayer::new(timeout_duration));

        Ok(router.layer(middleware))
    }

    /// Run the server with coordinated graceful shutdown
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Bind` if unable to bind to the configured address,
    /// `ServerError::Startup` if the server fails to start, or
    /// `ServerError::Timeout` if in-flight requests outlive the graceful timeout.
    pub async fn run(self) -> ServerResult<()> {
        let addr = self.config.socket_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                address: addr,
                source,
            })?;

        let actual_addr = listener
            .local_addr()
            .map_err(|source| ServerError::Startup { source })?;

        info!(
            address = %actual_addr,
            environment = %self.config.environment,
            model_loaded = self.state.predictor().is_loaded(),
            "Credit risk server starting",
        );

        let cancellation_token = self.cancellation_token.clone();
        let shutdown_token = cancellation_token.clone();
        tokio::spawn(async move {
            info!("spawning the graceful shutdown task");
            Self::shutdown_signal_handler(shutdown_token).await;
        });

        let graceful_token = cancellation_token.clone();
        let serve = axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                graceful_token.cancelled().await;
                info!("Draining in-flight requests");
            })
            .into_future();
        tokio::pin!(serve);

        let graceful_timeout = self.graceful_shutdown_config.graceful_timeout;
        let drain_deadline = async {
            cancellation_token.cancelled().await;
            tokio::time::sleep(graceful_timeout).await;
        };

        tokio::select! {
            result = &mut serve => match result {
                Ok(()) => {
                    info!("Credit risk server shut down gracefully");
                    Ok(())
                }
                Err(e) => {
                    error!(error = ?e, "Server error during shutdown");
                    Err(ServerError::Shutdown { source: e })
                }
            },
            () = drain_deadline => {
                warn!(
                    timeout_seconds = graceful_timeout.as_secs(),
                    "Graceful shutdown timed out, abandoning in-flight requests"
                );
                Err(ServerError::Timeout {
                    timeout_seconds: graceful_timeout.as_secs(),
                })
            }
        }
    }

    /// Wait for SIGINT/SIGTERM (or Ctrl+C off unix) and name the signal
    async fn wait_for_signal() -> std::io::Result<&'static str> {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};

            let mut sigterm = signal(SignalKind::terminate())?;
            let mut sigint = signal(SignalKind::interrupt())?;

            tokio::select! {
                _ = sigterm.recv() => Ok("SIGTERM"),
                _ = sigint.recv() => Ok("SIGINT"),
            }
        }

        #[cfg(not(unix))]
        {
            tokio::signal::ctrl_c().await?;
            Ok("CTRL+C")
        }
    }

    /// Handle shutdown signals and trigger coordinated cancellation
    ///
    /// # Arguments
    ///
    /// * `cancellation_token` - Token to cancel when shutdown signal is received
    async fn shutdown_signal_handler(cancellation_token: CancellationToken) {
        tokio::select! {
            signal = Self::wait_for_signal() => match signal {
                Ok(signal_name) => {
                    warn!("Shutdown signal {} received, cancelling all operations...", signal_name);
                    cancellation_token.cancel();
                }
                Err(e) => {
                    error!(error = %e, "Failed to install signal handlers, only programmatic shutdown is available");
                }
            },
            () = cancellation_token.cancelled() => {
                warn!("Cancellation token already cancelled, shutdown signal handler exiting");
            }
        }
    }

    /// Returns a clone of the cancellation token for coordinated shutdown
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// Initiates graceful shutdown by cancelling the server's cancellation token
    pub fn shutdown(&self) {
        info!("programmatic shutdown requested");
        self.cancellation_token.cancel();
    }

    /// Run server for testing, returns the bound address
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Bind` if unable to bind to the configured address.
    pub async fn run_for_testing(self) -> ServerResult<(SocketAddr, CancellationToken)> {
        let addr = self.config.socket_addr();

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                address: addr,
                source,
            })?;

        let actual_addr = listener
            .local_addr()
            .map_err(|source| ServerError::Startup { source })?;

        let token = self.cancellation_token.child_token();
        let task = token.child_token();
        tokio::spawn(async move {
            let _ = axum::serve(listener, self.router)
                .with_graceful_shutdown(async move { task.cancelled().await })
                .await;
        });

        Ok((actual_addr, token))
    }

    /// Get server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get server state for testing
    pub fn state(&self) -> &ServerState {
        &self.state
    }
}

/// Render a panicking handler as an internal error
fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else {
        "handler panicked".to_string()
    };

    ServerError::internal(message).into_response()
}

/// Map errors raised by the timeout layer onto server errors
fn handle_middleware_error(err: &BoxError, timeout_seconds: u64) -> ServerError {
    if err.is::<Elapsed>() {
        warn!(timeout_seconds, "Request timed out");
        ServerError::Timeout { timeout_seconds }
    } else {
        ServerError::internal(err)
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::StatusCode,
        routing::get,
    };
    use risk_predictor::ModelConfig;
    use tower::ServiceExt;

    use super::*;
    use crate::config::{Environment, TimeoutSeconds};

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn server_creation() -> ServerResult<()> {
        let config = ServerConfig::for_testing();
        let server = Server::new(config, ShutdownConfig::default()).await?;
        assert_eq!(server.config().environment, Environment::Testing);
        assert!(!server.cancellation_token().is_cancelled());
        assert!(!server.state().predictor().is_loaded());
        Ok(())
    }

    #[tokio::test]
    async fn missing_model_does_not_prevent_startup() -> ServerResult<()> {
        let mut config = ServerConfig::for_testing();
        config.model = ModelConfig::new("/nonexistent/credit_risk_pipeline.json");

        let server = Server::new(config, ShutdownConfig::default()).await?;
        assert!(!server.state().predictor().is_loaded());
        Ok(())
    }

    #[tokio::test]
    async fn injected_predictor_is_shared() -> ServerResult<()> {
        let predictor = Arc::new(Predictor::new(ModelConfig::unloaded()));
        let server = Server::with_predictor(
            ServerConfig::for_testing(),
            ShutdownConfig::default(),
            Arc::clone(&predictor),
        )?;

        assert!(Arc::ptr_eq(server.state().predictor(), &predictor));
        Ok(())
    }

    #[tokio::test]
    async fn programmatic_shutdown() -> ServerResult<()> {
        let config = ServerConfig::for_testing();
        let server = Server::new(config, ShutdownConfig::default()).await?;

        assert!(!server.cancellation_token().is_cancelled());

        server.shutdown();

        assert!(server.cancellation_token().is_cancelled());
        assert!(server.state().cancellation_token.is_cancelled());
        Ok(())
    }

    #[tokio::test]
    async fn explicit_cors_origins() -> ServerResult<()> {
        let mut config = ServerConfig::for_testing();
        config.cors_allowed_origins = vec!["http://localhost:5173".to_string()];
        Server::new(config, ShutdownConfig::default()).await?;
        Ok(())
    }

    #[tokio::test]
    async fn invalid_cors_origin_is_rejected() {
        let mut config = ServerConfig::for_testing();
        config.cors_allowed_origins = vec!["http://bad\norigin".to_string()];

        let result = Server::new(config, ShutdownConfig::default()).await;
        assert!(matches!(result, Err(ServerError::Config { .. })));
    }

    #[test]
    fn shutdown_config_default() {
        let config = ShutdownConfig::default();
        assert_eq!(
            config.graceful_timeout,
            Duration::from_secs(DEFAULT_GRACEFUL_SHUTDOWN_TIMEOUT_SECONDS)
        );
    }

    #[allow(clippy::panic)]
    async fn exploding_handler() -> &'static str {
        panic!("scoring exploded")
    }

    #[tokio::test]
    async fn handler_panic_becomes_internal_error() {
        let router: Router = Router::new().route("/panic", get(exploding_handler));
        let app = Server::with_middleware(router, &ServerConfig::for_testing()).unwrap();

        let response = app
            .oneshot(Request::builder().uri("/panic").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
        let body = json_body(response).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["error_code"], "INTERNAL_ERROR");
        assert!(
            body["details"]["error"]
                .as_str()
                .is_some_and(|error| error.contains("scoring exploded"))
        );
    }

    #[tokio::test]
    async fn slow_handler_times_out_with_json_envelope() {
        let mut config = ServerConfig::for_testing();
        config.timeout_seconds = TimeoutSeconds::new(1).unwrap();

        let router: Router = Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                "done"
            }),
        );
        let app = Server::with_middleware(router, &config).unwrap();

        let response = app
            .oneshot(Request::builder().uri("/slow").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        let body = json_body(response).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["error_code"], "INTERNAL_ERROR");
        assert_eq!(body["message"], "Request timed out");
    }
}
