// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Middleware module for HTTP request processing
//!
//! Records per-route request counts and latencies.

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::metrics::observe_http_request;

/// Route label used for requests that matched no route
const UNMATCHED_ROUTE: &str = "unmatched";

/// Request metrics middleware function
///
/// The route label is the matched route template, which keeps the label set
/// bounded regardless of the paths clients send.
pub async fn http_metrics_middleware(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| UNMATCHED_ROUTE.to_string(), |path| path.as_str().to_string());

    let start = Instant::now();
    let response = next.run(req).await;
    let elapsed = start.elapsed();

    debug!(
        %method,
        route,
        status = response.status().as_u16(),
        elapsed_ms = elapsed.as_millis(),
        "request completed"
    );
    observe_http_request(
        method.as_str(),
        &route,
        response.status(),
        elapsed.as_secs_f64(),
    );

    response
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::StatusCode,
        middleware::from_fn,
        routing::get,
    };
    use tower::ServiceExt;

    use super::*;
    use crate::metrics::HTTP_REQUESTS;

    #[tokio::test]
    async fn counts_matched_and_unmatched_routes() {
        let app = Router::new()
            .route("/applicants/{id}", get(|| async { "ok" }))
            .layer(from_fn(http_metrics_middleware));

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/applicants/7").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(Request::builder().uri("/missing").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        assert!(
            HTTP_REQUESTS
                .with_label_values(&["GET", "/applicants/{id}", "200"])
                .get()
                >= 1
        );
        assert!(
            HTTP_REQUESTS
                .with_label_values(&["GET", UNMATCHED_ROUTE, "404"])
                .get()
                >= 1
        );
    }
}
