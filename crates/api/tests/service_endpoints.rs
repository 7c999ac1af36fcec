// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for health, metadata and documentation endpoints

mod fixtures;

use std::io::Write;

use api::ServerConfig;
use axum::http::StatusCode;
use fixtures::{spawn_loaded_server, spawn_server, spawn_unloaded_server};
use serde_json::Value;

async fn get_json(url: String) -> (StatusCode, Value) {
    let response = reqwest::get(url).await.expect("Failed to send request");
    let status = response.status();
    let body = response.json().await.expect("Failed to parse response");
    (status, body)
}

#[tokio::test]
async fn health_reports_loaded_model() {
    let (addr, _) = spawn_loaded_server().await;

    let (status, body) = get_json(format!("http://{addr}/api/v1/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["pipeline_loaded"], true);
    assert_eq!(body["version"], "1.0.0");
    assert_eq!(body["api_status"], "running");
}

#[tokio::test]
async fn health_is_unavailable_without_model() {
    let (addr, _) = spawn_unloaded_server().await;

    let (status, body) = get_json(format!("http://{addr}/api/v1/health")).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["pipeline_loaded"], false);
}

#[tokio::test]
async fn corrupt_descriptor_leaves_server_unhealthy() {
    let mut file = tempfile::Builder::new()
        .suffix(".json")
        .tempfile()
        .expect("Failed to create descriptor file");
    file.write_all(br#"{"format_version": 1, "feature_names": []"#)
        .expect("Failed to write descriptor");

    let (addr, _) = spawn_server(ServerConfig::for_testing().with_model_path(file.path())).await;

    let (status, body) = get_json(format!("http://{addr}/api/v1/health")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["pipeline_loaded"], false);
}

#[tokio::test]
async fn model_info_describes_loaded_model() {
    let (addr, _) = spawn_loaded_server().await;

    let (status, body) = get_json(format!("http://{addr}/api/v1/model/info")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model_name"], "RandomForestClassifier");
    assert_eq!(body["model_version"], "1.0");
    assert_eq!(body["features_count"], 13);
    assert_eq!(body["features"][0], "person_age");
    assert_eq!(body["status"], "loaded");
}

#[tokio::test]
async fn model_info_without_model() {
    let (addr, _) = spawn_unloaded_server().await;

    let (status, body) = get_json(format!("http://{addr}/api/v1/model/info")).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "error");
    assert!(body["message"].as_str().is_some());
    assert!(body.get("error_code").is_none());
}

#[tokio::test]
async fn features_are_listed_without_model() {
    let (addr, _) = spawn_unloaded_server().await;

    let (status, body) = get_json(format!("http://{addr}/api/v1/features")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 13);
    assert_eq!(body["features"].as_array().map(Vec::len), Some(13));
    assert_eq!(body["description"]["credit_score"], "Credit score (300-850)");
}

#[tokio::test]
async fn example_is_served() {
    let (addr, _) = spawn_unloaded_server().await;

    let (status, body) = get_json(format!("http://{addr}/api/v1/example")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["endpoint"], "/api/v1/predict");
    assert_eq!(body["method"], "POST");
    assert_eq!(body["body"]["person_age"], 30);
    assert_eq!(body["expected_response"]["prediction"]["risk_class"], 0);
    assert_eq!(
        body["expected_response"]["prediction"]["risk_label"],
        "Faible risque"
    );
}

#[tokio::test]
async fn index_lists_endpoints() {
    let (addr, _) = spawn_unloaded_server().await;

    let (status, body) = get_json(format!("http://{addr}/")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["version"], "1.0.0");
    assert_eq!(body["endpoints"]["predict"], "/api/v1/predict");
    assert_eq!(body["endpoints"]["model_info"], "/api/v1/model/info");
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let (addr, _) = spawn_unloaded_server().await;

    let (status, body) = get_json(format!("http://{addr}/api/v2/predict")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "error");
    assert_eq!(body["error_code"], "NOT_FOUND");
    assert!(
        body["available_endpoints"]
            .as_array()
            .is_some_and(|endpoints| endpoints.iter().any(|e| e == "/api/v1/predict"))
    );
}

#[tokio::test]
async fn request_id_is_propagated() {
    let (addr, _) = spawn_unloaded_server().await;

    let response = reqwest::get(format!("http://{addr}/api/v1/features"))
        .await
        .expect("Failed to send request");

    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn metrics_are_exported() {
    let (addr, _) = spawn_loaded_server().await;

    // Generate at least one recorded request
    let _ = get_json(format!("http://{addr}/api/v1/health")).await;

    let response = reqwest::get(format!("http://{addr}/metrics"))
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);

    let text = response.text().await.expect("Failed to read metrics");
    assert!(text.contains("credit_risk_http_requests_total"));
    assert!(text.contains("credit_risk_model_loaded"));
}

#[tokio::test]
async fn openapi_document_is_served() {
    let (addr, _) = spawn_unloaded_server().await;

    let (status, body) = get_json(format!("http://{addr}/api-doc/openapi.json")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/v1/predict"].is_object());
}
