// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Test fixtures for the HTTP integration tests
//!
//! The descriptor in `minimal_forest.json` is a two-tree forest with known
//! outputs: the example applicant scores 0.25 (class 0, Medium confidence) and
//! the risky applicant scores 0.85 (class 1, High confidence).

#![allow(dead_code)]

use std::{net::SocketAddr, path::PathBuf};

use api::{Server, ServerConfig, ShutdownConfig};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

/// Path of the fixture descriptor
pub fn fixture_model_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/minimal_forest.json")
}

/// Start a server with the fixture model loaded
pub async fn spawn_loaded_server() -> (SocketAddr, CancellationToken) {
    spawn_server(ServerConfig::for_testing().with_model_path(fixture_model_path())).await
}

/// Start a server with no model
pub async fn spawn_unloaded_server() -> (SocketAddr, CancellationToken) {
    spawn_server(ServerConfig::for_testing()).await
}

/// Start a server with an arbitrary configuration
pub async fn spawn_server(config: ServerConfig) -> (SocketAddr, CancellationToken) {
    Server::new(config, ShutdownConfig::default())
        .await
        .expect("Failed to create server")
        .run_for_testing()
        .await
        .expect("Failed to start test server")
}

/// The documented example applicant
pub fn example_applicant() -> Value {
    json!({
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
    })
}

/// A low-income applicant with previous defaults on file
pub fn risky_applicant() -> Value {
    let mut applicant = example_applicant();
    applicant["person_income"] = json!(12000);
    applicant["previous_loan_defaults_on_file"] = json!("Yes");
    applicant
}
