// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Server state management module
//!
//! This module provides shared application state for the credit risk server,
//! including configuration, the shared predictor, and coordinated cancellation.

use std::sync::Arc;

use risk_predictor::Predictor;
use tokio_util::sync::CancellationToken;

use crate::config::ServerConfig;

/// Shared application state with cancellation token support
#[derive(Debug, Clone)]
pub struct ServerState {
    /// Server configuration
    config: ServerConfig,
    /// Predictor shared by every request handler
    predictor: Arc<Predictor>,
    /// Cancellation token for coordinated shutdown
    pub cancellation_token: CancellationToken,
}

impl ServerState {
    /// Create new server state
    ///
    /// # Arguments
    ///
    /// * `config` - Server configuration
    /// * `predictor` - Predictor serving all requests
    /// * `cancellation_token` - Token for coordinated cancellation
    pub fn new(
        config: ServerConfig,
        predictor: Arc<Predictor>,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            config,
            predictor,
            cancellation_token,
        }
    }

    /// Server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Shared predictor
    pub fn predictor(&self) -> &Arc<Predictor> {
        &self.predictor
    }
}
