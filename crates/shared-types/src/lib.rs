// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Shared types for the credit risk service
//!
//! This crate provides the feature schema and risk classification types that
//! are shared between the predictor and the HTTP API, avoiding circular
//! dependencies.

pub mod features;
pub mod risk;

pub use features::{FEATURE_COUNT, FeatureKind, FeatureName, FeatureNameParseError};
pub use risk::{ConfidenceLevel, RiskClass};
