// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Credit risk classification types

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Binary credit risk outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RiskClass {
    /// Applicant is not expected to default (class 0)
    Low,
    /// Applicant is expected to default (class 1)
    High,
}

impl RiskClass {
    /// Map a model class index to a risk class
    pub const fn from_class_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::Low),
            1 => Some(Self::High),
            _ => None,
        }
    }

    /// Returns the model class index
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Low => 0,
            Self::High => 1,
        }
    }

    /// Returns the label shown to API consumers
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Faible risque",
            Self::High => "Risque élevé",
        }
    }
}

/// Coarse bucketing of how far a risk probability is from certainty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum ConfidenceLevel {
    /// Probability at or beyond 0.8 / 0.2
    High,
    /// Probability at or beyond 0.6 / 0.4
    Medium,
    /// Probability strictly between 0.4 and 0.6
    Low,
}

impl ConfidenceLevel {
    /// Bucket a high-risk probability.
    ///
    /// The outer band is checked first; both bands use inclusive bounds.
    pub fn from_probability(probability: f64) -> Self {
        if probability >= 0.8 || probability <= 0.2 {
            Self::High
        } else if probability >= 0.6 || probability <= 0.4 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Returns the wire representation
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_boundaries() {
        assert_eq!(ConfidenceLevel::from_probability(0.8), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_probability(0.79), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_probability(0.59), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::from_probability(0.2), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_probability(0.21), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_probability(0.6), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_probability(0.4), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_probability(0.5), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::from_probability(0.0), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_probability(1.0), ConfidenceLevel::High);
    }

    #[test]
    fn risk_class_mapping() {
        assert_eq!(RiskClass::from_class_index(0), Some(RiskClass::Low));
        assert_eq!(RiskClass::from_class_index(1), Some(RiskClass::High));
        assert_eq!(RiskClass::from_class_index(2), None);
        assert_eq!(RiskClass::High.as_u8(), 1);
        assert_eq!(RiskClass::Low.label(), "Faible risque");
        assert_eq!(RiskClass::High.label(), "Risque élevé");
    }

    #[test]
    fn confidence_serializes_as_variant_name() {
        let json = serde_json::to_string(&ConfidenceLevel::Medium).unwrap();
        assert_eq!(json, "\"Medium\"");
    }
}
