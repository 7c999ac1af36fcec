// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Rule-based explanation of a risk score
//!
//! The explanation does not inspect the model. It combines a band derived
//! from the default probability with a fixed set of applicant rules that
//! credit officers commonly associate with default.

use serde::{Deserialize, Serialize};
use shared_types::FeatureName;
use utoipa::ToSchema;

use crate::types::FeatureRecord;

/// Coarse band of a default probability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RiskBand {
    /// Probability of at least 0.7
    VeryHigh,
    /// Probability of at least 0.5
    High,
    /// Probability of at least 0.3
    Moderate,
    /// Probability below 0.3
    Low,
}

impl RiskBand {
    /// Band a default probability
    pub fn from_probability(probability: f64) -> Self {
        if probability >= 0.7 {
            Self::VeryHigh
        } else if probability >= 0.5 {
            Self::High
        } else if probability >= 0.3 {
            Self::Moderate
        } else {
            Self::Low
        }
    }

    /// Sentence describing the band
    pub const fn summary(self) -> &'static str {
        match self {
            Self::VeryHigh => "The risk is very high.",
            Self::High => "The risk is high.",
            Self::Moderate => "The risk is moderate.",
            Self::Low => "The risk is low.",
        }
    }

    /// Follow-up actions for accounts in this band
    pub const fn recommended_actions(self) -> &'static [&'static str] {
        match self {
            Self::VeryHigh => &[
                "Start an accelerated collection procedure immediately.",
                "Contact the client to understand the situation and negotiate a payment plan.",
            ],
            Self::High => &[
                "Place the client under close monitoring.",
                "Send a preventive payment reminder.",
            ],
            Self::Moderate => &[
                "Monitor the client's payment behavior.",
                "Offer flexible payment options if needed.",
            ],
            Self::Low => &["Maintain a normal client relationship."],
        }
    }
}

/// Human-readable account of a risk score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RiskExplanation {
    /// Band of the probability
    pub risk_band: RiskBand,
    /// Band summary followed by one sentence per triggered rule
    pub explanations: Vec<String>,
    /// Follow-up actions for the band
    pub recommended_actions: Vec<String>,
}

/// Explain a default probability for an applicant
///
/// Rules whose field is absent or not of the expected type are skipped.
pub fn explain(record: &FeatureRecord, probability: f64) -> RiskExplanation {
    let risk_band = RiskBand::from_probability(probability);
    let number = |feature: FeatureName| record.get(feature).and_then(serde_json::Value::as_f64);

    let mut explanations = vec![risk_band.summary().to_string()];

    if let Some(income) = number(FeatureName::PersonIncome)
        && income < 30_000.0
    {
        explanations.push(format!(
            "An annual income of {income} is relatively low, which can increase the risk."
        ));
    }
    if let Some(ratio) = number(FeatureName::LoanPercentIncome)
        && ratio > 0.4
    {
        explanations.push(format!(
            "The loan amounts to {:.1}% of income, indicating a heavy financial burden.",
            ratio * 100.0
        ));
    }
    if let Some(years) = number(FeatureName::CbPersonCredHistLength)
        && years < 3.0
    {
        explanations.push(format!(
            "The short credit history ({years} years) makes the assessment less certain."
        ));
    }
    if let Some(score) = number(FeatureName::CreditScore)
        && score < 600.0
    {
        explanations.push(format!(
            "A credit score of {score} is low, which is a key risk indicator."
        ));
    }
    if record
        .get(FeatureName::PreviousLoanDefaultsOnFile)
        .and_then(serde_json::Value::as_str)
        == Some("Yes")
    {
        explanations.push(
            "Previous payment defaults are on file, which is a major risk factor.".to_string(),
        );
    }
    if let Some(years) = number(FeatureName::PersonEmpExp)
        && years < 1.0
    {
        explanations.push(format!(
            "Employment experience ({years} years) is very limited, which can affect financial stability."
        ));
    }

    RiskExplanation {
        risk_band,
        explanations,
        recommended_actions: risk_band
            .recommended_actions()
            .iter()
            .map(ToString::to_string)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn band_boundaries() {
        assert_eq!(RiskBand::from_probability(0.7), RiskBand::VeryHigh);
        assert_eq!(RiskBand::from_probability(0.69), RiskBand::High);
        assert_eq!(RiskBand::from_probability(0.5), RiskBand::High);
        assert_eq!(RiskBand::from_probability(0.3), RiskBand::Moderate);
        assert_eq!(RiskBand::from_probability(0.29), RiskBand::Low);
    }

    #[test]
    fn comfortable_applicant_has_only_band_summary() {
        let record = FeatureRecord::try_from(json!({
            "person_income": 50000,
            "loan_percent_income": 0.3,
            "cb_person_cred_hist_length": 7,
            "credit_score": 680,
            "previous_loan_defaults_on_file": "No",
            "person_emp_exp": 5
        }))
        .unwrap();

        let explanation = explain(&record, 0.12);
        assert_eq!(explanation.risk_band, RiskBand::Low);
        assert_eq!(explanation.explanations, vec!["The risk is low.".to_string()]);
        assert_eq!(explanation.recommended_actions.len(), 1);
    }

    #[test]
    fn every_rule_can_fire() {
        let record = FeatureRecord::try_from(json!({
            "person_income": 18000,
            "loan_percent_income": 0.55,
            "cb_person_cred_hist_length": 2,
            "credit_score": 540,
            "previous_loan_defaults_on_file": "Yes",
            "person_emp_exp": 0
        }))
        .unwrap();

        let explanation = explain(&record, 0.91);
        assert_eq!(explanation.risk_band, RiskBand::VeryHigh);
        assert_eq!(explanation.explanations.len(), 7);
        assert!(explanation.explanations[2].contains("55.0%"));
        assert_eq!(explanation.recommended_actions.len(), 2);
    }

    #[test]
    fn rules_are_strict_inequalities() {
        let record = FeatureRecord::try_from(json!({
            "person_income": 30000,
            "loan_percent_income": 0.4,
            "cb_person_cred_hist_length": 3,
            "credit_score": 600,
            "person_emp_exp": 1
        }))
        .unwrap();

        assert_eq!(explain(&record, 0.4).explanations.len(), 1);
    }
}
