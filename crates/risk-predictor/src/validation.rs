// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Schema validation of credit applicant payloads
//!
//! Validation never stops at the first problem: every rule is evaluated and
//! all failures are collected into a single [`ValidationReport`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use shared_types::{FeatureKind, FeatureName};

use crate::types::FeatureRecord;

/// Key under which absent fields are reported
pub const MISSING_FIELDS_KEY: &str = "missing_fields";

/// Range rule applied to a numeric feature
struct NumericRule {
    feature: FeatureName,
    accepts: fn(f64) -> bool,
    message: &'static str,
}

const NUMERIC_RULES: &[NumericRule] = &[
    NumericRule {
        feature: FeatureName::PersonAge,
        accepts: |v| (18.0..=100.0).contains(&v),
        message: "Age must be between 18 and 100",
    },
    NumericRule {
        feature: FeatureName::PersonIncome,
        accepts: |v| v > 0.0,
        message: "Income must be positive",
    },
    NumericRule {
        feature: FeatureName::CreditScore,
        accepts: |v| (300.0..=850.0).contains(&v),
        message: "Credit score must be between 300 and 850",
    },
    NumericRule {
        feature: FeatureName::LoanAmnt,
        accepts: |v| v > 0.0,
        message: "Loan amount must be positive",
    },
    NumericRule {
        feature: FeatureName::LoanIntRate,
        accepts: |v| (0.0..=50.0).contains(&v),
        message: "Interest rate must be between 0 and 50%",
    },
];

/// A single validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValidationIssue {
    /// Recognized fields absent from the payload, in canonical order
    MissingFields(Vec<FeatureName>),
    /// Field present but out of range or not an accepted value
    Invalid(String),
}

/// Collected validation failures for one payload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    errors: BTreeMap<String, ValidationIssue>,
}

impl ValidationReport {
    /// Check if the payload passed every rule
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of failing entries
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Check if nothing failed
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Failure recorded for a field
    pub fn get(&self, feature: FeatureName) -> Option<&ValidationIssue> {
        self.errors.get(feature.as_str())
    }

    /// Fields reported as absent
    pub fn missing_fields(&self) -> &[FeatureName] {
        match self.errors.get(MISSING_FIELDS_KEY) {
            Some(ValidationIssue::MissingFields(fields)) => fields,
            _ => &[],
        }
    }

    /// Borrow all failures
    pub fn errors(&self) -> &BTreeMap<String, ValidationIssue> {
        &self.errors
    }

    /// Consume the report into its failures
    pub fn into_errors(self) -> BTreeMap<String, ValidationIssue> {
        self.errors
    }

    fn reject(&mut self, feature: FeatureName, message: impl Into<String>) {
        self.errors.insert(
            feature.as_str().to_string(),
            ValidationIssue::Invalid(message.into()),
        );
    }
}

/// Validate a payload against the feature schema
pub fn validate(record: &FeatureRecord) -> ValidationReport {
    let mut report = ValidationReport::default();

    let missing: Vec<FeatureName> = FeatureName::all()
        .iter()
        .copied()
        .filter(|&feature| !record.contains(feature))
        .collect();
    if !missing.is_empty() {
        report.errors.insert(
            MISSING_FIELDS_KEY.to_string(),
            ValidationIssue::MissingFields(missing),
        );
    }

    for rule in NUMERIC_RULES {
        let Some(value) = record.get(rule.feature) else {
            continue;
        };
        // Booleans and strings never satisfy a numeric rule
        let accepted = value.as_f64().is_some_and(rule.accepts);
        if !accepted {
            report.reject(rule.feature, rule.message);
        }
    }

    for &feature in FeatureName::all() {
        if feature.kind() != FeatureKind::Categorical {
            continue;
        }
        let (Some(value), Some(accepted)) = (record.get(feature), feature.accepted_values()) else {
            continue;
        };
        let is_member = value.as_str().is_some_and(|s| accepted.contains(&s));
        if !is_member {
            report.reject(
                feature,
                format!("Invalid value. Accepted values: {}", accepted.join(", ")),
            );
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    fn valid_payload() -> Value {
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

    fn record_with(field: &str, value: Value) -> FeatureRecord {
        let mut payload = valid_payload();
        payload[field] = value;
        FeatureRecord::try_from(payload).unwrap()
    }

    #[test]
    fn valid_payload_passes() {
        let report = validate(&FeatureRecord::try_from(valid_payload()).unwrap());
        assert!(report.is_valid());
        assert!(report.missing_fields().is_empty());
    }

    #[test]
    fn extra_keys_are_ignored() {
        let report = validate(&record_with("application_channel", json!("web")));
        assert!(report.is_valid());
    }

    #[test]
    fn missing_fields_are_listed_in_canonical_order() {
        let mut payload = valid_payload();
        let fields = payload.as_object_mut().unwrap();
        fields.remove("loan_intent");
        fields.remove("person_age");
        fields.remove("credit_score");

        let report = validate(&FeatureRecord::try_from(payload).unwrap());
        assert!(!report.is_valid());
        assert_eq!(
            report.missing_fields(),
            &[
                FeatureName::PersonAge,
                FeatureName::CreditScore,
                FeatureName::LoanIntent
            ]
        );
        // absent fields are not range checked
        assert!(report.get(FeatureName::PersonAge).is_none());
        assert_eq!(report.len(), 1);
    }

    #[test]
    fn empty_payload_lists_every_field() {
        let report = validate(&FeatureRecord::default());
        assert_eq!(report.missing_fields(), FeatureName::all());
    }

    #[test]
    fn age_boundaries() {
        assert!(!validate(&record_with("person_age", json!(17))).is_valid());
        assert!(validate(&record_with("person_age", json!(18))).is_valid());
        assert!(validate(&record_with("person_age", json!(100))).is_valid());
        assert!(!validate(&record_with("person_age", json!(100.5))).is_valid());

        let report = validate(&record_with("person_age", json!(17)));
        assert_eq!(
            report.get(FeatureName::PersonAge),
            Some(&ValidationIssue::Invalid(
                "Age must be between 18 and 100".to_string()
            ))
        );
    }

    #[test]
    fn credit_score_boundaries() {
        assert!(!validate(&record_with("credit_score", json!(299))).is_valid());
        assert!(validate(&record_with("credit_score", json!(300))).is_valid());
        assert!(validate(&record_with("credit_score", json!(850))).is_valid());
        assert!(!validate(&record_with("credit_score", json!(851))).is_valid());
    }

    #[test]
    fn positive_amounts() {
        assert!(!validate(&record_with("person_income", json!(0))).is_valid());
        assert!(!validate(&record_with("loan_amnt", json!(-1))).is_valid());
        assert!(validate(&record_with("loan_amnt", json!(0.01))).is_valid());
    }

    #[test]
    fn interest_rate_bounds_are_inclusive() {
        assert!(validate(&record_with("loan_int_rate", json!(0))).is_valid());
        assert!(validate(&record_with("loan_int_rate", json!(50))).is_valid());
        assert!(!validate(&record_with("loan_int_rate", json!(50.01))).is_valid());
    }

    #[test]
    fn non_numeric_values_fail_numeric_rules() {
        assert!(!validate(&record_with("person_age", json!("30"))).is_valid());
        assert!(!validate(&record_with("person_income", json!(true))).is_valid());
        assert!(!validate(&record_with("credit_score", Value::Null)).is_valid());
    }

    #[test]
    fn unknown_category_lists_accepted_values() {
        let report = validate(&record_with("previous_loan_defaults_on_file", json!("Maybe")));
        assert_eq!(
            report.get(FeatureName::PreviousLoanDefaultsOnFile),
            Some(&ValidationIssue::Invalid(
                "Invalid value. Accepted values: No, Yes".to_string()
            ))
        );
    }

    #[test]
    fn categories_are_case_sensitive() {
        assert!(!validate(&record_with("person_home_ownership", json!("rent"))).is_valid());
        assert!(!validate(&record_with("person_gender", json!(1))).is_valid());
    }

    #[test]
    fn all_failures_are_collected() {
        let mut payload = valid_payload();
        payload["person_age"] = json!(12);
        payload["loan_intent"] = json!("VACATION");
        payload.as_object_mut().unwrap().remove("person_income");

        let report = validate(&FeatureRecord::try_from(payload).unwrap());
        assert_eq!(report.len(), 3);
        assert!(report.get(FeatureName::PersonAge).is_some());
        assert!(report.get(FeatureName::LoanIntent).is_some());
        assert_eq!(report.missing_fields(), &[FeatureName::PersonIncome]);
    }

    #[test]
    fn report_serializes_missing_fields_as_list() {
        let mut payload = valid_payload();
        payload.as_object_mut().unwrap().remove("loan_amnt");
        payload["person_gender"] = json!("Other");

        let errors = validate(&FeatureRecord::try_from(payload).unwrap()).into_errors();
        let value = serde_json::to_value(&errors).unwrap();
        assert_eq!(value["missing_fields"], json!(["loan_amnt"]));
        assert_eq!(
            value["person_gender"],
            json!("Invalid value. Accepted values: Male, Female")
        );
    }
}
