// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Credit applicant feature schema
//!
//! This module provides the fixed set of input features recognized by the
//! credit risk model, their canonical ordering, and the accepted values of
//! the categorical features.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use utoipa::ToSchema;

/// Number of features in a credit applicant record
pub const FEATURE_COUNT: usize = 13;

/// Accepted values for `person_gender`
pub const GENDERS: &[&str] = &["Male", "Female"];

/// Accepted values for `person_education`
pub const EDUCATION_LEVELS: &[&str] = &["High School", "Bachelor", "Master", "Doctorate"];

/// Accepted values for `person_home_ownership`
pub const HOME_OWNERSHIP: &[&str] = &["RENT", "OWN", "MORTGAGE", "OTHER"];

/// Accepted values for `loan_intent`
pub const LOAN_INTENTS: &[&str] = &[
    "PERSONAL",
    "EDUCATION",
    "MEDICAL",
    "VENTURE",
    "HOMEIMPROVEMENT",
    "DEBTCONSOLIDATION",
];

/// Accepted values for `previous_loan_defaults_on_file`
pub const PREVIOUS_DEFAULTS: &[&str] = &["No", "Yes"];

/// Value kind of a feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    /// Numeric feature, scaled by the model preprocessor
    Numeric,
    /// String feature, one-hot encoded by the model preprocessor
    Categorical,
}

/// Recognized credit applicant features, in canonical order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FeatureName {
    /// Applicant age in years
    PersonAge,
    /// Annual income
    PersonIncome,
    /// Years of employment experience
    PersonEmpExp,
    /// Requested loan amount
    LoanAmnt,
    /// Loan interest rate in percent
    LoanIntRate,
    /// Loan amount as a fraction of income
    LoanPercentIncome,
    /// Length of the credit history in years
    CbPersonCredHistLength,
    /// Credit score
    CreditScore,
    /// Applicant gender
    PersonGender,
    /// Highest education level
    PersonEducation,
    /// Home ownership status
    PersonHomeOwnership,
    /// Purpose of the loan
    LoanIntent,
    /// Whether a previous default is on file
    PreviousLoanDefaultsOnFile,
}

impl FeatureName {
    /// Returns every feature in canonical order
    pub const fn all() -> &'static [Self; FEATURE_COUNT] {
        &[
            Self::PersonAge,
            Self::PersonIncome,
            Self::PersonEmpExp,
            Self::LoanAmnt,
            Self::LoanIntRate,
            Self::LoanPercentIncome,
            Self::CbPersonCredHistLength,
            Self::CreditScore,
            Self::PersonGender,
            Self::PersonEducation,
            Self::PersonHomeOwnership,
            Self::LoanIntent,
            Self::PreviousLoanDefaultsOnFile,
        ]
    }

    /// Returns the wire name of the feature
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PersonAge => "person_age",
            Self::PersonIncome => "person_income",
            Self::PersonEmpExp => "person_emp_exp",
            Self::LoanAmnt => "loan_amnt",
            Self::LoanIntRate => "loan_int_rate",
            Self::LoanPercentIncome => "loan_percent_income",
            Self::CbPersonCredHistLength => "cb_person_cred_hist_length",
            Self::CreditScore => "credit_score",
            Self::PersonGender => "person_gender",
            Self::PersonEducation => "person_education",
            Self::PersonHomeOwnership => "person_home_ownership",
            Self::LoanIntent => "loan_intent",
            Self::PreviousLoanDefaultsOnFile => "previous_loan_defaults_on_file",
        }
    }

    /// Returns whether the feature is numeric or categorical
    pub const fn kind(self) -> FeatureKind {
        match self {
            Self::PersonAge
            | Self::PersonIncome
            | Self::PersonEmpExp
            | Self::LoanAmnt
            | Self::LoanIntRate
            | Self::LoanPercentIncome
            | Self::CbPersonCredHistLength
            | Self::CreditScore => FeatureKind::Numeric,
            Self::PersonGender
            | Self::PersonEducation
            | Self::PersonHomeOwnership
            | Self::LoanIntent
            | Self::PreviousLoanDefaultsOnFile => FeatureKind::Categorical,
        }
    }

    /// Returns the accepted values of a categorical feature
    pub const fn accepted_values(self) -> Option<&'static [&'static str]> {
        match self {
            Self::PersonGender => Some(GENDERS),
            Self::PersonEducation => Some(EDUCATION_LEVELS),
            Self::PersonHomeOwnership => Some(HOME_OWNERSHIP),
            Self::LoanIntent => Some(LOAN_INTENTS),
            Self::PreviousLoanDefaultsOnFile => Some(PREVIOUS_DEFAULTS),
            _ => None,
        }
    }

    /// Returns a short human-readable description of the feature
    pub const fn description(self) -> &'static str {
        match self {
            Self::PersonAge => "Age (18-100)",
            Self::PersonIncome => "Annual income",
            Self::PersonEmpExp => "Years of employment experience",
            Self::LoanAmnt => "Loan amount",
            Self::LoanIntRate => "Interest rate (%)",
            Self::LoanPercentIncome => "Loan amount as a share of income",
            Self::CbPersonCredHistLength => "Credit history length (years)",
            Self::CreditScore => "Credit score (300-850)",
            Self::PersonGender => "Gender",
            Self::PersonEducation => "Education level",
            Self::PersonHomeOwnership => "Home ownership status",
            Self::LoanIntent => "Loan purpose",
            Self::PreviousLoanDefaultsOnFile => "Previous loan defaults on file",
        }
    }

    /// Returns the canonical position of the feature
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for FeatureName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureName {
    type Err = FeatureNameParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|feature| feature.as_str() == s)
            .ok_or_else(|| FeatureNameParseError::Unknown(s.to_string()))
    }
}

impl Serialize for FeatureName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FeatureName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Self::from_str(&name).map_err(serde::de::Error::custom)
    }
}

/// Error type for feature name parsing
#[derive(Debug, thiserror::Error)]
pub enum FeatureNameParseError {
    /// Name does not match any recognized feature
    #[error("unknown feature name: {0}")]
    Unknown(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_order_matches_index() {
        for (position, feature) in FeatureName::all().iter().enumerate() {
            assert_eq!(feature.index(), position);
        }
        assert_eq!(FeatureName::all()[0].as_str(), "person_age");
        assert_eq!(
            FeatureName::all()[FEATURE_COUNT - 1].as_str(),
            "previous_loan_defaults_on_file"
        );
    }

    #[test]
    fn numeric_features_come_first() {
        let kinds: Vec<_> = FeatureName::all().iter().map(|f| f.kind()).collect();
        assert!(kinds[..8].iter().all(|k| *k == FeatureKind::Numeric));
        assert!(kinds[8..].iter().all(|k| *k == FeatureKind::Categorical));
    }

    #[test]
    fn accepted_values_only_for_categorical() {
        for feature in FeatureName::all() {
            match feature.kind() {
                FeatureKind::Numeric => assert!(feature.accepted_values().is_none()),
                FeatureKind::Categorical => assert!(feature.accepted_values().is_some()),
            }
        }
        assert_eq!(
            FeatureName::PreviousLoanDefaultsOnFile.accepted_values(),
            Some(&["No", "Yes"][..])
        );
    }

    #[test]
    fn parse_and_display() {
        let feature: FeatureName = "loan_int_rate".parse().unwrap();
        assert_eq!(feature, FeatureName::LoanIntRate);
        assert_eq!(feature.to_string(), "loan_int_rate");
        assert!("loan_rate".parse::<FeatureName>().is_err());
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&FeatureName::CbPersonCredHistLength).unwrap();
        assert_eq!(json, "\"cb_person_cred_hist_length\"");

        let parsed: FeatureName = serde_json::from_str("\"credit_score\"").unwrap();
        assert_eq!(parsed, FeatureName::CreditScore);
        assert!(serde_json::from_str::<FeatureName>("\"nope\"").is_err());
    }
}
