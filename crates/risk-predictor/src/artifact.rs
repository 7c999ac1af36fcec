// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Model descriptor loading and embedded preprocessing
//!
//! A model descriptor is a JSON document that carries everything needed to
//! score an applicant: explicit metadata, the fitted preprocessing steps
//! (standard scaling of numeric columns and one-hot encoding of categorical
//! ones) and the exported classifier parameters.

use std::{collections::BTreeSet, path::Path};

use serde::{Deserialize, Serialize};
use shared_types::{FEATURE_COUNT, FeatureKind, FeatureName};
use tokio::fs;
use tracing::{debug, info};

use crate::{
    classifier::ClassifierSpec,
    error::{PredictorError, PredictorResult},
    types::{FeatureRow, ModelVersion},
};

/// Descriptor layout understood by this crate
pub const FORMAT_VERSION: u32 = 1;

/// Serialized transform-and-classify pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Descriptor layout version
    pub format_version: u32,
    /// Display name; the classifier name is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    /// Version of the fitted model
    #[serde(default)]
    pub model_version: ModelVersion,
    /// Input features the model was fitted on
    pub feature_names: Vec<FeatureName>,
    /// Fitted preprocessing steps
    pub preprocessor: Preprocessor,
    /// Fitted classifier
    pub classifier: ClassifierSpec,
}

impl ModelDescriptor {
    /// Load and validate a descriptor from a JSON file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> PredictorResult<Self> {
        let path = path.as_ref();
        debug!("Loading model descriptor from: {}", path.display());

        let content = fs::read_to_string(path).await.map_err(|e| {
            PredictorError::io(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let descriptor = Self::from_json(&content).map_err(|e| match e {
            PredictorError::Json { message } => {
                PredictorError::json(format!("Failed to parse {}: {}", path.display(), message))
            }
            other => other,
        })?;

        info!(
            model_name = %descriptor.display_name(),
            model_version = %descriptor.model_version,
            input_width = descriptor.preprocessor.output_width(),
            "Loaded model descriptor from {}",
            path.display()
        );

        Ok(descriptor)
    }

    /// Parse and validate a descriptor from a JSON string
    pub fn from_json(content: &str) -> PredictorResult<Self> {
        let descriptor: Self = serde_json::from_str(content)?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Check structural invariants
    pub fn validate(&self) -> PredictorResult<()> {
        if self.format_version != FORMAT_VERSION {
            return Err(PredictorError::invalid_artifact(format!(
                "unsupported format_version {}, expected {FORMAT_VERSION}",
                self.format_version
            )));
        }

        if let Some(name) = &self.model_name
            && name.trim().is_empty()
        {
            return Err(PredictorError::invalid_artifact("model_name cannot be blank"));
        }

        ensure_canonical_set("feature_names", &self.feature_names)?;
        self.preprocessor.validate()?;
        self.classifier.validate(self.preprocessor.output_width())
    }

    /// Name reported to API clients
    pub fn display_name(&self) -> String {
        self.model_name
            .clone()
            .unwrap_or_else(|| self.classifier.name().to_string())
    }
}

/// Fitted column transformer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preprocessor {
    /// Standard scaler over numeric columns
    pub numeric: StandardScaler,
    /// One-hot encoder over categorical columns
    pub categorical: OneHotEncoder,
}

impl Preprocessor {
    /// Check both steps and that together they cover every feature once
    pub fn validate(&self) -> PredictorResult<()> {
        self.numeric.validate()?;
        self.categorical.validate()?;

        let covered: Vec<FeatureName> = self
            .numeric
            .features
            .iter()
            .chain(&self.categorical.features)
            .copied()
            .collect();
        ensure_canonical_set("preprocessor features", &covered)
    }

    /// Width of the transformed vector
    pub fn output_width(&self) -> usize {
        self.numeric.features.len() + self.categorical.output_width()
    }

    /// Scale numeric columns, then append the one-hot blocks
    pub fn transform(&self, row: &FeatureRow) -> PredictorResult<Vec<f64>> {
        let mut output = Vec::with_capacity(self.output_width());
        self.numeric.transform_into(row, &mut output)?;
        self.categorical.transform_into(row, &mut output)?;
        Ok(output)
    }
}

/// Fitted `(x - mean) / scale` transform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    /// Columns in transform order
    pub features: Vec<FeatureName>,
    /// Fitted mean per column
    pub mean: Vec<f64>,
    /// Fitted scale per column; zero means the column is only centered
    pub scale: Vec<f64>,
}

impl StandardScaler {
    fn validate(&self) -> PredictorResult<()> {
        let n = self.features.len();
        if self.mean.len() != n || self.scale.len() != n {
            return Err(PredictorError::invalid_artifact(format!(
                "standard scaler has {n} features, {} means and {} scales",
                self.mean.len(),
                self.scale.len()
            )));
        }
        if let Some(feature) = self
            .features
            .iter()
            .find(|f| f.kind() != FeatureKind::Numeric)
        {
            return Err(PredictorError::invalid_artifact(format!(
                "standard scaler cannot transform categorical feature '{feature}'"
            )));
        }
        if self
            .mean
            .iter()
            .chain(&self.scale)
            .any(|v| !v.is_finite())
        {
            return Err(PredictorError::invalid_artifact(
                "standard scaler parameters must be finite",
            ));
        }
        Ok(())
    }

    fn transform_into(&self, row: &FeatureRow, output: &mut Vec<f64>) -> PredictorResult<()> {
        for ((feature, mean), scale) in self.features.iter().zip(&self.mean).zip(&self.scale) {
            let value = row.number(*feature).ok_or_else(|| {
                PredictorError::feature(format!("column '{feature}' is not numeric"))
            })?;
            let scale = if *scale == 0.0 { 1.0 } else { *scale };
            output.push((value - mean) / scale);
        }
        Ok(())
    }
}

/// Fitted one-hot encoder that ignores unknown categories
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneHotEncoder {
    /// Columns in transform order
    pub features: Vec<FeatureName>,
    /// Known categories per column, in output order
    pub categories: Vec<Vec<String>>,
}

impl OneHotEncoder {
    fn validate(&self) -> PredictorResult<()> {
        if self.categories.len() != self.features.len() {
            return Err(PredictorError::invalid_artifact(format!(
                "one-hot encoder has {} features but {} category lists",
                self.features.len(),
                self.categories.len()
            )));
        }
        for (feature, categories) in self.features.iter().zip(&self.categories) {
            if feature.kind() != FeatureKind::Categorical {
                return Err(PredictorError::invalid_artifact(format!(
                    "one-hot encoder cannot transform numeric feature '{feature}'"
                )));
            }
            if categories.is_empty() {
                return Err(PredictorError::invalid_artifact(format!(
                    "feature '{feature}' has no categories"
                )));
            }
            let unique: BTreeSet<&String> = categories.iter().collect();
            if unique.len() != categories.len() {
                return Err(PredictorError::invalid_artifact(format!(
                    "feature '{feature}' lists a category twice"
                )));
            }
        }
        Ok(())
    }

    fn output_width(&self) -> usize {
        self.categories.iter().map(Vec::len).sum()
    }

    fn transform_into(&self, row: &FeatureRow, output: &mut Vec<f64>) -> PredictorResult<()> {
        for (feature, categories) in self.features.iter().zip(&self.categories) {
            let value = row.category(*feature).ok_or_else(|| {
                PredictorError::feature(format!("column '{feature}' is not categorical"))
            })?;
            // Unknown categories encode as all zeros
            output.extend(
                categories
                    .iter()
                    .map(|category| if category == value { 1.0 } else { 0.0 }),
            );
        }
        Ok(())
    }
}

fn ensure_canonical_set(what: &str, features: &[FeatureName]) -> PredictorResult<()> {
    let unique: BTreeSet<FeatureName> = features.iter().copied().collect();
    if unique.len() != features.len() {
        return Err(PredictorError::invalid_artifact(format!(
            "{what} lists a feature twice"
        )));
    }
    if let Some(missing) = FeatureName::all().iter().find(|f| !unique.contains(f)) {
        return Err(PredictorError::invalid_artifact(format!(
            "{what} does not include '{missing}'"
        )));
    }
    debug_assert_eq!(unique.len(), FEATURE_COUNT);
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;
    use crate::{classifier::Classifier, types::FeatureRecord};

    const FIXTURE: &str = include_str!("../tests/fixtures/minimal_forest.json");

    fn applicant(income: f64, defaults: &str) -> FeatureRow {
        let record = FeatureRecord::try_from(json!({
            "person_age": 30,
            "person_income": income,
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
            "previous_loan_defaults_on_file": defaults
        }))
        .unwrap();
        FeatureRow::from_record(&record).unwrap()
    }

    fn fixture_value() -> serde_json::Value {
        serde_json::from_str(FIXTURE).unwrap()
    }

    #[test]
    fn fixture_parses_and_validates() {
        let descriptor = ModelDescriptor::from_json(FIXTURE).unwrap();
        assert_eq!(descriptor.display_name(), "RandomForestClassifier");
        assert_eq!(descriptor.model_version.as_str(), "1.0");
        // 8 numeric + 2 + 4 + 4 + 6 + 2 one-hot columns
        assert_eq!(descriptor.preprocessor.output_width(), 26);
    }

    #[test]
    fn transform_scales_then_one_hot_encodes() {
        let descriptor = ModelDescriptor::from_json(FIXTURE).unwrap();
        let x = descriptor
            .preprocessor
            .transform(&applicant(50000.0, "No"))
            .unwrap();

        assert_eq!(x.len(), 26);
        // person_age: (30 - 30) / 10
        assert!(x[0].abs() < 1e-12);
        // person_income: (50000 - 60000) / 20000
        assert!((x[1] + 0.5).abs() < 1e-12);
        // previous_loan_defaults_on_file is the last block: [No, Yes]
        assert_eq!(&x[24..], &[1.0, 0.0]);
    }

    #[test]
    fn zero_scale_only_centers() {
        let mut value = fixture_value();
        value["preprocessor"]["numeric"]["scale"][0] = json!(0.0);
        let descriptor = ModelDescriptor::from_json(&value.to_string()).unwrap();
        let x = descriptor
            .preprocessor
            .transform(&applicant(50000.0, "No"))
            .unwrap();
        assert!(x[0].abs() < 1e-12);
    }

    #[test]
    fn unknown_category_encodes_as_zeros() {
        let mut value = fixture_value();
        value["preprocessor"]["categorical"]["categories"][4] = json!(["N", "Y"]);
        let descriptor = ModelDescriptor::from_json(&value.to_string()).unwrap();
        let x = descriptor
            .preprocessor
            .transform(&applicant(50000.0, "No"))
            .unwrap();
        assert_eq!(&x[24..], &[0.0, 0.0]);
    }

    #[test]
    fn fixture_forest_separates_defaulters() {
        let descriptor = ModelDescriptor::from_json(FIXTURE).unwrap();
        let preprocessor = descriptor.preprocessor.clone();
        let classifier = descriptor.classifier.into_classifier();

        let good = preprocessor.transform(&applicant(50000.0, "No")).unwrap();
        let bad = preprocessor.transform(&applicant(12000.0, "Yes")).unwrap();

        assert_eq!(classifier.predict(&good).unwrap(), 0);
        assert_eq!(classifier.predict(&bad).unwrap(), 1);
        assert!(classifier.predict_proba(&bad).unwrap()[1] > 0.5);
    }

    #[test]
    fn rejects_unsupported_format_version() {
        let mut value = fixture_value();
        value["format_version"] = json!(2);
        let err = ModelDescriptor::from_json(&value.to_string()).unwrap_err();
        assert!(matches!(err, PredictorError::InvalidArtifact { .. }));
    }

    #[test]
    fn rejects_swapped_class_labels() {
        let mut value = fixture_value();
        value["classifier"]["classes"] = json!([1, 0]);
        let err = ModelDescriptor::from_json(&value.to_string()).unwrap_err();
        assert!(matches!(err, PredictorError::InvalidArtifact { .. }));
    }

    #[test]
    fn rejects_incomplete_feature_list() {
        let mut value = fixture_value();
        value["feature_names"].as_array_mut().unwrap().pop();
        assert!(ModelDescriptor::from_json(&value.to_string()).is_err());
    }

    #[test]
    fn rejects_unknown_feature_name() {
        let mut value = fixture_value();
        value["feature_names"][0] = json!("age");
        let err = ModelDescriptor::from_json(&value.to_string()).unwrap_err();
        assert!(matches!(err, PredictorError::Json { .. }));
    }

    #[test]
    fn rejects_feature_in_wrong_step() {
        let mut value = fixture_value();
        let numeric = &mut value["preprocessor"]["numeric"];
        numeric["features"][0] = json!("person_gender");
        assert!(ModelDescriptor::from_json(&value.to_string()).is_err());
    }

    #[test]
    fn rejects_scaler_length_mismatch() {
        let mut value = fixture_value();
        value["preprocessor"]["numeric"]["mean"]
            .as_array_mut()
            .unwrap()
            .pop();
        assert!(ModelDescriptor::from_json(&value.to_string()).is_err());
    }

    #[test]
    fn model_name_override() {
        let mut value = fixture_value();
        value["model_name"] = json!("CreditForest");
        let descriptor = ModelDescriptor::from_json(&value.to_string()).unwrap();
        assert_eq!(descriptor.display_name(), "CreditForest");

        value["model_name"] = json!("  ");
        assert!(ModelDescriptor::from_json(&value.to_string()).is_err());
    }

    #[tokio::test]
    async fn from_file_reports_path_on_failure() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.json");
        fs::write(&path, "{ not json").await.unwrap();

        let err = ModelDescriptor::from_file(&path).await.unwrap_err();
        assert!(matches!(err, PredictorError::Json { .. }));
        assert!(err.to_string().contains("broken.json"));

        let missing = ModelDescriptor::from_file(temp_dir.path().join("absent.json"))
            .await
            .unwrap_err();
        assert!(matches!(missing, PredictorError::Io { .. }));
    }

    #[tokio::test]
    async fn from_file_loads_fixture() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("model.json");
        fs::write(&path, FIXTURE).await.unwrap();

        let descriptor = ModelDescriptor::from_file(&path).await.unwrap();
        assert_eq!(descriptor.feature_names.len(), FEATURE_COUNT);
    }
}
