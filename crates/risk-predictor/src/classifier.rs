// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Pre-fitted binary classifiers
//!
//! Classifiers operate on the dense vector produced by
//! [`crate::artifact::Preprocessor::transform`]. Fitting happens elsewhere;
//! this module only evaluates exported parameters.

use serde::{Deserialize, Serialize};

use crate::error::{PredictorError, PredictorResult};

/// Evaluation interface shared by every classifier
#[cfg_attr(test, mockall::automock)]
pub trait Classifier: Send + Sync {
    /// Display name reported when the descriptor does not carry one
    fn name(&self) -> &'static str;

    /// Class probabilities, one column per class
    fn predict_proba(&self, features: &[f64]) -> PredictorResult<Vec<f64>>;

    /// Predicted class label
    fn predict(&self, features: &[f64]) -> PredictorResult<u8>;
}

/// Exported classifier parameters, tagged by algorithm
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClassifierSpec {
    /// Bagged decision trees
    RandomForest(RandomForest),
    /// Binary logistic regression
    LogisticRegression(LogisticRegression),
}

impl ClassifierSpec {
    /// Check structural invariants against the preprocessed width
    pub fn validate(&self, input_width: usize) -> PredictorResult<()> {
        match self {
            Self::RandomForest(forest) => forest.validate(input_width),
            Self::LogisticRegression(model) => model.validate(input_width),
        }
    }

    /// Display name of the algorithm
    pub fn name(&self) -> &'static str {
        match self {
            Self::RandomForest(forest) => forest.name(),
            Self::LogisticRegression(model) => model.name(),
        }
    }

    /// Turn the parameters into an evaluator
    pub fn into_classifier(self) -> Box<dyn Classifier> {
        match self {
            Self::RandomForest(forest) => Box::new(forest),
            Self::LogisticRegression(model) => Box::new(model),
        }
    }
}

/// Decision tree in flat array form
///
/// Node `i` is a leaf iff `children_left[i] == -1`. Internal nodes send a
/// sample left iff `x[feature[i]] <= threshold[i]`. Every child index is
/// greater than its parent's, so traversal always terminates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    /// Left child per node, `-1` for leaves
    pub children_left: Vec<i64>,
    /// Right child per node, `-1` for leaves
    pub children_right: Vec<i64>,
    /// Split feature per node, ignored for leaves
    pub feature: Vec<i64>,
    /// Split threshold per node, ignored for leaves
    pub threshold: Vec<f64>,
    /// Per-class sample weight per node
    pub value: Vec<Vec<f64>>,
}

const LEAF: i64 = -1;

impl DecisionTree {
    fn node_count(&self) -> usize {
        self.children_left.len()
    }

    fn validate(&self, input_width: usize, class_count: usize) -> Result<(), String> {
        let nodes = self.node_count();
        if nodes == 0 {
            return Err("tree has no nodes".to_string());
        }
        if self.children_right.len() != nodes
            || self.feature.len() != nodes
            || self.threshold.len() != nodes
            || self.value.len() != nodes
        {
            return Err(format!(
                "node arrays disagree on length (children_left has {nodes})"
            ));
        }

        for node in 0..nodes {
            let (left, right) = (self.children_left[node], self.children_right[node]);
            if left == LEAF {
                if right != LEAF {
                    return Err(format!("node {node} has only a right child"));
                }
                let weights = &self.value[node];
                if weights.len() != class_count {
                    return Err(format!(
                        "leaf {node} has {} class weights, expected {class_count}",
                        weights.len()
                    ));
                }
                if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
                    return Err(format!("leaf {node} has a negative or non-finite weight"));
                }
                if weights.iter().sum::<f64>() <= 0.0 {
                    return Err(format!("leaf {node} has zero total weight"));
                }
                continue;
            }

            for child in [left, right] {
                let in_range = usize::try_from(child).is_ok_and(|c| c > node && c < nodes);
                if !in_range {
                    return Err(format!("node {node} points at invalid child {child}"));
                }
            }
            let in_range = usize::try_from(self.feature[node]).is_ok_and(|f| f < input_width);
            if !in_range {
                return Err(format!(
                    "node {node} splits on feature {} outside input width {input_width}",
                    self.feature[node]
                ));
            }
            if !self.threshold[node].is_finite() {
                return Err(format!("node {node} has a non-finite threshold"));
            }
        }

        Ok(())
    }

    /// Normalized class weights of the leaf a sample falls into
    pub fn predict_proba(&self, features: &[f64]) -> PredictorResult<Vec<f64>> {
        let mut node = 0usize;
        loop {
            let left = *self
                .children_left
                .get(node)
                .ok_or_else(|| PredictorError::inference(format!("node {node} out of range")))?;

            if left == LEAF {
                let weights = &self.value[node];
                let total: f64 = weights.iter().sum();
                return Ok(weights.iter().map(|w| w / total).collect());
            }

            let split = usize::try_from(self.feature[node])
                .ok()
                .and_then(|f| features.get(f))
                .ok_or_else(|| {
                    PredictorError::inference(format!(
                        "node {node} splits on feature {} but the input has {} columns",
                        self.feature[node],
                        features.len()
                    ))
                })?;

            let next = if *split <= self.threshold[node] {
                left
            } else {
                self.children_right[node]
            };
            node = usize::try_from(next)
                .map_err(|_| PredictorError::inference(format!("node {node} has no children")))?;
        }
    }
}

/// Random forest over decision trees
///
/// The forest probability is the mean of the tree probabilities, and the
/// predicted class is the class with the highest mean (first wins on ties).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    /// Class label per probability column
    pub classes: Vec<u8>,
    /// Fitted trees
    pub trees: Vec<DecisionTree>,
}

impl RandomForest {
    fn validate(&self, input_width: usize) -> PredictorResult<()> {
        validate_classes(&self.classes)?;
        if self.trees.is_empty() {
            return Err(PredictorError::invalid_artifact("random forest has no trees"));
        }
        for (index, tree) in self.trees.iter().enumerate() {
            tree.validate(input_width, self.classes.len())
                .map_err(|e| PredictorError::invalid_artifact(format!("tree {index}: {e}")))?;
        }
        Ok(())
    }
}

impl Classifier for RandomForest {
    fn name(&self) -> &'static str {
        "RandomForestClassifier"
    }

    fn predict_proba(&self, features: &[f64]) -> PredictorResult<Vec<f64>> {
        let mut totals = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            let proba = tree.predict_proba(features)?;
            if proba.len() != totals.len() {
                return Err(PredictorError::inference(format!(
                    "tree produced {} columns, expected {}",
                    proba.len(),
                    totals.len()
                )));
            }
            for (total, p) in totals.iter_mut().zip(proba) {
                *total += p;
            }
        }

        #[allow(clippy::cast_precision_loss)]
        let count = self.trees.len() as f64;
        Ok(totals.into_iter().map(|t| t / count).collect())
    }

    fn predict(&self, features: &[f64]) -> PredictorResult<u8> {
        let proba = self.predict_proba(features)?;
        argmax(&proba)
            .and_then(|index| self.classes.get(index).copied())
            .ok_or_else(|| PredictorError::inference("probability vector is empty"))
    }
}

/// Binary logistic regression
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// One weight per preprocessed column
    pub coefficients: Vec<f64>,
    /// Bias term
    pub intercept: f64,
}

impl LogisticRegression {
    fn validate(&self, input_width: usize) -> PredictorResult<()> {
        if self.coefficients.len() != input_width {
            return Err(PredictorError::invalid_artifact(format!(
                "logistic regression has {} coefficients, expected {input_width}",
                self.coefficients.len()
            )));
        }
        if self.coefficients.iter().any(|w| !w.is_finite()) || !self.intercept.is_finite() {
            return Err(PredictorError::invalid_artifact(
                "logistic regression parameters must be finite",
            ));
        }
        Ok(())
    }

    fn positive_probability(&self, features: &[f64]) -> PredictorResult<f64> {
        if features.len() != self.coefficients.len() {
            return Err(PredictorError::inference(format!(
                "input has {} columns, expected {}",
                features.len(),
                self.coefficients.len()
            )));
        }
        let logit = self
            .coefficients
            .iter()
            .zip(features)
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.intercept;
        Ok(sigmoid(logit))
    }
}

impl Classifier for LogisticRegression {
    fn name(&self) -> &'static str {
        "LogisticRegression"
    }

    fn predict_proba(&self, features: &[f64]) -> PredictorResult<Vec<f64>> {
        let p = self.positive_probability(features)?;
        Ok(vec![1.0 - p, p])
    }

    fn predict(&self, features: &[f64]) -> PredictorResult<u8> {
        Ok(u8::from(self.positive_probability(features)? > 0.5))
    }
}

fn validate_classes(classes: &[u8]) -> PredictorResult<()> {
    if classes.is_empty() || classes.len() > 2 {
        return Err(PredictorError::invalid_artifact(format!(
            "expected 1 or 2 classes, got {}",
            classes.len()
        )));
    }
    if classes.iter().any(|c| *c > 1) {
        return Err(PredictorError::invalid_artifact(
            "class labels must be 0 or 1",
        ));
    }
    // column order follows the labels, so the high-risk column is only known
    // when they are ascending
    if classes.windows(2).any(|pair| pair[0] >= pair[1]) {
        return Err(PredictorError::invalid_artifact(
            "class labels must be distinct and sorted ascending",
        ));
    }
    Ok(())
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, &value) in values.iter().enumerate() {
        if best.is_none_or(|(_, top)| value > top) {
            best = Some((index, value));
        }
    }
    best.map(|(index, _)| index)
}
