//! Pre-trained classifier loading and scoring.
//!
//! The artifact is a JSON file tagged by `kind`. It is read once at startup and
//! shared read-only afterwards.

use std::{fmt, path::Path};

use anyhow::Context;
use serde::Deserialize;
use tracing::{info, warn};

use crate::predictions::features::{FeatureVector, FEATURE_COUNT};

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("model expects {expected} features, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("tree node {0} does not exist")]
    MissingNode(usize),
    #[error("feature index {0} is out of range")]
    FeatureOutOfRange(usize),
    #[error("tree walk did not reach a leaf")]
    NoLeaf,
}

/// A trained model. `predict` is mandatory; models that cannot score classes
/// keep the default `predict_proba`, which reports `Ok(None)`.
pub trait Classifier: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Result<i64, InferenceError>;

    fn predict_proba(&self, _features: &FeatureVector) -> Result<Option<Vec<f64>>, InferenceError> {
        Ok(None)
    }
}

/// Label attached to a raw class code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Category {
    Normal,
    Anemia,
    Unmapped(i64),
}

impl Category {
    pub fn from_class(code: i64) -> Self {
        match code {
            0 => Category::Normal,
            1 => Category::Anemia,
            other => Category::Unmapped(other),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Normal => f.write_str("Normal"),
            Category::Anemia => f.write_str("Anemia"),
            Category::Unmapped(code) => write!(f, "{}", code),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub category: Category,
    /// Probability of the winning class in percent, two decimals.
    pub confidence: Option<f64>,
}

pub fn classify(
    model: &dyn Classifier,
    features: &FeatureVector,
) -> Result<Classification, InferenceError> {
    let code = model.predict(features)?;
    let confidence = match model.predict_proba(features) {
        Ok(Some(probs)) => confidence_percent(&probs),
        Ok(None) => None,
        Err(e) => {
            warn!(error = %e, "probability scoring failed; confidence omitted");
            None
        }
    };
    Ok(Classification {
        category: Category::from_class(code),
        confidence,
    })
}

fn confidence_percent(probs: &[f64]) -> Option<f64> {
    let best = probs
        .iter()
        .copied()
        .filter(|p| p.is_finite())
        .reduce(f64::max)?;
    Some((best * 100.0 * 100.0).round() / 100.0)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    LogisticRegression {
        intercept: f64,
        coefficients: Vec<f64>,
    },
    DecisionTree {
        nodes: Vec<TreeNode>,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        class: i64,
        #[serde(default)]
        distribution: Option<Vec<f64>>,
    },
}

impl ModelArtifact {
    fn kind(&self) -> &'static str {
        match self {
            ModelArtifact::LogisticRegression { .. } => "logistic_regression",
            ModelArtifact::DecisionTree { .. } => "decision_tree",
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        match self {
            ModelArtifact::LogisticRegression { coefficients, .. } => {
                anyhow::ensure!(
                    coefficients.len() == FEATURE_COUNT,
                    "logistic regression needs {} coefficients, found {}",
                    FEATURE_COUNT,
                    coefficients.len()
                );
            }
            ModelArtifact::DecisionTree { nodes } => {
                anyhow::ensure!(!nodes.is_empty(), "decision tree has no nodes");
            }
        }
        Ok(())
    }

    fn walk<'a>(
        nodes: &'a [TreeNode],
        x: &[f64],
    ) -> Result<(i64, Option<&'a [f64]>), InferenceError> {
        let mut idx = 0;
        // An acyclic path visits each node at most once.
        for _ in 0..nodes.len() {
            match nodes.get(idx).ok_or(InferenceError::MissingNode(idx))? {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = x
                        .get(*feature)
                        .ok_or(InferenceError::FeatureOutOfRange(*feature))?;
                    idx = if *value <= *threshold { *left } else { *right };
                }
                TreeNode::Leaf {
                    class,
                    distribution,
                } => return Ok((*class, distribution.as_deref())),
            }
        }
        Err(InferenceError::NoLeaf)
    }

    fn positive_probability(
        intercept: f64,
        coefficients: &[f64],
        x: &[f64],
    ) -> Result<f64, InferenceError> {
        if coefficients.len() != x.len() {
            return Err(InferenceError::DimensionMismatch {
                expected: coefficients.len(),
                got: x.len(),
            });
        }
        let z = intercept + coefficients.iter().zip(x).map(|(w, v)| w * v).sum::<f64>();
        Ok(1.0 / (1.0 + (-z).exp()))
    }
}

impl Classifier for ModelArtifact {
    fn predict(&self, features: &FeatureVector) -> Result<i64, InferenceError> {
        match self {
            ModelArtifact::LogisticRegression {
                intercept,
                coefficients,
            } => {
                let p = Self::positive_probability(*intercept, coefficients, features.as_slice())?;
                Ok(if p >= 0.5 { 1 } else { 0 })
            }
            ModelArtifact::DecisionTree { nodes } => {
                Self::walk(nodes, features.as_slice()).map(|(class, _)| class)
            }
        }
    }

    fn predict_proba(&self, features: &FeatureVector) -> Result<Option<Vec<f64>>, InferenceError> {
        match self {
            ModelArtifact::LogisticRegression {
                intercept,
                coefficients,
            } => {
                let p = Self::positive_probability(*intercept, coefficients, features.as_slice())?;
                Ok(Some(vec![1.0 - p, p]))
            }
            ModelArtifact::DecisionTree { nodes } => {
                let (_, distribution) = Self::walk(nodes, features.as_slice())?;
                Ok(distribution.and_then(|d| {
                    let total: f64 = d.iter().sum();
                    (total > 0.0).then(|| d.iter().map(|c| c / total).collect())
                }))
            }
        }
    }
}

/// Reads and validates the artifact. Any failure here aborts startup.
pub fn load_model(path: &Path) -> anyhow::Result<ModelArtifact> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("model artifact not found at {}", path.display()))?;
    let model: ModelArtifact = serde_json::from_str(&raw)
        .with_context(|| format!("parse model artifact {}", path.display()))?;
    model.validate()?;
    info!(path = %path.display(), kind = model.kind(), "model loaded");
    Ok(model)
}
