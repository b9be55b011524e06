use serde::Deserialize;

use super::{features::parse_optional, repo_types::Prediction};

/// Raw `/predict` form. Everything arrives as text and is coerced leniently,
/// so the page can be re-rendered with exactly what the user typed.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct PredictForm {
    pub age: String,
    pub gender: String,
    pub hb: String,
    pub mch: String,
    pub mchc: String,
    pub mcv: String,
}

impl PredictForm {
    /// Unparseable age counts as 0, which validation rejects.
    pub fn age(&self) -> i32 {
        self.age.trim().parse().unwrap_or(0)
    }

    pub fn gender(&self) -> &str {
        self.gender.trim()
    }

    pub fn hb(&self) -> f64 {
        parse_optional(&self.hb).unwrap_or(0.0)
    }
}

/// What the result page shows after a successful classification.
#[derive(Debug, Clone)]
pub struct PredictionOutcome {
    pub category: String,
    pub confidence: Option<f64>,
    pub tips: &'static [&'static str],
    /// `None` when the result could not be stored.
    pub record: Option<Prediction>,
}
