use std::collections::BTreeMap;

use tracing::{error, info};

use super::{
    dto::{PredictForm, PredictionOutcome},
    features::{parse_optional, prepare_features},
    repo_types::{NewPrediction, Prediction},
    tips::get_tips,
};
use crate::{
    inference::{classify, Classifier, InferenceError},
    store::{Store, StoreError},
};

/// Number of records shown in the dashboard's recent list.
pub const RECENT_LIMIT: usize = 6;

#[derive(Debug, thiserror::Error)]
pub enum PredictionError {
    #[error("Please enter valid Age, Gender and Hemoglobin.")]
    InvalidMeasurements,
    #[error("Model prediction error: {0}")]
    Inference(#[from] InferenceError),
}

/// Validate, classify, look up tips and store the result.
///
/// A storage failure after a successful classification is logged and the
/// outcome is still returned with `record: None`.
pub async fn submit_prediction(
    store: &dyn Store,
    model: &dyn Classifier,
    user_email: &str,
    form: &PredictForm,
) -> Result<PredictionOutcome, PredictionError> {
    let age = form.age();
    let gender = form.gender();
    let hb = form.hb();

    if age <= 0 || gender.is_empty() || hb <= 0.0 {
        return Err(PredictionError::InvalidMeasurements);
    }

    let features = prepare_features(age, gender, hb, &form.mch, &form.mchc, &form.mcv);
    let result = classify(model, &features)?;
    let category = result.category.to_string();
    let tips = get_tips(&category);

    let new = NewPrediction {
        user_email: user_email.to_string(),
        age,
        gender: gender.to_string(),
        hb,
        mch: parse_optional(&form.mch),
        mchc: parse_optional(&form.mchc),
        mcv: parse_optional(&form.mcv),
        category: category.clone(),
        confidence: result.confidence,
    };

    let record = match store.insert_prediction(&new).await {
        Ok(row) => {
            info!(prediction_id = %row.id, category = %row.category, "prediction stored");
            Some(row)
        }
        Err(e) => {
            error!(error = %e, "prediction not stored");
            None
        }
    };

    Ok(PredictionOutcome {
        category,
        confidence: result.confidence,
        tips,
        record,
    })
}

/// Counts per hemoglobin band: `<7`, `7-9.9`, `10-12`, `>12`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HbRanges {
    pub below_7: u64,
    pub from_7: u64,
    pub from_10: u64,
    pub above_12: u64,
}

impl HbRanges {
    fn record(&mut self, hb: f64) {
        if hb < 7.0 {
            self.below_7 += 1;
        } else if hb < 10.0 {
            self.from_7 += 1;
        } else if hb <= 12.0 {
            self.from_10 += 1;
        } else {
            self.above_12 += 1;
        }
    }

    pub fn entries(&self) -> [(&'static str, u64); 4] {
        [
            ("<7", self.below_7),
            ("7-9.9", self.from_7),
            ("10-12", self.from_10),
            (">12", self.above_12),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct DashboardSummary {
    pub total: usize,
    /// Up to [`RECENT_LIMIT`] newest records, oldest of them first.
    pub recent: Vec<Prediction>,
    pub category_counts: BTreeMap<String, u64>,
    pub hb_ranges: HbRanges,
}

/// Aggregates a user's history. `predictions` must be ordered oldest first.
pub fn summarize(predictions: Vec<Prediction>) -> DashboardSummary {
    let mut category_counts: BTreeMap<String, u64> =
        [("Normal".to_string(), 0), ("Anemia".to_string(), 0)].into();
    let mut hb_ranges = HbRanges::default();

    for p in &predictions {
        *category_counts.entry(p.category.clone()).or_insert(0) += 1;
        hb_ranges.record(p.hb);
    }

    let total = predictions.len();
    let recent = predictions[total.saturating_sub(RECENT_LIMIT)..].to_vec();

    DashboardSummary {
        total,
        recent,
        category_counts,
        hb_ranges,
    }
}

pub async fn load_dashboard(
    store: &dyn Store,
    user_email: &str,
) -> Result<DashboardSummary, StoreError> {
    let predictions = store.list_predictions(user_email).await?;
    Ok(summarize(predictions))
}
