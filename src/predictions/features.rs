//! Mapping from submitted form values to the classifier input.

/// Number of inputs the classifier expects.
pub const FEATURE_COUNT: usize = 5;

/// Classifier input in fixed order: `[gender_code, hb, mch, mchc, mcv]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector(pub [f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

/// female -> 0, male -> 1, anything else -> 2.
pub fn gender_code(gender: &str) -> u8 {
    match gender.trim().to_lowercase().as_str() {
        "female" => 0,
        "male" => 1,
        _ => 2,
    }
}

/// Lenient float parse: blank, garbage and non-finite input become `None`.
pub fn parse_optional(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Builds the vector for one submission. Age is accepted for symmetry with the
/// form but the model does not use it. Optional lab values that are missing or
/// malformed default to 0.0.
pub fn prepare_features(
    _age: i32,
    gender: &str,
    hb: f64,
    mch: &str,
    mchc: &str,
    mcv: &str,
) -> FeatureVector {
    FeatureVector([
        f64::from(gender_code(gender)),
        hb,
        parse_optional(mch).unwrap_or(0.0),
        parse_optional(mchc).unwrap_or(0.0),
        parse_optional(mcv).unwrap_or(0.0),
    ])
}
