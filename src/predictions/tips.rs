use std::collections::HashMap;

use lazy_static::lazy_static;

const FALLBACK: &[&str] = &["Please consult a healthcare provider for proper evaluation."];

lazy_static! {
    static ref TIPS: HashMap<&'static str, &'static [&'static str]> = {
        let mut m: HashMap<&'static str, &'static [&'static str]> = HashMap::new();
        m.insert(
            "Normal",
            &[
                "Maintain a balanced diet rich in iron, vitamin B12 and folate.",
                "Keep doing routine health check-ups.",
                "Stay hydrated and active.",
            ],
        );
        m.insert(
            "Anemia",
            &[
                "Increase iron-rich foods such as leafy greens, red meat, and pulses.",
                "Avoid tea and coffee immediately after meals to help iron absorption.",
                "Consult a doctor for further evaluation and supplements if needed.",
            ],
        );
        m
    };
}

/// Advice shown next to a result. Unknown categories get the generic fallback.
pub fn get_tips(category: &str) -> &'static [&'static str] {
    TIPS.get(category).copied().unwrap_or(FALLBACK)
}
