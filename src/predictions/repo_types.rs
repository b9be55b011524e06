use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Stored result of one submitted blood test.
///
/// `user_email` is a plain copy of the owner's email, not a foreign key.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Prediction {
    pub id: Uuid,
    pub user_email: String,
    pub age: i32,
    pub gender: String,
    pub hb: f64,
    pub mch: Option<f64>,
    pub mchc: Option<f64>,
    pub mcv: Option<f64>,
    pub category: String,
    pub confidence: Option<f64>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Insert payload for [`Prediction`]; id and timestamp come from the store.
#[derive(Debug, Clone)]
pub struct NewPrediction {
    pub user_email: String,
    pub age: i32,
    pub gender: String,
    pub hb: f64,
    pub mch: Option<f64>,
    pub mchc: Option<f64>,
    pub mcv: Option<f64>,
    pub category: String,
    pub confidence: Option<f64>,
}
