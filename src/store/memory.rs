use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{Store, StoreError};
use crate::{
    auth::repo_types::User,
    predictions::repo_types::{NewPrediction, Prediction},
};

/// In-process store with the same contract as the Postgres one.
#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<Vec<User>>,
    predictions: Mutex<Vec<Prediction>>,
}

impl MemoryStore {
    pub fn prediction_count(&self) -> usize {
        self.predictions.lock().unwrap().len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, StoreError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == email) {
            return Err(StoreError::DuplicateEmail);
        }
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn update_password(&self, email: &str, password_hash: &str) -> Result<(), StoreError> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .iter_mut()
            .find(|u| u.email == email)
            .ok_or(StoreError::UserNotFound)?;
        user.password_hash = password_hash.to_string();
        Ok(())
    }

    async fn insert_prediction(&self, new: &NewPrediction) -> Result<Prediction, StoreError> {
        let row = Prediction {
            id: Uuid::new_v4(),
            user_email: new.user_email.clone(),
            age: new.age,
            gender: new.gender.clone(),
            hb: new.hb,
            mch: new.mch,
            mchc: new.mchc,
            mcv: new.mcv,
            category: new.category.clone(),
            confidence: new.confidence,
            created_at: OffsetDateTime::now_utc(),
        };
        self.predictions.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn list_predictions(&self, user_email: &str) -> Result<Vec<Prediction>, StoreError> {
        let mut rows: Vec<Prediction> = self
            .predictions
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.user_email == user_email)
            .cloned()
            .collect();
        rows.sort_by_key(|p| p.created_at);
        Ok(rows)
    }
}
