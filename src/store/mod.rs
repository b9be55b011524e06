use async_trait::async_trait;

use crate::{
    auth::repo_types::User,
    predictions::repo_types::{NewPrediction, Prediction},
};

#[cfg(test)]
pub mod memory;
pub mod postgres;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error("user not found")]
    UserNotFound,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Persistence seam for users and predictions.
///
/// Emails passed in are expected to be lowercased by the caller.
#[async_trait]
pub trait Store: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, StoreError>;

    async fn update_password(&self, email: &str, password_hash: &str) -> Result<(), StoreError>;

    async fn insert_prediction(&self, new: &NewPrediction) -> Result<Prediction, StoreError>;

    /// All predictions of one user, oldest first.
    async fn list_predictions(&self, user_email: &str) -> Result<Vec<Prediction>, StoreError>;
}
