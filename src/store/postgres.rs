use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::debug;

use super::{Store, StoreError};
use crate::{
    auth::repo_types::User,
    predictions::repo_types::{NewPrediction, Prediction},
};

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { db })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.db)
            .await
            .context("run migrations")?;
        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, StoreError> {
        let res = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, password_hash, created_at
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.db)
        .await;

        match res {
            Ok(user) => Ok(user),
            // Two registrations racing past the lookup land here.
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(StoreError::DuplicateEmail)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update_password(&self, email: &str, password_hash: &str) -> Result<(), StoreError> {
        let done = sqlx::query(r#"UPDATE users SET password_hash = $1 WHERE email = $2"#)
            .bind(password_hash)
            .bind(email)
            .execute(&self.db)
            .await?;
        if done.rows_affected() == 0 {
            return Err(StoreError::UserNotFound);
        }
        Ok(())
    }

    async fn insert_prediction(&self, new: &NewPrediction) -> Result<Prediction, StoreError> {
        let row = sqlx::query_as::<_, Prediction>(
            r#"
            INSERT INTO predictions
                (user_email, age, gender, hb, mch, mchc, mcv, category, confidence)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, user_email, age, gender, hb, mch, mchc, mcv,
                      category, confidence, created_at
            "#,
        )
        .bind(&new.user_email)
        .bind(new.age)
        .bind(&new.gender)
        .bind(new.hb)
        .bind(new.mch)
        .bind(new.mchc)
        .bind(new.mcv)
        .bind(&new.category)
        .bind(new.confidence)
        .fetch_one(&self.db)
        .await?;
        debug!(prediction_id = %row.id, "prediction inserted");
        Ok(row)
    }

    async fn list_predictions(&self, user_email: &str) -> Result<Vec<Prediction>, StoreError> {
        let rows = sqlx::query_as::<_, Prediction>(
            r#"
            SELECT id, user_email, age, gender, hb, mch, mchc, mcv,
                   category, confidence, created_at
            FROM predictions
            WHERE user_email = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_email)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    const SCHEMA: &str = include_str!("../../migrations/0001_create_users_and_predictions.sql");

    fn column_type(table: &str, column: &str) -> &'static str {
        let start = SCHEMA
            .find(&format!("CREATE TABLE IF NOT EXISTS {} (", table))
            .unwrap();
        let body = &SCHEMA[start..];
        let body = &body[..body.find(");").unwrap()];
        body.lines()
            .map(str::trim)
            .find_map(|line| {
                let mut parts = line.split_whitespace();
                (parts.next() == Some(column)).then(|| parts.next().unwrap_or(""))
            })
            .unwrap()
    }

    #[test]
    fn free_text_columns_have_no_length_cap() {
        for (table, column) in [
            ("users", "name"),
            ("users", "email"),
            ("users", "password_hash"),
            ("predictions", "user_email"),
            ("predictions", "gender"),
            ("predictions", "category"),
        ] {
            assert_eq!(column_type(table, column), "TEXT", "{}.{}", table, column);
        }
    }

    #[test]
    fn schema_has_no_varchar_limits() {
        assert!(!SCHEMA.to_uppercase().contains("VARCHAR"));
    }
}
