use tracing::{info, warn};

use super::{
    dto::{ChangePasswordForm, LoginForm, RegisterForm},
    password::{hash_password, password_matches},
    repo_types::User,
};
use crate::store::{Store, StoreError};

/// Failures of the account flows. `Display` is the text shown to the user.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Please fill all fields.")]
    MissingFields,
    #[error("Email already registered. Please login.")]
    EmailTaken,
    #[error("Invalid email/password.")]
    InvalidCredentials,
    #[error("Old password incorrect.")]
    OldPasswordIncorrect,
    #[error("New passwords do not match.")]
    PasswordMismatch,
    #[error("Account not found.")]
    UnknownUser,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateEmail => AuthError::EmailTaken,
            StoreError::UserNotFound => AuthError::UnknownUser,
            other => AuthError::Internal(other.into()),
        }
    }
}

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub async fn register_user(store: &dyn Store, form: RegisterForm) -> Result<User, AuthError> {
    let name = form.name.trim();
    let email = normalize_email(&form.email);

    if name.is_empty() || email.is_empty() || form.password.is_empty() {
        return Err(AuthError::MissingFields);
    }

    if store.find_user_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AuthError::EmailTaken);
    }

    let hash = hash_password(&form.password)?;
    let user = store.create_user(name, &email, &hash).await?;
    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(user)
}

pub async fn authenticate(store: &dyn Store, form: LoginForm) -> Result<User, AuthError> {
    let email = normalize_email(&form.email);

    let Some(user) = store.find_user_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(AuthError::InvalidCredentials);
    };

    if !password_matches(&form.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AuthError::InvalidCredentials);
    }

    info!(user_id = %user.id, "user logged in");
    Ok(user)
}

pub async fn change_password(
    store: &dyn Store,
    email: &str,
    form: ChangePasswordForm,
) -> Result<(), AuthError> {
    let user = store
        .find_user_by_email(email)
        .await?
        .ok_or(AuthError::UnknownUser)?;

    if !password_matches(&form.old_password, &user.password_hash)? {
        return Err(AuthError::OldPasswordIncorrect);
    }
    if form.new_password != form.confirm_new {
        return Err(AuthError::PasswordMismatch);
    }

    let hash = hash_password(&form.new_password)?;
    store.update_password(&user.email, &hash).await?;
    info!(user_id = %user.id, "password changed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    fn register_form(name: &str, email: &str, password: &str) -> RegisterForm {
        RegisterForm {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    fn login_form(email: &str, password: &str) -> LoginForm {
        LoginForm {
            email: email.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn registration_normalizes_and_hashes() {
        let store = MemoryStore::default();
        let user = register_user(&store, register_form("  Asha ", " Asha@Example.COM ", "pw"))
            .await
            .unwrap();
        assert_eq!(user.name, "Asha");
        assert_eq!(user.email, "asha@example.com");
        assert_ne!(user.password_hash, "pw");
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_case_insensitively() {
        let store = MemoryStore::default();
        register_user(&store, register_form("A", "a@example.com", "pw"))
            .await
            .unwrap();
        let err = register_user(&store, register_form("B", "A@EXAMPLE.com", "other"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::EmailTaken));
    }

    #[tokio::test]
    async fn long_names_register_intact() {
        let store = MemoryStore::default();
        let name = "N".repeat(121);
        let user = register_user(&store, register_form(&name, "long@example.com", "pw"))
            .await
            .unwrap();
        assert_eq!(user.name.len(), 121);
    }

    #[tokio::test]
    async fn empty_fields_are_rejected() {
        let store = MemoryStore::default();
        for form in [
            register_form("", "a@example.com", "pw"),
            register_form("A", "   ", "pw"),
            register_form("A", "a@example.com", ""),
        ] {
            let err = register_user(&store, form).await.unwrap_err();
            assert!(matches!(err, AuthError::MissingFields));
        }
        assert!(store.find_user_by_email("a@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn login_checks_password() {
        let store = MemoryStore::default();
        register_user(&store, register_form("A", "a@example.com", "secret"))
            .await
            .unwrap();

        let user = authenticate(&store, login_form("A@example.com", "secret"))
            .await
            .unwrap();
        assert_eq!(user.email, "a@example.com");

        let err = authenticate(&store, login_form("a@example.com", "nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));

        let err = authenticate(&store, login_form("ghost@example.com", "secret"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn password_change_requires_old_and_matching_pair() {
        let store = MemoryStore::default();
        register_user(&store, register_form("A", "a@example.com", "old"))
            .await
            .unwrap();

        let mismatch = ChangePasswordForm {
            old_password: "old".into(),
            new_password: "new".into(),
            confirm_new: "neu".into(),
        };
        let err = change_password(&store, "a@example.com", mismatch).await.unwrap_err();
        assert!(matches!(err, AuthError::PasswordMismatch));
        authenticate(&store, login_form("a@example.com", "old")).await.unwrap();

        let wrong_old = ChangePasswordForm {
            old_password: "guess".into(),
            new_password: "new".into(),
            confirm_new: "new".into(),
        };
        let err = change_password(&store, "a@example.com", wrong_old).await.unwrap_err();
        assert!(matches!(err, AuthError::OldPasswordIncorrect));

        let ok = ChangePasswordForm {
            old_password: "old".into(),
            new_password: "new".into(),
            confirm_new: "new".into(),
        };
        change_password(&store, "a@example.com", ok).await.unwrap();

        assert!(authenticate(&store, login_form("a@example.com", "old")).await.is_err());
        authenticate(&store, login_form("a@example.com", "new")).await.unwrap();
    }
}
