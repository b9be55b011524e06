use std::time::Duration;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, HeaderMap},
    response::Response,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::{claims::Claims, repo_types::User};
use crate::{config::SessionConfig, cookies, flash::Flash, state::AppState};

pub const SESSION_COOKIE: &str = "session";

#[derive(Clone)]
pub struct SessionKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub ttl: Duration,
}

impl FromRef<AppState> for SessionKeys {
    fn from_ref(state: &AppState) -> Self {
        let SessionConfig {
            secret,
            issuer,
            audience,
            ttl_minutes,
        } = state.config.session.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            audience,
            ttl: Duration::from_secs((ttl_minutes.max(1) as u64) * 60),
        }
    }
}

impl SessionKeys {
    pub fn sign(&self, user: &User) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = Claims {
            sub: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user.id, "session signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        Ok(data.claims)
    }

    /// `Set-Cookie` value establishing the session for the full TTL.
    pub fn session_cookie(&self, token: &str) -> String {
        cookies::set(SESSION_COOKIE, token, self.ttl.as_secs() as i64)
    }
}

pub fn clear_session_cookie() -> String {
    cookies::clear(SESSION_COOKIE)
}

/// Session cookie first, then a bearer header for non-browser clients.
fn session_token(headers: &HeaderMap) -> Option<String> {
    cookies::read(headers, SESSION_COOKIE)
        .filter(|t| !t.is_empty())
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(str::to_string)
        })
}

/// Authenticated identity. Rejects with a redirect to `/auth`.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    SessionKeys: FromRef<S>,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let login_required = Flash::error("Please login to continue.").cookie();

        let Some(token) = session_token(&parts.headers) else {
            return Err(cookies::redirect("/auth", [login_required]));
        };

        let keys = SessionKeys::from_ref(state);
        match keys.verify(&token) {
            Ok(claims) => Ok(CurrentUser {
                id: claims.sub,
                name: claims.name,
                email: claims.email,
            }),
            Err(e) => {
                debug!(error = %e, "invalid or expired session");
                Err(cookies::redirect(
                    "/auth",
                    [login_required, clear_session_cookie()],
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, Request, StatusCode};

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            name: "Asha".into(),
            email: "asha@example.com".into(),
            password_hash: String::new(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn keys() -> SessionKeys {
        SessionKeys::from_ref(&AppState::fake())
    }

    #[test]
    fn sign_and_verify_session() {
        let keys = keys();
        let user = user();
        let token = keys.sign(&user).expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, "asha@example.com");
        assert_eq!(claims.name, "Asha");
        assert_eq!(claims.exp - claims.iat, 60 * 60);
    }

    #[test]
    fn verify_rejects_foreign_secret() {
        let mut other = keys();
        other.encoding = EncodingKey::from_secret(b"someone-else");
        let token = other.sign(&user()).expect("sign");
        assert!(keys().verify(&token).is_err());
    }

    #[test]
    fn session_cookie_lives_for_ttl() {
        let cookie = keys().session_cookie("tok");
        assert!(cookie.starts_with("session=tok;"));
        assert!(cookie.contains("Max-Age=3600"));
        assert!(cookie.contains("HttpOnly"));
    }

    async fn extract(req: Request<()>) -> Result<CurrentUser, Response> {
        let state = AppState::fake();
        let (mut parts, _) = req.into_parts();
        CurrentUser::from_request_parts(&mut parts, &state).await
    }

    #[tokio::test]
    async fn extractor_accepts_session_cookie() {
        let user = user();
        let token = keys().sign(&user).unwrap();
        let req = Request::builder()
            .header(header::COOKIE, HeaderValue::from_str(&format!("session={}", token)).unwrap())
            .body(())
            .unwrap();
        let current = extract(req).await.expect("authenticated");
        assert_eq!(current.id, user.id);
    }

    #[tokio::test]
    async fn extractor_redirects_anonymous_to_auth() {
        let req = Request::builder().body(()).unwrap();
        let res = extract(req).await.unwrap_err();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(res.headers().get(header::LOCATION).unwrap(), "/auth");
    }

    #[tokio::test]
    async fn extractor_clears_stale_session() {
        let req = Request::builder()
            .header(header::COOKIE, "session=not-a-jwt")
            .body(())
            .unwrap();
        let res = extract(req).await.unwrap_err();
        let cleared = res
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .any(|v| v.to_str().unwrap().starts_with("session=;"));
        assert!(cleared);
    }
}
