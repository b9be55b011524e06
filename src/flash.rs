//! One-shot user messages carried across a redirect in the `flash` cookie.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
};
use base64ct::{Base64UrlUnpadded, Encoding};

use crate::cookies;

pub const FLASH_COOKIE: &str = "flash";
const FLASH_TTL_SECS: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Error,
    Info,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Success => "success",
            Level::Error => "error",
            Level::Info => "info",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(Level::Success),
            "error" => Some(Level::Error),
            "info" => Some(Level::Info),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub level: Level,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: Level::Info,
            message: message.into(),
        }
    }

    /// `Set-Cookie` value: `<level>.<base64url(message)>`.
    pub fn cookie(&self) -> String {
        let encoded = Base64UrlUnpadded::encode_string(self.message.as_bytes());
        cookies::set(
            FLASH_COOKIE,
            &format!("{}.{}", self.level.as_str(), encoded),
            FLASH_TTL_SECS,
        )
    }

    fn decode(raw: &str) -> Option<Self> {
        let (level, encoded) = raw.split_once('.')?;
        let bytes = Base64UrlUnpadded::decode_vec(encoded).ok()?;
        Some(Self {
            level: Level::parse(level)?,
            message: String::from_utf8(bytes).ok()?,
        })
    }
}

/// Pending flash from the previous response, if any. Pages that render it
/// must clear the cookie (see `views::Page`).
#[derive(Debug, Default)]
pub struct IncomingFlash(pub Option<Flash>);

#[async_trait]
impl<S> FromRequestParts<S> for IncomingFlash
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(IncomingFlash(
            cookies::read(&parts.headers, FLASH_COOKIE).and_then(|raw| Flash::decode(&raw)),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_value_survives_punctuation() {
        let flash = Flash::error("Model prediction error: bad; input=1, \"x\"");
        let header = flash.cookie();
        let value = header
            .strip_prefix("flash=")
            .and_then(|rest| rest.split(';').next())
            .unwrap();
        assert!(!value.contains(' '));
        assert_eq!(Flash::decode(value), Some(flash));
    }

    #[test]
    fn garbage_cookie_is_ignored() {
        assert_eq!(Flash::decode("nonsense"), None);
        assert_eq!(Flash::decode("warning.SGk"), None);
        assert_eq!(Flash::decode("info.!!!"), None);
    }
}
