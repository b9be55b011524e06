use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Session token payload. Carries enough identity to render pages without a
/// user lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,     // user ID
    pub name: String,  // display name at login time
    pub email: String, // lowercased email
    pub iat: usize,    // issued at (unix timestamp)
    pub exp: usize,    // expires at (unix timestamp)
    pub iss: String,   // issuer
    pub aud: String,   // audience
}
