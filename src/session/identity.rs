//! Access-token verification and the identity derived from it.
//!
//! The gateway never mints tokens; it only verifies the backend's HS256
//! signature locally so the route guard can decide without a network call.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Clock-skew leeway applied to `exp` validation.
const LEEWAY_SECONDS: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Admin,
}

/// Claims carried by an Arise access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject: the backend user id.
    pub sub: String,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

/// Identity derived from a verified access token. Computed on demand per
/// request and never persisted.
#[derive(Debug, Clone)]
pub struct Identity {
    pub subject: String,
    pub role: Role,
    pub expires_at: i64,
}

impl Identity {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Verify an access token and return its identity.
///
/// Missing, expired, malformed, wrongly signed, and unknown-role tokens all
/// collapse to `None`; callers treat every failure as "no identity".
#[must_use]
pub fn decode_identity(token: &str, secret: &SecretString) -> Option<Identity> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = LEEWAY_SECONDS;

    let key = DecodingKey::from_secret(secret.expose_secret().as_bytes());
    match decode::<AccessClaims>(token, &key, &validation) {
        Ok(data) => Some(Identity {
            subject: data.claims.sub,
            role: data.claims.role,
            expires_at: data.claims.exp,
        }),
        Err(err) => {
            debug!("Access token rejected: {err}");
            None
        }
    }
}
