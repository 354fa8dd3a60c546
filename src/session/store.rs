//! Cookie-backed credential storage scoped to a single request/response pair.

use axum::http::{
    header::{COOKIE, SET_COOKIE},
    HeaderMap, HeaderValue,
};
use std::collections::HashMap;
use tracing::error;

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// Access tokens are short-lived; the backend declares a one hour TTL.
pub const ACCESS_TOKEN_MAX_AGE_SECONDS: i64 = 60 * 60;
/// Refresh tokens are long-lived; the backend declares a 30 day TTL.
pub const REFRESH_TOKEN_MAX_AGE_SECONDS: i64 = 30 * 24 * 60 * 60;

/// Typed view over one request's cookie jar plus the `Set-Cookie` values the
/// response should carry.
///
/// Reads never fail: a missing cookie is `None`. Writes queue a `Set-Cookie`
/// with the shared security attributes and are immediately visible to later
/// reads on the same store, so a refreshed access token is picked up by the
/// retry that follows it.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    values: HashMap<String, String>,
    pending: Vec<String>,
    secure: bool,
}

impl CredentialStore {
    /// Build a store from the incoming request headers.
    ///
    /// `secure` marks written cookies `Secure`; it should be on whenever the
    /// gateway is served over HTTPS.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap, secure: bool) -> Self {
        let mut values = HashMap::new();
        if let Some(value) = headers.get(COOKIE).and_then(|header| header.to_str().ok()) {
            for pair in value.split(';') {
                let mut parts = pair.trim().splitn(2, '=');
                let Some(name) = parts.next().map(str::trim) else {
                    continue;
                };
                let Some(value) = parts.next().map(str::trim) else {
                    continue;
                };
                if !name.is_empty() {
                    values.insert(name.to_string(), value.to_string());
                }
            }
        }
        Self {
            values,
            pending: Vec::new(),
            secure,
        }
    }

    #[must_use]
    pub fn new(secure: bool) -> Self {
        Self {
            secure,
            ..Self::default()
        }
    }

    /// Current value of a cookie; pending writes win over the request snapshot.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Queue a cookie write with the shared attribute policy.
    pub fn set(&mut self, name: &str, value: &str, max_age_seconds: i64) {
        self.values.insert(name.to_string(), value.to_string());
        self.pending
            .push(self.build_cookie(name, value, max_age_seconds));
    }

    /// Remove a cookie. Idempotent: deleting an absent cookie is a no-op for
    /// readers and queues the same expiring `Set-Cookie` either way.
    pub fn delete(&mut self, name: &str) {
        self.values.remove(name);
        self.pending.push(self.build_cookie(name, "", 0));
    }

    /// Persist a token pair, each with its own max-age. An omitted token
    /// leaves the stored cookie untouched so a refresh response carrying only
    /// a new access token does not clobber a still-valid refresh token.
    pub fn persist_tokens(&mut self, access_token: Option<&str>, refresh_token: Option<&str>) {
        if let Some(token) = access_token {
            self.set(ACCESS_TOKEN_COOKIE, token, ACCESS_TOKEN_MAX_AGE_SECONDS);
        }
        if let Some(token) = refresh_token {
            self.set(REFRESH_TOKEN_COOKIE, token, REFRESH_TOKEN_MAX_AGE_SECONDS);
        }
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Queued `Set-Cookie` strings, in write order.
    #[must_use]
    pub fn pending_cookies(&self) -> &[String] {
        &self.pending
    }

    /// Append the queued `Set-Cookie` values to a response.
    pub fn apply_to(&self, headers: &mut HeaderMap) {
        for cookie in &self.pending {
            match HeaderValue::from_str(cookie) {
                Ok(value) => {
                    headers.append(SET_COOKIE, value);
                }
                Err(err) => {
                    error!("Failed to encode Set-Cookie header: {err}");
                }
            }
        }
    }

    /// Rebuild a `Cookie` request header from the current values, so a
    /// request can be forwarded with refreshed credentials.
    #[must_use]
    pub fn cookie_header(&self) -> Option<HeaderValue> {
        if self.values.is_empty() {
            return None;
        }
        let mut entries: Vec<_> = self.values.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        let joined = entries
            .into_iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");
        HeaderValue::from_str(&joined).ok()
    }

    fn build_cookie(&self, name: &str, value: &str, max_age_seconds: i64) -> String {
        let mut cookie =
            format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_seconds}");
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}
