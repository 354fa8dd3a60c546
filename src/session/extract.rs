//! Normalization of backend auth response envelopes into a token pair.
//!
//! The backend nests tokens differently per endpoint: under `tokens`, under
//! `data.tokens`, under `data` directly, or at the top level. This function
//! is the single point that absorbs that inconsistency so callers never
//! optional-chain through response bodies themselves.

use serde_json::Value;

/// Access/refresh token pair pulled out of a backend response body. Either
/// side may be absent; a refresh response often carries only a new access
/// token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl TokenPair {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }
}

/// Extract the first matching token pair, checked in priority order:
/// `tokens`, `data.tokens`, `data.*`, top level.
///
/// `None` input (e.g. an unparseable body) yields an empty pair; this
/// function never fails.
#[must_use]
pub fn extract_token_pair(body: Option<&Value>) -> TokenPair {
    let Some(body) = body else {
        return TokenPair::default();
    };

    let candidates = [
        body.get("tokens"),
        body.get("data").and_then(|data| data.get("tokens")),
        body.get("data"),
        Some(body),
    ];

    for candidate in candidates.into_iter().flatten() {
        let pair = pair_from(candidate);
        if !pair.is_empty() {
            return pair;
        }
    }

    TokenPair::default()
}

fn pair_from(value: &Value) -> TokenPair {
    TokenPair {
        access_token: field(value, "accessToken"),
        refresh_token: field(value, "refreshToken"),
    }
}

/// Non-string values are ignored rather than coerced.
fn field(value: &Value, name: &str) -> Option<String> {
    value.get(name).and_then(Value::as_str).map(str::to_string)
}
