//! Refresh-token exchange against the backend.

use reqwest::{header::COOKIE, Client};
use serde_json::Value;
use tracing::{debug, info_span, warn, Instrument};

use super::{
    extract::extract_token_pair,
    store::{CredentialStore, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE},
};

/// Exchange the stored refresh token for a new credential pair.
///
/// Returns `true` when a new pair was persisted. Any failure — missing
/// refresh token, transport error, non-2xx status, unparseable body, or a
/// falsy `success` flag — reports `false`, and every failure past the
/// missing-token check also deletes both cookies: a rejected refresh token
/// can never become valid again and must not be retried.
pub async fn refresh_credentials(
    http: &Client,
    base_url: &str,
    store: &mut CredentialStore,
) -> bool {
    let Some(refresh_token) = store.get(REFRESH_TOKEN_COOKIE).map(str::to_string) else {
        // Nothing to exchange; skip the backend round-trip entirely.
        return false;
    };

    let url = format!("{}/auth/refresh-token", base_url.trim_end_matches('/'));
    let span = info_span!(
        "session.refresh",
        http.method = "POST",
        url = %url
    );
    let response = http
        .post(&url)
        .header(COOKIE, format!("{REFRESH_TOKEN_COOKIE}={refresh_token}"))
        .send()
        .instrument(span)
        .await;

    let response = match response {
        Ok(response) => response,
        Err(err) => {
            warn!("Token refresh request failed: {err}");
            clear_credentials(store);
            return false;
        }
    };

    let status = response.status();
    // Parse failures degrade to None and count as an unsuccessful response.
    let body: Option<Value> = response.json().await.ok();
    let accepted = status.is_success()
        && body
            .as_ref()
            .and_then(|body| body.get("success"))
            .and_then(Value::as_bool)
            .unwrap_or(false);

    if !accepted {
        debug!("Refresh token rejected with status {status}; clearing credentials");
        clear_credentials(store);
        return false;
    }

    let pair = extract_token_pair(body.as_ref());
    store.persist_tokens(pair.access_token.as_deref(), pair.refresh_token.as_deref());
    true
}

fn clear_credentials(store: &mut CredentialStore) {
    store.delete(ACCESS_TOKEN_COOKIE);
    store.delete(REFRESH_TOKEN_COOKIE);
}
