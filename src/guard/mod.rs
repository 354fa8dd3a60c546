//! Request-time route guard.
//!
//! Gates every page request before any handler runs, based on the decoded
//! access token and the requested path prefix. Decoding failure and refresh
//! failure are treated identically to "no identity": the guard never errors
//! out of these branches, it degrades to a redirect toward the login page.

use axum::{
    extract::{Extension, Request},
    http::header::COOKIE,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use reqwest::Client;
use secrecy::SecretString;
use std::sync::Arc;

use crate::{
    gateway::GatewayState,
    session::{
        decode_identity, refresh_credentials, CredentialStore, Identity, ACCESS_TOKEN_COOKIE,
    },
};

pub const HOME_PATH: &str = "/";
pub const LOGIN_PATH: &str = "/login";
pub const REGISTER_PATH: &str = "/register";

const USER_AREA_PREFIX: &str = "/user";
const ADMIN_AREA_PREFIX: &str = "/admin";

/// Paths passed through with no auth check at all.
const BYPASS_PREFIXES: [&str; 4] = ["/api", "/assets", "/health", "/favicon.ico"];
const ASSET_EXTENSIONS: [&str; 9] = [
    ".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp", ".ico", ".css", ".js",
];

/// Outcome of the guard for one request. The redirect is a first-class
/// variant rather than an error: redirecting is control flow here, not a
/// failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    Redirect(&'static str),
}

/// Pure decision matrix over a path and an already-resolved identity.
#[must_use]
pub fn decide(path: &str, identity: Option<&Identity>) -> RouteDecision {
    if is_auth_page(path) {
        // Authenticated users have no business on the auth forms.
        return match identity {
            Some(_) => RouteDecision::Redirect(HOME_PATH),
            None => RouteDecision::Allow,
        };
    }

    if in_area(path, USER_AREA_PREFIX) && identity.is_none() {
        return RouteDecision::Redirect(LOGIN_PATH);
    }

    if in_area(path, ADMIN_AREA_PREFIX) && !identity.is_some_and(Identity::is_admin) {
        return RouteDecision::Redirect(LOGIN_PATH);
    }

    RouteDecision::Allow
}

/// Resolve the requester's identity, attempting one refresh when the access
/// token does not decode. A failed refresh has already cleared the cookies
/// by the time this returns `None`.
pub async fn resolve_identity(
    store: &mut CredentialStore,
    http: &Client,
    base_url: &str,
    secret: &SecretString,
) -> Option<Identity> {
    if let Some(identity) = current_identity(store, secret) {
        return Some(identity);
    }
    if !refresh_credentials(http, base_url, store).await {
        return None;
    }
    current_identity(store, secret)
}

fn current_identity(store: &CredentialStore, secret: &SecretString) -> Option<Identity> {
    store
        .get(ACCESS_TOKEN_COOKIE)
        .and_then(|token| decode_identity(token, secret))
}

#[must_use]
pub fn is_bypassed(path: &str) -> bool {
    if BYPASS_PREFIXES.iter().any(|prefix| in_area(path, prefix)) {
        return true;
    }
    let lowered = path.to_ascii_lowercase();
    ASSET_EXTENSIONS
        .iter()
        .any(|extension| lowered.ends_with(extension))
}

fn is_auth_page(path: &str) -> bool {
    in_area(path, LOGIN_PATH) || in_area(path, REGISTER_PATH)
}

/// Prefix match on path-segment boundaries: `/user` and `/user/...` are in
/// the `/user` area, `/username` is not.
fn in_area(path: &str, prefix: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Axum middleware wrapping the guard around every incoming request.
///
/// Builds the per-request [`CredentialStore`], resolves identity (refreshing
/// once if needed), rewrites the request's `Cookie` header when a refresh
/// replaced tokens so inner handlers observe the new credentials, and
/// appends any pending `Set-Cookie` values to whichever response goes out.
pub async fn middleware(
    Extension(state): Extension<Arc<GatewayState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if is_bypassed(&path) {
        return next.run(request).await;
    }

    let mut store = CredentialStore::from_headers(request.headers(), state.secure_cookies);
    let identity = resolve_identity(
        &mut store,
        state.api.http(),
        state.api.base_url(),
        &state.jwt_access_secret,
    )
    .await;

    if store.has_pending() {
        match store.cookie_header() {
            Some(value) => {
                request.headers_mut().insert(COOKIE, value);
            }
            None => {
                request.headers_mut().remove(COOKIE);
            }
        }
    }

    let decision = decide(&path, identity.as_ref());
    if let Some(identity) = identity {
        request.extensions_mut().insert(identity);
    }

    let mut response = match decision {
        RouteDecision::Allow => next.run(request).await,
        RouteDecision::Redirect(target) => Redirect::temporary(target).into_response(),
    };
    store.apply_to(response.headers_mut());
    response
}
