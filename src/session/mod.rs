//! Credential lifecycle: cookie storage, token extraction, authenticated
//! backend calls, refresh, and access-token identity decoding.
//!
//! Every type here operates on an explicit per-request context. Nothing in
//! this module reaches for ambient state, which keeps the "no shared state
//! across requests" invariant enforceable and the components testable in
//! isolation.

mod client;
mod extract;
mod identity;
mod refresh;
mod store;

pub use client::{ApiClient, RequestBody, RequestOptions};
pub use extract::{extract_token_pair, TokenPair};
pub use identity::{decode_identity, AccessClaims, Identity, Role};
pub use refresh::refresh_credentials;
pub use store::{
    CredentialStore, ACCESS_TOKEN_COOKIE, ACCESS_TOKEN_MAX_AGE_SECONDS, REFRESH_TOKEN_COOKIE,
    REFRESH_TOKEN_MAX_AGE_SECONDS,
};
