//! Authenticated self-service endpoints, proxied to the backend through the
//! fetch wrapper so an expired access token is renewed transparently.

use axum::{
    body::Bytes,
    extract::Extension,
    http::{header::CONTENT_TYPE, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::error;

use super::auth::{transport_failure_message, types::AuthActionResult};
use crate::{
    gateway::GatewayState,
    session::{CredentialStore, RequestOptions},
};

#[utoipa::path(
    get,
    path = "/user/profile",
    responses(
        (status = 200, description = "Current hunter profile from the backend"),
        (status = 401, description = "Session expired and could not be refreshed")
    ),
    tag = "profile"
)]
pub async fn profile(
    Extension(state): Extension<Arc<GatewayState>>,
    headers: HeaderMap,
) -> Response {
    let mut store = CredentialStore::from_headers(&headers, state.secure_cookies);
    forward(
        &state,
        &mut store,
        Method::GET,
        "/auth/me",
        RequestOptions::default(),
    )
    .await
}

#[utoipa::path(
    patch,
    path = "/user/profile",
    request_body = Vec<u8>,
    responses(
        (status = 200, description = "Profile updated"),
        (status = 401, description = "Session expired and could not be refreshed")
    ),
    tag = "profile"
)]
pub async fn update_profile(
    Extension(state): Extension<Arc<GatewayState>>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let mut store = CredentialStore::from_headers(&headers, state.secure_cookies);
    // Multipart form bodies pass through byte-for-byte with their original
    // content type; only credentials are added on the way out.
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();
    let options = RequestOptions::raw(content_type, body.to_vec());
    forward(
        &state,
        &mut store,
        method,
        "/auth/update-my-profile",
        options,
    )
    .await
}

/// Forward one request to the backend and mirror its status and JSON body,
/// carrying any refreshed cookies on the response.
async fn forward(
    state: &GatewayState,
    store: &mut CredentialStore,
    method: Method,
    path: &str,
    options: RequestOptions,
) -> Response {
    let mut response = match state.api.request(store, method, path, &options).await {
        Ok(backend) => {
            let status = backend.status();
            let body: Option<Value> = backend.json().await.ok();
            match body {
                Some(value) => (status, Json(value)).into_response(),
                None => status.into_response(),
            }
        }
        Err(err) => {
            error!("Backend proxy request failed: {err}");
            (
                StatusCode::BAD_GATEWAY,
                Json(AuthActionResult::failure(transport_failure_message(
                    "Profile request",
                    &err,
                ))),
            )
                .into_response()
        }
    };
    store.apply_to(response.headers_mut());
    response
}
