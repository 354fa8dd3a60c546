//! Register action: validate, create the account, persist the returned
//! token pair so the new hunter lands signed in.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::error;

use super::{
    body_rejects, response_field_errors, response_message, sanitize_data,
    transport_failure_message,
    types::{ActionOutcome, AuthActionResult, RegisterRequest},
    validate::{normalize_email, validate_register},
};
use crate::{
    gateway::GatewayState,
    session::{extract_token_pair, CredentialStore},
};

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created; token cookies are set", body = AuthActionResult),
        (status = 400, description = "Payload failed validation", body = AuthActionResult),
        (status = 409, description = "Backend rejected the registration", body = AuthActionResult)
    ),
    tag = "auth"
)]
pub async fn register(
    Extension(state): Extension<Arc<GatewayState>>,
    headers: HeaderMap,
    Json(payload): Json<RegisterRequest>,
) -> Response {
    let errors = validate_register(&payload);
    if !errors.is_empty() {
        return ActionOutcome::Completed(StatusCode::BAD_REQUEST, AuthActionResult::invalid(errors))
            .into_response();
    }

    // The confirmation field is client-side only and is not forwarded.
    let response = state
        .api
        .post_public(
            "/auth/register",
            &json!({
                "name": payload.name.trim(),
                "email": normalize_email(&payload.email),
                "password": payload.password,
            }),
        )
        .await;

    let response = match response {
        Ok(response) => response,
        Err(err) => {
            error!("Register request failed: {err}");
            return ActionOutcome::Completed(
                StatusCode::BAD_GATEWAY,
                AuthActionResult::failure(transport_failure_message("Registration", &err)),
            )
            .into_response();
        }
    };

    let status = response.status();
    let body: Option<Value> = response.json().await.ok();

    if !status.is_success() || body_rejects(body.as_ref()) {
        let mut result =
            AuthActionResult::failure(response_message(body.as_ref(), "Registration failed"));
        result.errors = response_field_errors(body.as_ref());
        let status = if status.is_success() {
            StatusCode::BAD_REQUEST
        } else {
            status
        };
        return ActionOutcome::Completed(status, result).into_response();
    }

    let mut store = CredentialStore::from_headers(&headers, state.secure_cookies);
    let pair = extract_token_pair(body.as_ref());
    store.persist_tokens(pair.access_token.as_deref(), pair.refresh_token.as_deref());

    let result = AuthActionResult::ok("Registration successful", sanitize_data(body.as_ref()));
    let mut response = ActionOutcome::Completed(StatusCode::OK, result).into_response();
    store.apply_to(response.headers_mut());
    response
}
