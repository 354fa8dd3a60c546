//! Password change action. Unlike login/register this requires a live
//! session, so the call goes through the authenticated wrapper and benefits
//! from the silent refresh-and-retry cycle.

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
    types::{ActionOutcome, AuthActionResult, ChangePasswordRequest},
    validate::validate_change_password,
};
use crate::{
    gateway::GatewayState,
    session::{CredentialStore, RequestOptions},
};

#[utoipa::path(
    patch,
    path = "/api/auth/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password updated", body = AuthActionResult),
        (status = 400, description = "Payload failed validation", body = AuthActionResult),
        (status = 401, description = "Session expired and could not be refreshed", body = AuthActionResult)
    ),
    tag = "auth"
)]
pub async fn change_password(
    Extension(state): Extension<Arc<GatewayState>>,
    headers: HeaderMap,
    Json(payload): Json<ChangePasswordRequest>,
) -> Response {
    let errors = validate_change_password(&payload);
    if !errors.is_empty() {
        return ActionOutcome::Completed(StatusCode::BAD_REQUEST, AuthActionResult::invalid(errors))
            .into_response();
    }

    let mut store = CredentialStore::from_headers(&headers, state.secure_cookies);
    let options = RequestOptions::json(json!({
        "oldPassword": payload.old_password,
        "newPassword": payload.new_password,
    }));

    let outcome = match state
        .api
        .patch(&mut store, "/auth/change-password", &options)
        .await
    {
        Ok(response) => {
            let status = response.status();
            let body: Option<Value> = response.json().await.ok();

            if !status.is_success() || body_rejects(body.as_ref()) {
                let mut result = AuthActionResult::failure(response_message(
                    body.as_ref(),
                    "Password change failed",
                ));
                result.errors = response_field_errors(body.as_ref());
                let status = if status.is_success() {
                    StatusCode::BAD_REQUEST
                } else {
                    status
                };
                ActionOutcome::Completed(status, result)
            } else {
                ActionOutcome::Completed(
                    StatusCode::OK,
                    AuthActionResult::ok("Password updated", sanitize_data(body.as_ref())),
                )
            }
        }
        Err(err) => {
            error!("Password change request failed: {err}");
            ActionOutcome::Completed(
                StatusCode::BAD_GATEWAY,
                AuthActionResult::failure(transport_failure_message("Password change", &err)),
            )
        }
    };

    // The wrapper may have refreshed credentials mid-call; carry the new
    // cookies on whichever response goes out.
    let mut response = outcome.into_response();
    store.apply_to(response.headers_mut());
    response
}
