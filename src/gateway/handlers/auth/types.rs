//! Request/response types for session actions.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Field name to validation messages, ordered for stable output.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Client-side confirmation only; never forwarded to the backend.
    #[serde(rename = "confirmPassword", default, skip_serializing_if = "Option::is_none")]
    pub confirm_password: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// The single result contract every session action reports through.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct AuthActionResult {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

impl AuthActionResult {
    #[must_use]
    pub fn ok(message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
            errors: None,
        }
    }

    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            errors: None,
        }
    }

    #[must_use]
    pub fn invalid(errors: FieldErrors) -> Self {
        Self {
            success: false,
            message: "Validation failed".to_string(),
            data: None,
            errors: Some(errors),
        }
    }
}

/// How a session action concludes: a result payload, or a redirect modeled
/// as data instead of an exception threaded through error channels.
#[derive(Debug)]
pub enum ActionOutcome {
    Completed(StatusCode, AuthActionResult),
    Redirect(&'static str),
}

impl IntoResponse for ActionOutcome {
    fn into_response(self) -> Response {
        match self {
            Self::Completed(status, result) => (status, Json(result)).into_response(),
            Self::Redirect(target) => Redirect::to(target).into_response(),
        }
    }
}
