//! Session actions: login, register, password change, logout.
//!
//! Every action validates its payload before any network call, talks to the
//! backend, persists credentials on the happy path, and funnels all failures
//! into the uniform [`types::AuthActionResult`] shape so the UI has exactly
//! one error contract to handle.

pub mod login;
pub mod logout;
pub mod password;
pub mod register;
pub mod types;
pub mod validate;

use serde_json::Value;

use self::types::FieldErrors;

/// Human-readable message from an inconsistent backend error envelope:
/// `error.message` wins over a top-level `message`.
pub(crate) fn response_message(body: Option<&Value>, fallback: &str) -> String {
    body.and_then(|body| {
        body.get("error")
            .and_then(|error| error.get("message"))
            .and_then(Value::as_str)
            .or_else(|| body.get("message").and_then(Value::as_str))
    })
    .map_or_else(|| fallback.to_string(), str::to_string)
}

/// An explicit `success: false` in the body marks failure even on a 2xx
/// status.
pub(crate) fn body_rejects(body: Option<&Value>) -> bool {
    body.and_then(|body| body.get("success"))
        .and_then(Value::as_bool)
        == Some(false)
}

/// Field-level detail from a backend body, when it supplies any. Values may
/// be a single string or an array of strings per field.
pub(crate) fn response_field_errors(body: Option<&Value>) -> Option<FieldErrors> {
    let errors = body?.get("errors")?.as_object()?;
    let mut fields = FieldErrors::new();
    for (name, value) in errors {
        let messages: Vec<String> = match value {
            Value::String(message) => vec![message.clone()],
            Value::Array(items) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        };
        if !messages.is_empty() {
            fields.insert(name.clone(), messages);
        }
    }
    if fields.is_empty() {
        None
    } else {
        Some(fields)
    }
}

/// Payload echoed back to the UI. Tokens never reach client-side script, so
/// any `tokens` key is stripped before the data leaves the gateway.
pub(crate) fn sanitize_data(body: Option<&Value>) -> Option<Value> {
    let data = body?.get("data").cloned()?;
    match data {
        Value::Object(mut map) => {
            map.remove("tokens");
            Some(Value::Object(map))
        }
        other => Some(other),
    }
}

/// Transport failure message: detailed in development, generic in production.
pub(crate) fn transport_failure_message(action: &str, err: &anyhow::Error) -> String {
    if cfg!(debug_assertions) {
        format!("{action} failed: {err}")
    } else {
        "Something went wrong. Please try again.".to_string()
    }
}
