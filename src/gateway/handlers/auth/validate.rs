//! Payload validation for session actions. A failed validation never reaches
//! the backend.

use regex::Regex;

use super::types::{ChangePasswordRequest, FieldErrors, LoginRequest, RegisterRequest};

const MIN_PASSWORD_LENGTH: usize = 8;

/// Basic email format check; trimming/lowercasing happens before forwarding.
pub(crate) fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email))
}

/// Normalize an email the way the backend expects it.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub(crate) fn validate_login(payload: &LoginRequest) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if !valid_email(payload.email.trim()) {
        push(&mut errors, "email", "must be a valid email address");
    }
    if payload.password.is_empty() {
        push(&mut errors, "password", "must not be empty");
    }
    errors
}

pub(crate) fn validate_register(payload: &RegisterRequest) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if payload.name.trim().is_empty() {
        push(&mut errors, "name", "must not be empty");
    }
    if !valid_email(payload.email.trim()) {
        push(&mut errors, "email", "must be a valid email address");
    }
    if payload.password.chars().count() < MIN_PASSWORD_LENGTH {
        push(
            &mut errors,
            "password",
            "must be at least 8 characters long",
        );
    }
    if let Some(confirmation) = &payload.confirm_password {
        if confirmation != &payload.password {
            push(&mut errors, "confirmPassword", "must match password");
        }
    }
    errors
}

pub(crate) fn validate_change_password(payload: &ChangePasswordRequest) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if payload.old_password.is_empty() {
        push(&mut errors, "oldPassword", "must not be empty");
    }
    if payload.new_password.chars().count() < MIN_PASSWORD_LENGTH {
        push(
            &mut errors,
            "newPassword",
            "must be at least 8 characters long",
        );
    } else if payload.new_password == payload.old_password {
        push(
            &mut errors,
            "newPassword",
            "must differ from the current password",
        );
    }
    errors
}

fn push(errors: &mut FieldErrors, field: &str, message: &str) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.to_string());
}
