//! Logout action: clear both token cookies and send the user to the login
//! page.

use axum::{
    extract::Extension,
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::types::ActionOutcome;
use crate::{
    gateway::GatewayState,
    guard::LOGIN_PATH,
    session::{CredentialStore, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE},
};

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 303, description = "Credentials cleared; redirected to the login page")
    ),
    tag = "auth"
)]
pub async fn logout(
    Extension(state): Extension<Arc<GatewayState>>,
    headers: HeaderMap,
) -> Response {
    let mut store = CredentialStore::from_headers(&headers, state.secure_cookies);
    // Always clear, even if the cookies were already absent.
    store.delete(ACCESS_TOKEN_COOKIE);
    store.delete(REFRESH_TOKEN_COOKIE);

    let mut response = ActionOutcome::Redirect(LOGIN_PATH).into_response();
    store.apply_to(response.headers_mut());
    response
}
