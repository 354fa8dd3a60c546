//! End-to-end tests for the gateway.
//!
//! Each test wires the production router against an in-process mock of the
//! Arise backend (axum on an ephemeral port) and drives it with a real HTTP
//! client, with redirects disabled so guard decisions stay observable. The
//! mock counts calls per endpoint so retry and short-circuit invariants can
//! be asserted exactly.

use anyhow::{Context, Result};
use arise_gateway::{
    gateway::{app, GatewayState},
    session::{AccessClaims, ApiClient, Role},
};
use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use jsonwebtoken::{encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::SecretString;
use serde_json::{json, Value};
use std::{
    net::SocketAddr,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::{SystemTime, UNIX_EPOCH},
};
use tokio::net::TcpListener;

const JWT_SECRET: &str = "gateway-test-secret";
const REFRESH_TOKEN: &str = "refresh-token-1";

#[derive(Clone, Copy, PartialEq, Eq)]
enum RefreshMode {
    /// Answer with a new access token only, leaving the refresh token alone.
    RotateAccess,
    /// Reject every refresh attempt.
    Reject,
}

struct MockState {
    refresh_mode: RefreshMode,
    me_always_unauthorized: bool,
    login_calls: AtomicUsize,
    register_calls: AtomicUsize,
    refresh_calls: AtomicUsize,
    me_calls: AtomicUsize,
    change_password_calls: AtomicUsize,
}

impl MockState {
    fn new(refresh_mode: RefreshMode) -> Self {
        Self {
            refresh_mode,
            me_always_unauthorized: false,
            login_calls: AtomicUsize::new(0),
            register_calls: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
            me_calls: AtomicUsize::new(0),
            change_password_calls: AtomicUsize::new(0),
        }
    }

    fn with_me_always_unauthorized(mut self) -> Self {
        self.me_always_unauthorized = true;
        self
    }
}

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

fn make_token(role: Role, exp_offset: i64) -> String {
    let issued_at = now_unix();
    let claims = AccessClaims {
        sub: "user-1".to_string(),
        role,
        iat: issued_at,
        exp: issued_at + exp_offset,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode test token")
}

fn bearer_is_valid(headers: &HeaderMap) -> bool {
    let Some(token) = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
    else {
        return false;
    };
    decode_claims(token).is_some()
}

fn decode_claims(token: &str) -> Option<AccessClaims> {
    let validation = Validation::new(Algorithm::HS256);
    jsonwebtoken::decode::<AccessClaims>(
        token,
        &DecodingKey::from_secret(JWT_SECRET.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .ok()
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let header = headers.get("cookie")?.to_str().ok()?;
    for pair in header.split(';') {
        let mut parts = pair.trim().splitn(2, '=');
        if parts.next() == Some(name) {
            return parts.next().map(str::to_string);
        }
    }
    None
}

async fn mock_login(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> impl IntoResponse {
    state.login_calls.fetch_add(1, Ordering::SeqCst);
    let email = body.get("email").and_then(Value::as_str);
    let password = body.get("password").and_then(Value::as_str);
    if email == Some("hunter@example.com") && password == Some("arise1234") {
        (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "Logged in",
                "data": {
                    "user": {"id": "user-1", "name": "Hunter", "role": "USER"},
                    "tokens": {
                        "accessToken": make_token(Role::User, 3600),
                        "refreshToken": REFRESH_TOKEN,
                    },
                },
            })),
        )
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"success": false, "message": "Invalid credentials"})),
        )
    }
}

async fn mock_register(
    State(state): State<Arc<MockState>>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    state.register_calls.fetch_add(1, Ordering::SeqCst);
    let name = body.get("name").and_then(Value::as_str).unwrap_or("hunter");
    (
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Account created",
            "data": {
                "user": {"id": "user-2", "name": name, "role": "USER"},
                "tokens": {
                    "accessToken": make_token(Role::User, 3600),
                    "refreshToken": REFRESH_TOKEN,
                },
            },
        })),
    )
}

async fn mock_refresh(State(state): State<Arc<MockState>>, headers: HeaderMap) -> impl IntoResponse {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);
    let presented = cookie_value(&headers, "refreshToken");
    if state.refresh_mode == RefreshMode::Reject || presented.as_deref() != Some(REFRESH_TOKEN) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"success": false, "message": "Refresh token expired"})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "data": {
                "tokens": {"accessToken": make_token(Role::User, 3600)},
            },
        })),
    )
}

async fn mock_me(State(state): State<Arc<MockState>>, headers: HeaderMap) -> impl IntoResponse {
    state.me_calls.fetch_add(1, Ordering::SeqCst);
    if state.me_always_unauthorized || !bearer_is_valid(&headers) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"success": false, "message": "Unauthorized"})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "data": {"user": {"id": "user-1", "name": "Hunter", "rank": "E"}},
        })),
    )
}

async fn mock_change_password(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    state.change_password_calls.fetch_add(1, Ordering::SeqCst);
    if !bearer_is_valid(&headers) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"success": false, "message": "Unauthorized"})),
        );
    }
    if body.get("oldPassword").and_then(Value::as_str) != Some("arise1234") {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"success": false, "error": {"message": "Old password is wrong"}})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({"success": true, "message": "Password changed"})),
    )
}

fn mock_router(state: Arc<MockState>) -> Router {
    Router::new()
        .route("/auth/login", post(mock_login))
        .route("/auth/register", post(mock_register))
        .route("/auth/refresh-token", post(mock_refresh))
        .route("/auth/me", get(mock_me))
        .route("/auth/change-password", patch(mock_change_password))
        .with_state(state)
}

async fn spawn(router: Router) -> Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .context("failed to bind test listener")?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router.into_make_service()).await;
    });
    Ok(addr)
}

struct Harness {
    client: reqwest::Client,
    gateway_url: String,
    backend: Arc<MockState>,
}

impl Harness {
    async fn new(backend: MockState) -> Result<Self> {
        let backend = Arc::new(backend);
        let backend_addr = spawn(mock_router(backend.clone())).await?;

        let api = ApiClient::new(&format!("http://{backend_addr}"))?;
        let state = Arc::new(GatewayState::new(
            api,
            SecretString::from(JWT_SECRET.to_string()),
            false,
        ));
        let gateway_addr = spawn(app(state)).await?;

        // Redirects stay visible so guard decisions can be asserted.
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("failed to build test client")?;

        Ok(Self {
            client,
            gateway_url: format!("http://{gateway_addr}"),
            backend,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.gateway_url)
    }
}

fn set_cookies(response: &reqwest::Response) -> Vec<String> {
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|value| value.to_str().ok())
        .map(str::to_string)
        .collect()
}

fn location(response: &reqwest::Response) -> Option<&str> {
    response
        .headers()
        .get("location")
        .and_then(|value| value.to_str().ok())
}

#[tokio::test]
async fn login_sets_token_cookies() -> Result<()> {
    let harness = Harness::new(MockState::new(RefreshMode::RotateAccess)).await?;

    let response = harness
        .client
        .post(harness.url("/api/auth/login"))
        .json(&json!({"email": "hunter@example.com", "password": "arise1234"}))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let cookies = set_cookies(&response);
    let access = cookies
        .iter()
        .find(|cookie| cookie.starts_with("accessToken="))
        .context("missing accessToken cookie")?;
    assert!(access.contains("HttpOnly"));
    assert!(access.contains("SameSite=Lax"));
    assert!(access.contains("Max-Age=3600"));
    let refresh = cookies
        .iter()
        .find(|cookie| cookie.starts_with("refreshToken="))
        .context("missing refreshToken cookie")?;
    assert!(refresh.contains("Max-Age=2592000"));

    let body: Value = response.json().await?;
    assert_eq!(body.get("success"), Some(&json!(true)));
    // Tokens never reach the UI payload.
    assert!(body
        .get("data")
        .and_then(|data| data.get("tokens"))
        .is_none());
    assert!(body
        .get("data")
        .and_then(|data| data.get("user"))
        .is_some());
    Ok(())
}

#[tokio::test]
async fn login_failure_surfaces_backend_message() -> Result<()> {
    let harness = Harness::new(MockState::new(RefreshMode::RotateAccess)).await?;

    let response = harness
        .client
        .post(harness.url("/api/auth/login"))
        .json(&json!({"email": "hunter@example.com", "password": "wrong-password"}))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookies(&response).is_empty());
    let body: Value = response.json().await?;
    assert_eq!(body.get("success"), Some(&json!(false)));
    assert_eq!(body.get("message"), Some(&json!("Invalid credentials")));
    Ok(())
}

#[tokio::test]
async fn register_validation_short_circuits_without_network() -> Result<()> {
    let harness = Harness::new(MockState::new(RefreshMode::RotateAccess)).await?;

    let response = harness
        .client
        .post(harness.url("/api/auth/register"))
        .json(&json!({"name": "Jin", "email": "not-an-email", "password": "arise1234"}))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await?;
    assert_eq!(body.get("success"), Some(&json!(false)));
    assert_eq!(body.get("message"), Some(&json!("Validation failed")));
    assert!(body
        .get("errors")
        .and_then(|errors| errors.get("email"))
        .is_some());
    assert_eq!(harness.backend.register_calls.load(Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test]
async fn register_persists_tokens() -> Result<()> {
    let harness = Harness::new(MockState::new(RefreshMode::RotateAccess)).await?;

    let response = harness
        .client
        .post(harness.url("/api/auth/register"))
        .json(&json!({
            "name": "Jin",
            "email": "jin@example.com",
            "password": "arise1234",
            "confirmPassword": "arise1234",
        }))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let cookies = set_cookies(&response);
    assert!(cookies.iter().any(|c| c.starts_with("accessToken=")));
    assert!(cookies.iter().any(|c| c.starts_with("refreshToken=")));
    assert_eq!(harness.backend.register_calls.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn admin_area_redirects_anonymous_to_login() -> Result<()> {
    let harness = Harness::new(MockState::new(RefreshMode::Reject)).await?;

    let response = harness.client.get(harness.url("/admin")).send().await?;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), Some("/login"));
    // No refresh token was present, so no refresh attempt was made.
    assert_eq!(harness.backend.refresh_calls.load(Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test]
async fn admin_area_rejects_non_admin_role() -> Result<()> {
    let harness = Harness::new(MockState::new(RefreshMode::RotateAccess)).await?;

    let token = make_token(Role::User, 3600);
    let response = harness
        .client
        .get(harness.url("/admin"))
        .header("Cookie", format!("accessToken={token}"))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), Some("/login"));
    Ok(())
}

#[tokio::test]
async fn admin_area_allows_admin_role() -> Result<()> {
    let harness = Harness::new(MockState::new(RefreshMode::RotateAccess)).await?;

    let token = make_token(Role::Admin, 3600);
    let response = harness
        .client
        .get(harness.url("/admin"))
        .header("Cookie", format!("accessToken={token}"))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    assert_eq!(body.get("role"), Some(&json!("ADMIN")));
    Ok(())
}

#[tokio::test]
async fn login_page_redirects_authenticated_users_home() -> Result<()> {
    let harness = Harness::new(MockState::new(RefreshMode::RotateAccess)).await?;

    let token = make_token(Role::User, 3600);
    let response = harness
        .client
        .get(harness.url("/login"))
        .header("Cookie", format!("accessToken={token}"))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), Some("/"));
    Ok(())
}

#[tokio::test]
async fn expired_token_with_failing_refresh_redirects_and_clears() -> Result<()> {
    let harness = Harness::new(MockState::new(RefreshMode::Reject)).await?;

    let expired = make_token(Role::User, -3600);
    let response = harness
        .client
        .get(harness.url("/user/profile"))
        .header(
            "Cookie",
            format!("accessToken={expired}; refreshToken={REFRESH_TOKEN}"),
        )
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), Some("/login"));
    assert_eq!(harness.backend.refresh_calls.load(Ordering::SeqCst), 1);

    // Both cookies are expired out, regardless of their prior value.
    let cookies = set_cookies(&response);
    assert!(cookies
        .iter()
        .any(|c| c.starts_with("accessToken=;") && c.contains("Max-Age=0")));
    assert!(cookies
        .iter()
        .any(|c| c.starts_with("refreshToken=;") && c.contains("Max-Age=0")));
    Ok(())
}

#[tokio::test]
async fn expired_token_refreshes_and_preserves_refresh_cookie() -> Result<()> {
    let harness = Harness::new(MockState::new(RefreshMode::RotateAccess)).await?;

    let expired = make_token(Role::User, -3600);
    let response = harness
        .client
        .get(harness.url("/user/home"))
        .header(
            "Cookie",
            format!("accessToken={expired}; refreshToken={REFRESH_TOKEN}"),
        )
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(harness.backend.refresh_calls.load(Ordering::SeqCst), 1);
    // Only the access token was rotated; the stored refresh token is untouched.
    let cookies = set_cookies(&response);
    let body: Value = response.json().await?;
    assert_eq!(body.get("authenticated"), Some(&json!(true)));

    assert!(cookies.iter().any(|c| c.starts_with("accessToken=ey")));
    assert!(!cookies.iter().any(|c| c.starts_with("refreshToken=")));
    Ok(())
}

#[tokio::test]
async fn wrapper_retries_exactly_once_on_persistent_401() -> Result<()> {
    let harness = Harness::new(
        MockState::new(RefreshMode::RotateAccess).with_me_always_unauthorized(),
    )
    .await?;

    let token = make_token(Role::User, 3600);
    let response = harness
        .client
        .get(harness.url("/user/profile"))
        .header(
            "Cookie",
            format!("accessToken={token}; refreshToken={REFRESH_TOKEN}"),
        )
        .send()
        .await?;

    // The backend rejected both attempts; the 401 is handed through.
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(harness.backend.me_calls.load(Ordering::SeqCst), 2);
    assert_eq!(harness.backend.refresh_calls.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn profile_proxies_backend_payload() -> Result<()> {
    let harness = Harness::new(MockState::new(RefreshMode::RotateAccess)).await?;

    let token = make_token(Role::User, 3600);
    let response = harness
        .client
        .get(harness.url("/user/profile"))
        .header("Cookie", format!("accessToken={token}"))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    assert_eq!(
        body.get("data")
            .and_then(|data| data.get("user"))
            .and_then(|user| user.get("rank")),
        Some(&json!("E"))
    );
    assert_eq!(harness.backend.me_calls.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn change_password_survives_expired_access_token() -> Result<()> {
    let harness = Harness::new(MockState::new(RefreshMode::RotateAccess)).await?;

    let expired = make_token(Role::User, -3600);
    let response = harness
        .client
        .patch(harness.url("/api/auth/change-password"))
        .header(
            "Cookie",
            format!("accessToken={expired}; refreshToken={REFRESH_TOKEN}"),
        )
        .json(&json!({"oldPassword": "arise1234", "newPassword": "levelup5678"}))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    // The rotated access token is carried on the action response.
    let cookies = set_cookies(&response);
    let body: Value = response.json().await?;
    assert_eq!(body.get("success"), Some(&json!(true)));
    // First attempt 401s on the expired token, then the refreshed retry lands.
    assert_eq!(
        harness.backend.change_password_calls.load(Ordering::SeqCst),
        2
    );
    assert_eq!(harness.backend.refresh_calls.load(Ordering::SeqCst), 1);

    assert!(cookies.iter().any(|c| c.starts_with("accessToken=ey")));
    Ok(())
}

#[tokio::test]
async fn change_password_validation_rejects_reused_password() -> Result<()> {
    let harness = Harness::new(MockState::new(RefreshMode::RotateAccess)).await?;

    let response = harness
        .client
        .patch(harness.url("/api/auth/change-password"))
        .json(&json!({"oldPassword": "arise1234", "newPassword": "arise1234"}))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await?;
    assert!(body
        .get("errors")
        .and_then(|errors| errors.get("newPassword"))
        .is_some());
    assert_eq!(
        harness.backend.change_password_calls.load(Ordering::SeqCst),
        0
    );
    Ok(())
}

#[tokio::test]
async fn logout_clears_credentials_and_redirects() -> Result<()> {
    let harness = Harness::new(MockState::new(RefreshMode::RotateAccess)).await?;

    let token = make_token(Role::User, 3600);
    let response = harness
        .client
        .post(harness.url("/api/auth/logout"))
        .header(
            "Cookie",
            format!("accessToken={token}; refreshToken={REFRESH_TOKEN}"),
        )
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/login"));
    let cookies = set_cookies(&response);
    assert!(cookies
        .iter()
        .any(|c| c.starts_with("accessToken=;") && c.contains("Max-Age=0")));
    assert!(cookies
        .iter()
        .any(|c| c.starts_with("refreshToken=;") && c.contains("Max-Age=0")));
    Ok(())
}

#[tokio::test]
async fn health_bypasses_the_guard() -> Result<()> {
    let harness = Harness::new(MockState::new(RefreshMode::Reject)).await?;

    let expired = make_token(Role::User, -3600);
    let response = harness
        .client
        .get(harness.url("/health"))
        .header(
            "Cookie",
            format!("accessToken={expired}; refreshToken={REFRESH_TOKEN}"),
        )
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    // Bypassed paths never trigger identity resolution or refresh.
    assert_eq!(harness.backend.refresh_calls.load(Ordering::SeqCst), 0);
    let body: Value = response.json().await?;
    assert_eq!(body.get("name"), Some(&json!("arise-gateway")));
    Ok(())
}
