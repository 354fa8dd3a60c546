//! HTTP surface of the gateway: router assembly, shared state, and server
//! startup.

use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::{Extension, MatchedPath},
    http::{HeaderName, HeaderValue, Request},
    middleware,
    routing::{get, options, put},
    Router,
};
use secrecy::SecretString;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;
use utoipa_swagger_ui::SwaggerUi;

use crate::{cli::globals::GlobalArgs, guard, session::ApiClient};

pub(crate) mod handlers;
mod openapi;

pub use openapi::openapi;

/// Configuration shared by the guard and the handlers. Holds no session
/// state; everything session-scoped lives in the request's cookies.
pub struct GatewayState {
    pub api: ApiClient,
    pub jwt_access_secret: SecretString,
    pub secure_cookies: bool,
}

impl GatewayState {
    #[must_use]
    pub fn new(api: ApiClient, jwt_access_secret: SecretString, secure_cookies: bool) -> Self {
        Self {
            api,
            jwt_access_secret,
            secure_cookies,
        }
    }
}

/// Start the gateway server.
///
/// # Errors
/// Returns an error if the backend client cannot be built or the listener
/// fails to bind.
pub async fn new(port: u16, globals: &GlobalArgs) -> Result<()> {
    let api = ApiClient::new(&globals.api_url)?;
    let state = Arc::new(GatewayState::new(
        api,
        globals.jwt_access_secret.clone(),
        globals.secure_cookies,
    ));

    let listener = TcpListener::bind(format!("::0:{port}"))
        .await
        .with_context(|| format!("Failed to bind port {port}"))?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app(state).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Build the full router with middleware layers applied.
///
/// Factored out of [`new`] so tests can drive the exact production router
/// against an ephemeral listener.
#[must_use]
pub fn app(state: Arc<GatewayState>) -> Router {
    let (router, api_docs) = openapi::api_router().split_for_parts();

    router
        .merge(SwaggerUi::new("/api/docs").url("/api/openapi.json", api_docs))
        .route("/health", options(handlers::health::health))
        // PUT mirrors the documented PATCH; both forward to the backend.
        .route("/user/profile", put(handlers::profile::update_profile))
        .route("/", get(handlers::pages::home))
        .route(guard::LOGIN_PATH, get(handlers::pages::login_page))
        .route(guard::REGISTER_PATH, get(handlers::pages::register_page))
        .route("/user/home", get(handlers::pages::user_home))
        .route("/admin", get(handlers::pages::admin_home))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &Request<Body>| {
                        HeaderValue::from_str(Ulid::new().to_string().as_str()).ok()
                    },
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(state))
                .layer(middleware::from_fn(guard::middleware)),
        )
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Gracefully shutdown");
}
