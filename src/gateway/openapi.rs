use super::handlers::{auth, health, profile};
use utoipa::openapi::{InfoBuilder, License, OpenApiBuilder, Tag};
use utoipa_axum::{router::OpenApiRouter, routes};

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    // Reuse the same router wiring and only return the generated OpenAPI spec.
    let (_router, openapi) = api_router().split_for_parts();
    openapi
}

/// Build the router that also drives the `OpenAPI` document.
///
/// Add new endpoints here via `.routes(routes!(...))` so they are both served
/// and included in the generated spec. Page stubs and the `PUT` profile
/// variant are wired outside and intentionally not documented.
pub(crate) fn api_router() -> OpenApiRouter {
    OpenApiRouter::with_openapi(cargo_openapi())
        .routes(routes!(health::health))
        .routes(routes!(auth::login::login))
        .routes(routes!(auth::register::register))
        .routes(routes!(auth::password::change_password))
        .routes(routes!(auth::logout::logout))
        .routes(routes!(profile::profile, profile::update_profile))
}

fn cargo_openapi() -> utoipa::openapi::OpenApi {
    // Use Cargo.toml metadata instead of the utoipa defaults.
    let mut info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(optional_str(env!("CARGO_PKG_DESCRIPTION")))
        .build();

    info.license = optional_str(env!("CARGO_PKG_LICENSE")).map(License::new);

    let mut auth_tag = Tag::new("auth");
    auth_tag.description = Some("Session actions: login, register, password change".to_string());

    let mut profile_tag = Tag::new("profile");
    profile_tag.description = Some("Authenticated self-service proxied to the backend".to_string());

    let mut health_tag = Tag::new("health");
    health_tag.description = Some("Gateway liveness".to_string());

    OpenApiBuilder::new()
        .info(info)
        .tags(Some(vec![auth_tag, profile_tag, health_tag]))
        .build()
}

fn optional_str(value: &'static str) -> Option<&'static str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}
