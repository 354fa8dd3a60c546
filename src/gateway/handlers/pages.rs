//! Thin page stubs behind the route guard.
//!
//! The Arise UI renders client-side; these endpoints only expose the state
//! the guard resolved for the request, so the guard has real routes to
//! protect.

use axum::{extract::Extension, response::Json};
use serde::Serialize;

use crate::session::{Identity, Role};

#[derive(Debug, Serialize)]
pub struct PageView {
    page: &'static str,
    authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<Role>,
}

impl PageView {
    fn new(page: &'static str, identity: Option<Identity>) -> Self {
        Self {
            page,
            authenticated: identity.is_some(),
            subject: identity.as_ref().map(|identity| identity.subject.clone()),
            role: identity.map(|identity| identity.role),
        }
    }
}

pub async fn home(identity: Option<Extension<Identity>>) -> Json<PageView> {
    Json(PageView::new("home", identity.map(|Extension(id)| id)))
}

pub async fn login_page(identity: Option<Extension<Identity>>) -> Json<PageView> {
    Json(PageView::new("login", identity.map(|Extension(id)| id)))
}

pub async fn register_page(identity: Option<Extension<Identity>>) -> Json<PageView> {
    Json(PageView::new("register", identity.map(|Extension(id)| id)))
}

pub async fn user_home(identity: Option<Extension<Identity>>) -> Json<PageView> {
    Json(PageView::new("user-home", identity.map(|Extension(id)| id)))
}

pub async fn admin_home(identity: Option<Extension<Identity>>) -> Json<PageView> {
    Json(PageView::new("admin-home", identity.map(|Extension(id)| id)))
}
