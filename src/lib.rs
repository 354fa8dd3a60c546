//! # Arise Session Gateway
//!
//! `arise-gateway` is the session and credential layer of the Arise fitness
//! platform. It sits between browsers and the Arise REST backend and owns
//! everything related to token lifetime:
//!
//! - **Credential storage:** access and refresh tokens live in `HttpOnly`
//!   cookies scoped to the whole site; they are never exposed to client-side
//!   script and only travel via the `Cookie` header.
//! - **Transparent renewal:** outbound backend calls carry the current access
//!   token and survive exactly one silent refresh-and-retry cycle when the
//!   backend answers 401. A rejected refresh token ends the session.
//! - **Route guarding:** every page request is gated before rendering based
//!   on the decoded access token (subject and role). Expired or malformed
//!   tokens degrade to a redirect toward the login page, never an error.
//! - **Session actions:** login, register, password change, and logout
//!   validate input, call the backend, persist credentials, and report
//!   through a single uniform result shape.
//!
//! State is strictly per request: the gateway keeps no session cache, and all
//! cookie reads/writes go through an explicit [`session::CredentialStore`]
//! built from the request at hand.

pub mod cli;
pub mod gateway;
pub mod guard;
pub mod session;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
