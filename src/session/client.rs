//! Outbound backend calls with the current access token attached and a
//! single transparent refresh-and-retry on authorization failure.
//!
//! Centralizing attach-and-retry here means every feature behind the gateway
//! gets silent session renewal without duplicating retry logic per call site.

use anyhow::{Context, Result};
use reqwest::{
    header::{AUTHORIZATION, CONTENT_TYPE, COOKIE},
    Client, Method, Response, StatusCode,
};
use serde_json::Value;
use tracing::{info_span, Instrument};

use super::{
    refresh::refresh_credentials,
    store::{CredentialStore, ACCESS_TOKEN_COOKIE},
};

/// One refresh-and-retry cycle per logical request, never more. Prevents an
/// infinite loop against a backend that always rejects.
const MAX_RETRIES: u32 = 1;

/// Caller-supplied request body. Kept clonable so a retried request is
/// re-sent byte-for-byte.
#[derive(Debug, Clone)]
pub enum RequestBody {
    Json(Value),
    Raw { content_type: String, bytes: Vec<u8> },
}

#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Extra headers; a caller-supplied `Authorization` suppresses the
    /// automatic bearer header.
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
}

impl RequestOptions {
    #[must_use]
    pub fn json(body: Value) -> Self {
        Self {
            headers: Vec::new(),
            body: Some(RequestBody::Json(body)),
        }
    }

    #[must_use]
    pub fn raw(content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            headers: Vec::new(),
            body: Some(RequestBody::Raw {
                content_type: content_type.into(),
                bytes,
            }),
        }
    }
}

/// HTTP client bound to the Arise backend base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(base_url: &str) -> Result<Self> {
        let http = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .build()
            .context("Failed to build backend HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    #[must_use]
    pub fn http(&self) -> &Client {
        &self.http
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn endpoint_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Issue an authenticated request.
    ///
    /// The access token is read from `store` and attached as both a bearer
    /// header (unless the caller set one) and an `accessToken` cookie, for
    /// backends that read either. On 401 the stored credentials are refreshed
    /// once and the original request re-issued; if the refresh is rejected or
    /// the retry fails again, the 401 goes back to the caller unparsed.
    ///
    /// # Errors
    /// Returns an error only for transport failures; non-2xx statuses are
    /// returned as responses for the caller to interpret.
    pub async fn request(
        &self,
        store: &mut CredentialStore,
        method: Method,
        path: &str,
        options: &RequestOptions,
    ) -> Result<Response> {
        let url = self.endpoint_url(path);
        let mut attempt: u32 = 0;
        loop {
            let response = self.send(store, method.clone(), &url, options).await?;
            if response.status() != StatusCode::UNAUTHORIZED || attempt >= MAX_RETRIES {
                return Ok(response);
            }
            if !refresh_credentials(&self.http, &self.base_url, store).await {
                return Ok(response);
            }
            attempt += 1;
        }
    }

    /// Unauthenticated call for flows that precede a session (login,
    /// register). No bearer attachment, no refresh-and-retry.
    ///
    /// # Errors
    /// Returns an error only for transport failures.
    pub async fn post_public(&self, path: &str, body: &Value) -> Result<Response> {
        let url = self.endpoint_url(path);
        let span = info_span!(
            "api.request",
            http.method = "POST",
            url = %url
        );
        self.http
            .post(&url)
            .json(body)
            .send()
            .instrument(span)
            .await
            .context("Backend request failed")
    }

    /// # Errors
    /// See [`ApiClient::request`].
    pub async fn get(&self, store: &mut CredentialStore, path: &str) -> Result<Response> {
        self.request(store, Method::GET, path, &RequestOptions::default())
            .await
    }

    /// # Errors
    /// See [`ApiClient::request`].
    pub async fn post(
        &self,
        store: &mut CredentialStore,
        path: &str,
        options: &RequestOptions,
    ) -> Result<Response> {
        self.request(store, Method::POST, path, options).await
    }

    /// # Errors
    /// See [`ApiClient::request`].
    pub async fn put(
        &self,
        store: &mut CredentialStore,
        path: &str,
        options: &RequestOptions,
    ) -> Result<Response> {
        self.request(store, Method::PUT, path, options).await
    }

    /// # Errors
    /// See [`ApiClient::request`].
    pub async fn patch(
        &self,
        store: &mut CredentialStore,
        path: &str,
        options: &RequestOptions,
    ) -> Result<Response> {
        self.request(store, Method::PATCH, path, options).await
    }

    /// # Errors
    /// See [`ApiClient::request`].
    pub async fn delete(
        &self,
        store: &mut CredentialStore,
        path: &str,
        options: &RequestOptions,
    ) -> Result<Response> {
        self.request(store, Method::DELETE, path, options).await
    }

    async fn send(
        &self,
        store: &CredentialStore,
        method: Method,
        url: &str,
        options: &RequestOptions,
    ) -> Result<Response> {
        let span = info_span!(
            "api.request",
            http.method = %method,
            url = %url
        );

        let mut request = self.http.request(method, url);

        let caller_set_authorization = options
            .headers
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case("authorization"));

        if let Some(token) = store.get(ACCESS_TOKEN_COOKIE) {
            if !caller_set_authorization {
                request = request.header(AUTHORIZATION, format!("Bearer {token}"));
            }
            // Some backend routes read the cookie instead of the bearer header.
            request = request.header(COOKIE, format!("{ACCESS_TOKEN_COOKIE}={token}"));
        }

        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        match &options.body {
            Some(RequestBody::Json(value)) => {
                request = request.json(value);
            }
            Some(RequestBody::Raw {
                content_type,
                bytes,
            }) => {
                request = request
                    .header(CONTENT_TYPE, content_type.as_str())
                    .body(bytes.clone());
            }
            None => {}
        }

        request
            .send()
            .instrument(span)
            .await
            .context("Backend request failed")
    }
}
