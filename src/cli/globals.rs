use secrecy::SecretString;

/// Validated runtime configuration shared by the server action.
#[derive(Clone)]
pub struct GlobalArgs {
    /// Base URL of the Arise backend API.
    pub api_url: String,
    /// HS256 secret used only to verify access tokens locally.
    pub jwt_access_secret: SecretString,
    /// Mark written cookies `Secure`; on whenever the gateway is behind HTTPS.
    pub secure_cookies: bool,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(api_url: String, jwt_access_secret: SecretString, secure_cookies: bool) -> Self {
        Self {
            api_url,
            jwt_access_secret,
            secure_cookies,
        }
    }
}

impl std::fmt::Debug for GlobalArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalArgs")
            .field("api_url", &self.api_url)
            .field("jwt_access_secret", &"***")
            .field("secure_cookies", &self.secure_cookies)
            .finish()
    }
}
