//! Authenticated session state.

/// Credentials captured from a successful login.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionToken {
    /// `name=value` pairs from `Set-Cookie`, joined for a `Cookie` header
    pub cookie: Option<String>,
    /// `access_token` from the login body, sent as a bearer token
    pub bearer: Option<String>,
}

/// Connection details plus whatever the login handed back.
#[derive(Debug, Clone)]
pub struct Session {
    base_url: String,
    username: String,
    password: String,
    token: Option<SessionToken>,
}

impl Session {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            username: username.into(),
            password: password.into(),
            token: None,
        }
    }

    pub fn from_config(config: &probe_core::Config) -> Self {
        Self::new(config.base_url(), &config.username, &config.password)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// Join a path onto the base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn token(&self) -> Option<&SessionToken> {
        self.token.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub(crate) fn set_token(&mut self, token: SessionToken) {
        self.token = Some(token);
    }
}
