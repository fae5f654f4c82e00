use std::fmt;

use serde::Serialize;

pub const CLIENT_CREDENTIALS: &str = "client_credentials";

#[derive(Clone, PartialEq, Eq)]
pub struct OAuth2Config {
    pub enabled: bool,
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub grant_type: String,
    pub scope: Option<String>,
}

impl Default for OAuth2Config {
    fn default() -> Self {
        Self {
            enabled: false,
            token_url: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            grant_type: CLIENT_CREDENTIALS.to_string(),
            scope: None,
        }
    }
}

impl fmt::Debug for OAuth2Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuth2Config")
            .field("enabled", &self.enabled)
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("grant_type", &self.grant_type)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Static credentials for one environment, as read at startup.
#[derive(Clone)]
pub struct EnvironmentCredentials {
    pub environment_id: String,
    pub oauth2: OAuth2Config,
    pub api_key: Option<String>,
}

impl fmt::Debug for EnvironmentCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvironmentCredentials")
            .field("environment_id", &self.environment_id)
            .field("oauth2", &self.oauth2)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Outcome of a successful client-credentials exchange.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub access_token: String,
    pub expires_in: i64,
    /// Unix seconds, already reduced by the refresh buffer.
    pub expires_at: i64,
}

impl fmt::Debug for TokenInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenInfo")
            .field("access_token", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Secret-free view of an environment's credential state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenStatus {
    pub environment_id: String,
    pub oauth2_enabled: bool,
    pub has_token: bool,
    pub expires_at: Option<i64>,
    pub has_api_key: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_never_contains_secrets() {
        let creds = EnvironmentCredentials {
            environment_id: "rapid-prod".to_string(),
            oauth2: OAuth2Config {
                enabled: true,
                token_url: "https://auth.example.com/token".to_string(),
                client_id: "client".to_string(),
                client_secret: "very-secret".to_string(),
                ..OAuth2Config::default()
            },
            api_key: Some("api-key-value".to_string()),
        };
        let token = TokenInfo {
            access_token: "eyJhbGciOi".to_string(),
            expires_in: 300,
            expires_at: 240,
        };

        let rendered = format!("{creds:?} {token:?}");
        assert!(!rendered.contains("very-secret"));
        assert!(!rendered.contains("api-key-value"));
        assert!(!rendered.contains("eyJhbGciOi"));
        assert!(rendered.contains("client_credentials"));
    }
}
