use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("OAuth2 configuration error for {environment}: {reason}")]
    Config { environment: String, reason: String },

    #[error("Token refresh failed: {status} - {body}")]
    TokenRefresh { status: u16, body: String },

    #[error("Error refreshing token: {0}")]
    Transport(String),
}

impl AuthError {
    pub(crate) fn config(environment: &str, reason: impl Into<String>) -> Self {
        Self::Config {
            environment: environment.to_string(),
            reason: reason.into(),
        }
    }
}
