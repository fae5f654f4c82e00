use std::time::Duration;

use reqwest::{header::ACCEPT, Client, StatusCode};
use serde_json::Value;
use tracing::info;

use crate::clock::Clock;

use super::{
    error::AuthError,
    types::{OAuth2Config, TokenInfo},
};

pub const TOKEN_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Tokens are treated as expired this many seconds before the server says so.
pub const EXPIRY_BUFFER_SECS: i64 = 60;
pub const DEFAULT_EXPIRES_IN_SECS: i64 = 300;

pub(super) fn check_config(environment_id: &str, config: &OAuth2Config) -> Result<(), AuthError> {
    if !config.enabled {
        return Err(AuthError::config(environment_id, "OAuth2 not enabled"));
    }
    let missing: Vec<&str> = [
        ("token_url", config.token_url.as_str()),
        ("client_id", config.client_id.as_str()),
        ("client_secret", config.client_secret.as_str()),
    ]
    .into_iter()
    .filter(|(_, value)| value.trim().is_empty())
    .map(|(name, _)| name)
    .collect();

    if !missing.is_empty() {
        return Err(AuthError::config(
            environment_id,
            format!("missing {}", missing.join(", ")),
        ));
    }
    Ok(())
}

/// Client-credentials exchange against `config.token_url`.
pub(super) async fn request_token(
    http: &Client,
    environment_id: &str,
    config: &OAuth2Config,
    clock: &dyn Clock,
) -> Result<TokenInfo, AuthError> {
    check_config(environment_id, config)?;

    let mut form = vec![("grant_type", config.grant_type.as_str())];
    if let Some(scope) = config.scope.as_deref().filter(|s| !s.is_empty()) {
        form.push(("scope", scope));
    }

    info!(environment = %environment_id, url = %config.token_url, "refreshing OAuth2 token");

    let response = http
        .post(&config.token_url)
        .basic_auth(&config.client_id, Some(&config.client_secret))
        .header(ACCEPT, "application/json")
        .form(&form)
        .timeout(TOKEN_REQUEST_TIMEOUT)
        .send()
        .await
        .map_err(|err| AuthError::Transport(err.to_string()))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|err| AuthError::Transport(err.to_string()))?;

    if status != StatusCode::OK {
        return Err(AuthError::TokenRefresh {
            status: status.as_u16(),
            body,
        });
    }

    let parsed: Value = serde_json::from_str(&body).map_err(|_| AuthError::TokenRefresh {
        status: status.as_u16(),
        body: body.clone(),
    })?;

    let access_token = parsed
        .get("access_token")
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AuthError::TokenRefresh {
            status: status.as_u16(),
            body: format!("response has no access_token: {body}"),
        })?
        .to_string();

    let expires_in = parsed
        .get("expires_in")
        .and_then(expires_in_seconds)
        .unwrap_or(DEFAULT_EXPIRES_IN_SECS);

    Ok(TokenInfo {
        access_token,
        expires_in,
        expires_at: clock
            .unix_seconds()
            .saturating_add(expires_in)
            .saturating_sub(EXPIRY_BUFFER_SECS),
    })
}

fn expires_in_seconds(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
