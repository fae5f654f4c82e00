use std::{collections::HashMap, sync::Arc};

use reqwest::Client;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::clock::Clock;

use super::{
    error::AuthError,
    refresh::request_token,
    types::{EnvironmentCredentials, OAuth2Config, TokenInfo, TokenStatus},
};

#[derive(Debug, Default)]
struct CachedToken {
    bearer_token: String,
    expires_at: i64,
}

struct CredentialSlot {
    oauth2: OAuth2Config,
    api_key: Option<String>,
    // Held across check-and-refresh so concurrent callers share one refresh.
    token: Mutex<CachedToken>,
}

/// Per-environment credentials and cached bearer tokens. Tokens live for the
/// lifetime of the process and are never written to disk.
pub struct TokenStore {
    slots: HashMap<String, CredentialSlot>,
    http: Client,
    clock: Arc<dyn Clock>,
}

impl TokenStore {
    pub fn new(credentials: Vec<EnvironmentCredentials>, clock: Arc<dyn Clock>) -> Self {
        let slots = credentials
            .into_iter()
            .map(|creds| {
                (
                    creds.environment_id,
                    CredentialSlot {
                        oauth2: creds.oauth2,
                        api_key: creds.api_key.filter(|key| !key.is_empty()),
                        token: Mutex::new(CachedToken::default()),
                    },
                )
            })
            .collect();

        Self {
            slots,
            http: Client::new(),
            clock,
        }
    }

    pub fn with_http_client(mut self, http: Client) -> Self {
        self.http = http;
        self
    }

    pub fn environments(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.slots.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn oauth2_enabled(&self, environment_id: &str) -> bool {
        self.slots
            .get(environment_id)
            .map(|slot| slot.oauth2.enabled)
            .unwrap_or(false)
    }

    pub fn api_key(&self, environment_id: &str) -> Option<&str> {
        self.slots
            .get(environment_id)
            .and_then(|slot| slot.api_key.as_deref())
    }

    /// Unconditional client-credentials exchange. On failure the cached token
    /// (if any) is left untouched.
    pub async fn refresh(&self, environment_id: &str) -> Result<TokenInfo, AuthError> {
        let slot = self
            .slots
            .get(environment_id)
            .ok_or_else(|| AuthError::config(environment_id, "no credentials configured"))?;
        let mut cached = slot.token.lock().await;
        self.refresh_locked(environment_id, slot, &mut cached).await
    }

    /// Makes sure a usable token is cached, refreshing when none is cached or
    /// `now >= expires_at`. Always true when OAuth2 is disabled.
    pub async fn ensure_valid(&self, environment_id: &str) -> bool {
        let Some(slot) = self
            .slots
            .get(environment_id)
            .filter(|slot| slot.oauth2.enabled)
        else {
            return true;
        };

        let mut cached = slot.token.lock().await;
        if cached.bearer_token.is_empty() {
            info!(environment = %environment_id, "no token cached, refreshing");
        } else if self.clock.unix_seconds() >= cached.expires_at {
            info!(environment = %environment_id, "token expired or expiring soon, refreshing");
        } else {
            return true;
        }

        self.refresh_locked(environment_id, slot, &mut cached)
            .await
            .is_ok()
    }

    /// Currently cached token, even if a refresh attempt has since failed.
    pub async fn cached_token(&self, environment_id: &str) -> Option<String> {
        let slot = self
            .slots
            .get(environment_id)
            .filter(|slot| slot.oauth2.enabled)?;
        let cached = slot.token.lock().await;
        (!cached.bearer_token.is_empty()).then(|| cached.bearer_token.clone())
    }

    pub async fn status(&self, environment_id: &str) -> Option<TokenStatus> {
        let slot = self.slots.get(environment_id)?;
        let cached = slot.token.lock().await;
        let has_token = !cached.bearer_token.is_empty();
        Some(TokenStatus {
            environment_id: environment_id.to_string(),
            oauth2_enabled: slot.oauth2.enabled,
            has_token,
            expires_at: has_token.then_some(cached.expires_at),
            has_api_key: slot.api_key.is_some(),
        })
    }

    async fn refresh_locked(
        &self,
        environment_id: &str,
        slot: &CredentialSlot,
        cached: &mut CachedToken,
    ) -> Result<TokenInfo, AuthError> {
        match request_token(&self.http, environment_id, &slot.oauth2, self.clock.as_ref()).await {
            Ok(info) => {
                cached.bearer_token = info.access_token.clone();
                cached.expires_at = info.expires_at;
                info!(
                    environment = %environment_id,
                    expires_in = info.expires_in,
                    "token refreshed"
                );
                Ok(info)
            }
            Err(err) => {
                error!(environment = %environment_id, "{err}");
                Err(err)
            }
        }
    }

    #[cfg(test)]
    pub(crate) async fn seed_token(&self, environment_id: &str, token: &str, expires_at: i64) {
        if let Some(slot) = self.slots.get(environment_id) {
            let mut cached = slot.token.lock().await;
            cached.bearer_token = token.to_string();
            cached.expires_at = expires_at;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;

    fn store(enabled: bool) -> TokenStore {
        TokenStore::new(
            vec![EnvironmentCredentials {
                environment_id: "rapid-stage".to_string(),
                oauth2: OAuth2Config {
                    enabled,
                    // Unroutable: any attempted exchange fails fast.
                    token_url: "http://127.0.0.1:9/token".to_string(),
                    client_id: "client".to_string(),
                    client_secret: "secret".to_string(),
                    ..OAuth2Config::default()
                },
                api_key: Some(String::new()),
            }],
            Arc::new(FixedClock::at(1_000)),
        )
    }

    #[tokio::test]
    async fn disabled_or_unknown_environments_are_always_valid() {
        let store = store(false);
        assert!(store.ensure_valid("rapid-stage").await);
        assert!(store.ensure_valid("not-configured").await);
        assert_eq!(store.cached_token("rapid-stage").await, None);
    }

    #[tokio::test]
    async fn refresh_of_disabled_environment_is_a_config_error() {
        let store = store(false);
        let err = store.refresh("rapid-stage").await.unwrap_err();
        assert!(matches!(err, AuthError::Config { .. }));

        let err = store.refresh("unknown").await.unwrap_err();
        assert!(err.to_string().contains("no credentials configured"));
    }

    #[tokio::test]
    async fn unexpired_token_is_reused_without_io() {
        let store = store(true);
        store.seed_token("rapid-stage", "cached", 1_001).await;

        assert!(store.ensure_valid("rapid-stage").await);
        assert_eq!(store.cached_token("rapid-stage").await.as_deref(), Some("cached"));
    }

    #[tokio::test]
    async fn failed_refresh_keeps_stale_token() {
        let store = store(true);
        store.seed_token("rapid-stage", "stale", 1_000).await;

        assert!(!store.ensure_valid("rapid-stage").await);
        assert_eq!(store.cached_token("rapid-stage").await.as_deref(), Some("stale"));
    }

    #[tokio::test]
    async fn status_hides_secrets_and_drops_empty_api_keys() {
        let store = store(true);
        store.seed_token("rapid-stage", "cached", 5_000).await;

        let status = store.status("rapid-stage").await.unwrap();
        assert!(status.oauth2_enabled);
        assert!(status.has_token);
        assert_eq!(status.expires_at, Some(5_000));
        assert!(!status.has_api_key);
        assert!(store.status("unknown").await.is_none());
        assert_eq!(store.environments(), vec!["rapid-stage"]);
    }
}
