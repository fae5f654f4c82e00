use std::{collections::BTreeMap, sync::Arc};

use reqwest::header::AUTHORIZATION;
use tracing::{debug, warn};

use super::store::TokenStore;

pub type HeaderList = Vec<(String, String)>;

pub const API_KEY_HEADER: &str = "x-api-key";
/// Default header values starting with this marker are unfilled templates.
pub const PLACEHOLDER_PREFIX: &str = "PASTE_";

const MASK_AFTER: usize = 20;

pub fn is_placeholder(value: &str) -> bool {
    value.starts_with(PLACEHOLDER_PREFIX)
}

/// Process-wide default headers, applied only where nothing else set the name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalHeaders(HeaderList);

impl Default for GlobalHeaders {
    fn default() -> Self {
        Self(vec![(
            "x-client-type".to_string(),
            "mobile-android".to_string(),
        )])
    }
}

impl GlobalHeaders {
    pub fn new(entries: HeaderList) -> Self {
        Self(entries)
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.0
    }

    fn usable(&self) -> impl Iterator<Item = &(String, String)> {
        self.0
            .iter()
            .filter(|(_, value)| !value.is_empty() && !is_placeholder(value))
    }
}

fn position(headers: &[(String, String)], name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|(existing, _)| existing.eq_ignore_ascii_case(name))
}

pub struct HeaderComposer {
    tokens: Arc<TokenStore>,
    defaults: GlobalHeaders,
}

impl HeaderComposer {
    pub fn new(tokens: Arc<TokenStore>, defaults: GlobalHeaders) -> Self {
        Self { tokens, defaults }
    }

    pub fn tokens(&self) -> &Arc<TokenStore> {
        &self.tokens
    }

    /// Precedence, highest first: caller headers, bearer token (only when
    /// requested and no `Authorization` was supplied), then global defaults.
    /// The environment API key is the exception and always replaces
    /// `x-api-key`.
    pub async fn compose(
        &self,
        test_headers: &BTreeMap<String, String>,
        use_bearer_token: bool,
        environment_id: &str,
    ) -> HeaderList {
        let mut headers: HeaderList = Vec::with_capacity(test_headers.len() + 3);
        for (name, value) in test_headers {
            if position(&headers, name).is_none() {
                headers.push((name.clone(), value.clone()));
            }
        }

        if use_bearer_token
            && self.tokens.oauth2_enabled(environment_id)
            && position(&headers, AUTHORIZATION.as_str()).is_none()
        {
            if !self.tokens.ensure_valid(environment_id).await {
                warn!(environment = %environment_id, "no fresh token available");
            }
            if let Some(token) = self.tokens.cached_token(environment_id).await {
                headers.push(("Authorization".to_string(), format!("Bearer {token}")));
            }
        }

        if let Some(api_key) = self.tokens.api_key(environment_id) {
            match position(&headers, API_KEY_HEADER) {
                Some(index) => {
                    headers[index] = (API_KEY_HEADER.to_string(), api_key.to_string());
                }
                None => headers.push((API_KEY_HEADER.to_string(), api_key.to_string())),
            }
            debug!(environment = %environment_id, "using environment API key");
        }

        for (name, value) in self.defaults.usable() {
            if position(&headers, name).is_none() {
                headers.push((name.clone(), value.clone()));
            }
        }

        headers
    }
}

/// Copy suitable for logs: credentials are cut to a short prefix.
pub fn mask_headers(headers: &[(String, String)]) -> HeaderList {
    headers
        .iter()
        .map(|(name, value)| {
            let sensitive = name.eq_ignore_ascii_case(AUTHORIZATION.as_str())
                || name.eq_ignore_ascii_case(API_KEY_HEADER);
            if sensitive && value.chars().count() > MASK_AFTER {
                let prefix: String = value.chars().take(MASK_AFTER).collect();
                (name.clone(), format!("{prefix}..."))
            } else {
                (name.clone(), value.clone())
            }
        })
        .collect()
}
