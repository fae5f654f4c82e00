use std::{path::PathBuf, time::Duration};

use anyhow::{bail, Context, Result};

use crate::auth::GlobalHeaders;
use crate::env::{lookup, EnvMap};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_RETRIES: u32 = 1;
pub const DEFAULT_ENVIRONMENTS_FILE: &str = "environments.json";

/// Process-wide runner settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub request_timeout: Duration,
    /// Accepted for compatibility and reported by `paycheck settings`.
    /// Requests are never retried.
    pub max_retries: u32,
    pub environments_file: PathBuf,
    pub default_headers: GlobalHeaders,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            environments_file: PathBuf::from(DEFAULT_ENVIRONMENTS_FILE),
            default_headers: GlobalHeaders::default(),
        }
    }
}

impl Settings {
    /// Reads `API_TIMEOUT`, `MAX_RETRIES`, `ENVIRONMENTS_FILE` and
    /// `DEFAULT_HEADERS` (`name=value;name=value`).
    pub fn from_env(env: &EnvMap) -> Result<Self> {
        let mut settings = Settings::default();

        if let Some(raw) = lookup(env, "API_TIMEOUT") {
            let secs: u64 = raw
                .parse()
                .with_context(|| format!("API_TIMEOUT must be whole seconds, got {raw:?}"))?;
            if secs == 0 {
                bail!("API_TIMEOUT must be greater than zero");
            }
            settings.request_timeout = Duration::from_secs(secs);
        }

        if let Some(raw) = lookup(env, "MAX_RETRIES") {
            settings.max_retries = raw
                .parse()
                .with_context(|| format!("MAX_RETRIES must be a non-negative integer, got {raw:?}"))?;
        }

        if let Some(path) = lookup(env, "ENVIRONMENTS_FILE") {
            settings.environments_file = PathBuf::from(path);
        }

        if let Some(raw) = lookup(env, "DEFAULT_HEADERS") {
            settings.default_headers = parse_header_pairs(&raw)?;
        }

        Ok(settings)
    }
}

fn parse_header_pairs(raw: &str) -> Result<GlobalHeaders> {
    let mut headers = Vec::new();
    for pair in raw.split(';').map(str::trim).filter(|p| !p.is_empty()) {
        let Some((name, value)) = pair.split_once('=') else {
            bail!("Invalid DEFAULT_HEADERS entry: {pair}");
        };
        let name = name.trim();
        if name.is_empty() {
            bail!("Invalid DEFAULT_HEADERS entry: {pair}");
        }
        headers.push((name.to_string(), value.trim().to_string()));
    }
    Ok(GlobalHeaders::new(headers))
}
