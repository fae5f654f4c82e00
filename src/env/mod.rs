use std::collections::HashMap;

pub type EnvMap = HashMap<String, String>;

#[cfg(feature = "cli")]
mod loader;

#[cfg(feature = "cli")]
pub use loader::{load_env_file_sync, load_environment};

/// Non-empty value for `key`, whitespace trimmed.
pub fn lookup(env: &EnvMap, key: &str) -> Option<String> {
    env.get(key)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
