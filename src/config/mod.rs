mod credentials;
mod settings;

pub use credentials::{credentials_from_env, prefix_mapping, DEFAULT_ENVIRONMENT_PREFIXES};
pub use settings::{
    Settings, DEFAULT_ENVIRONMENTS_FILE, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT_SECS,
};
