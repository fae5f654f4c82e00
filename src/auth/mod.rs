//! OAuth2 client-credentials tokens and outbound header composition.
//!
//! [`TokenStore`] owns one credential record per environment and is the only
//! place bearer tokens are cached or refreshed. [`HeaderComposer`] layers the
//! caller's headers, the bearer token, the environment API key and the global
//! defaults on top of each other.

mod error;
mod headers;
mod refresh;
mod store;
mod types;

pub use error::AuthError;
pub use headers::{
    is_placeholder, mask_headers, GlobalHeaders, HeaderComposer, HeaderList, API_KEY_HEADER,
    PLACEHOLDER_PREFIX,
};
pub use refresh::{DEFAULT_EXPIRES_IN_SECS, EXPIRY_BUFFER_SECS, TOKEN_REQUEST_TIMEOUT};
pub use store::TokenStore;
pub use types::{EnvironmentCredentials, OAuth2Config, TokenInfo, TokenStatus, CLIENT_CREDENTIALS};
