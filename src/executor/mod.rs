mod body;
mod client;
mod models;
mod request;

pub use body::{classify_body, media_type, BINARY_CONTENT_TYPES};
pub use client::{
    query_pairs, HttpClient, HttpMethod, HttpResponse, RequestPayload, TransportError,
    UnsupportedMethod,
};
pub use models::{ExecutionResult, Outcome, ResponseDataType};
pub use request::Executor;
pub(crate) use request::round_ms;
