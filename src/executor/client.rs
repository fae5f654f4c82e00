use std::{collections::BTreeMap, fmt, str::FromStr, time::Duration, time::Instant};

use reqwest::{header::HeaderMap, Client, Method};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported method: {0}")]
pub struct UnsupportedMethod(pub String);

impl FromStr for HttpMethod {
    type Err = UnsupportedMethod;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            _ => Err(UnsupportedMethod(value.to_string())),
        }
    }
}

impl HttpMethod {
    fn as_reqwest(self) -> Method {
        match self {
            Self::Get => Method::GET,
            Self::Post => Method::POST,
            Self::Put => Method::PUT,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_reqwest().as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestPayload {
    Empty,
    Query(Vec<(String, String)>),
    Json(Value),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Request timeout")]
    Timeout,
    #[error("Connection error: {0}")]
    Connect(String),
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connect(err.to_string())
        } else {
            Self::Other(err.to_string())
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    /// Lowercased names; repeated headers joined with ", ".
    pub headers: BTreeMap<String, String>,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
    pub elapsed: Duration,
}

/// Thin wrapper over `reqwest::Client` applying one timeout to every call.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
    timeout: Duration,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Self {
        Self::with_client(Client::new(), timeout)
    }

    pub fn with_client(inner: Client, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn send(
        &self,
        method: HttpMethod,
        url: &str,
        headers: &[(String, String)],
        payload: RequestPayload,
    ) -> Result<HttpResponse, TransportError> {
        let mut request_builder = self
            .inner
            .request(method.as_reqwest(), url)
            .timeout(self.timeout);

        for (name, value) in headers {
            request_builder = request_builder.header(name, value);
        }

        request_builder = match payload {
            RequestPayload::Empty => request_builder,
            RequestPayload::Query(pairs) => request_builder.query(&pairs),
            RequestPayload::Json(body) => request_builder.json(&body),
        };

        let start = Instant::now();
        let response = request_builder.send().await?;
        let status = response.status().as_u16();
        let header_map = response.headers().clone();
        let body = response.bytes().await?;
        let elapsed = start.elapsed();

        let content_type = header_map
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        Ok(HttpResponse {
            status,
            headers: collect_headers(&header_map),
            content_type,
            body: body.to_vec(),
            elapsed,
        })
    }
}

fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut collected: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        collected
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    collected
}

/// Flattens a JSON object into query pairs. Scalars are stringified (booleans
/// as `True`/`False`, which the target APIs expect), arrays repeat the key,
/// nested values are JSON-encoded and nulls are dropped.
/// Anything other than an object yields no parameters.
pub fn query_pairs(body: &Value) -> Vec<(String, String)> {
    let Some(fields) = body.as_object() else {
        return Vec::new();
    };

    let mut pairs = Vec::new();
    for (key, value) in fields {
        match value {
            Value::Array(items) => pairs.extend(
                items
                    .iter()
                    .filter_map(query_value)
                    .map(|item| (key.clone(), item)),
            ),
            other => {
                if let Some(item) = query_value(other) {
                    pairs.push((key.clone(), item));
                }
            }
        }
    }
    pairs
}

fn query_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(true) => Some("True".to_string()),
        Value::Bool(false) => Some("False".to_string()),
        Value::Number(_) => Some(value.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}
