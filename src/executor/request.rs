use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};
use url::Url;

use crate::{
    auth::{mask_headers, HeaderComposer},
    catalog::TestCase,
    clock::Clock,
};

use super::{
    body::classify_body,
    client::{query_pairs, HttpClient, HttpMethod, RequestPayload},
    models::ExecutionResult,
};

/// Sends fully expanded requests and normalizes whatever comes back.
pub struct Executor {
    http: HttpClient,
    headers: HeaderComposer,
    clock: Arc<dyn Clock>,
}

impl Executor {
    pub fn new(http: HttpClient, headers: HeaderComposer, clock: Arc<dyn Clock>) -> Self {
        Self {
            http,
            headers,
            clock,
        }
    }

    pub fn headers(&self) -> &HeaderComposer {
        &self.headers
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Never fails: transport problems and bad input end up in
    /// `ExecutionResult::error`. The body is echoed back only for labeled
    /// scenarios.
    pub async fn execute(
        &self,
        test_case: &TestCase,
        body: &Value,
        base_url: &str,
        environment_id: &str,
        scenario_label: Option<&str>,
    ) -> ExecutionResult {
        let mut result = ExecutionResult::new(test_case, scenario_label, self.clock.now());
        if scenario_label.is_some() {
            result.request_body = Some(body.clone());
        }

        let method = match test_case.method.parse::<HttpMethod>() {
            Ok(method) => method,
            Err(err) => {
                warn!(test_id = %test_case.id, method = %test_case.method, "unsupported method");
                return result.with_error(err.to_string());
            }
        };

        let url = format!("{base_url}{}", test_case.endpoint);
        if let Err(err) = Url::parse(&url) {
            return result.with_error(format!("Invalid URL {url}: {err}"));
        }

        let headers = self
            .headers
            .compose(&test_case.headers, true, environment_id)
            .await;
        info!(
            test_id = %test_case.id,
            test_name = %test_case.name,
            environment = %environment_id,
            headers = ?mask_headers(&headers),
            "dispatching request"
        );
        info!(test_id = %test_case.id, %method, %url, "request target");

        let payload = match method {
            HttpMethod::Get => RequestPayload::Query(query_pairs(body)),
            HttpMethod::Post | HttpMethod::Put => RequestPayload::Json(body.clone()),
        };

        let response = match self.http.send(method, &url, &headers, payload).await {
            Ok(response) => response,
            Err(err) => {
                warn!(test_id = %test_case.id, error = %err, "request failed");
                result.timestamp = self.clock.now();
                return result.with_error(err.to_string());
            }
        };

        let (data, data_type) = classify_body(&response.body, response.content_type.as_deref());
        result.status_code = Some(response.status);
        result.success = (200..300).contains(&response.status);
        result.response_time_ms = Some(round_ms(response.elapsed.as_secs_f64() * 1000.0));
        result.response_data = Some(data);
        result.response_data_type = Some(data_type);
        result.headers = response.headers;
        result.timestamp = self.clock.now();
        result
    }
}

pub(crate) fn round_ms(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
