use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::TestCase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseDataType {
    Json,
    Text,
    /// Base64-encoded payload.
    Binary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    Failed,
    Blocked,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// One concrete request and what came back. Failures are recorded here
/// rather than returned as errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub test_id: String,
    pub test_name: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_data_type: Option<ResponseDataType>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<Value>,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub blocked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionResult {
    pub fn new(test_case: &TestCase, scenario_name: Option<&str>, timestamp: DateTime<Utc>) -> Self {
        Self {
            test_id: test_case.id.clone(),
            test_name: test_case.name.clone(),
            category: test_case.category().to_string(),
            scenario_name: scenario_name.map(str::to_string),
            status_code: None,
            success: false,
            response_time_ms: None,
            response_data: None,
            response_data_type: None,
            headers: BTreeMap::new(),
            request_body: None,
            timestamp,
            blocked: false,
            error: None,
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.success = false;
        self.error = Some(error.into());
        self
    }

    pub fn into_blocked(mut self, reason: impl Into<String>) -> Self {
        self.blocked = true;
        self.with_error(reason)
    }

    pub fn outcome(&self) -> Outcome {
        if self.blocked {
            Outcome::Blocked
        } else if self.success {
            Outcome::Passed
        } else {
            Outcome::Failed
        }
    }
}
