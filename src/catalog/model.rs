use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_CATEGORY: &str = "Uncategorized";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EnvironmentsFile {
    pub environments: Vec<EnvironmentDefinition>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EnvironmentDefinition {
    pub id: String,
    #[serde(default, alias = "display_name")]
    pub name: String,
    pub test_cases_file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Overrides the built-in credential variable prefix for this environment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_prefix: Option<String>,
    #[serde(flatten)]
    pub extras: HashMap<String, Value>,
}

impl EnvironmentDefinition {
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TestCatalog {
    pub base_url: String,
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
    #[serde(flatten)]
    pub extras: HashMap<String, Value>,
}

impl TestCatalog {
    pub fn find(&self, test_id: &str) -> Option<&TestCase> {
        self.test_cases.iter().find(|tc| tc.id == test_id)
    }
}

/// One catalog entry. `body` and `bodies` are free-form JSON; `bodies` wins
/// when both are present.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TestCase {
    pub id: String,
    pub name: String,
    pub method: String,
    pub endpoint: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bodies: Option<Vec<Value>>,
    #[serde(flatten)]
    pub extras: HashMap<String, Value>,
}

impl TestCase {
    pub fn category(&self) -> &str {
        self.category.as_deref().unwrap_or(DEFAULT_CATEGORY)
    }

    pub fn name_contains(&self, marker: &str) -> bool {
        self.name
            .to_ascii_lowercase()
            .contains(&marker.to_ascii_lowercase())
    }
}
