mod report;

pub use report::{RunReport, Summary};

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    auth::{HeaderComposer, TokenStore},
    catalog::{CatalogSource, EnvironmentDefinition, TestCase, TestCatalog},
    clock::Clock,
    config::Settings,
    executor::{ExecutionResult, Executor, HttpClient},
    guard,
    scenario::{expand, ExpansionKind, ScenarioBody, ScenarioParams},
};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("Environment not found: {0}")]
    EnvironmentNotFound(String),

    #[error("Test case not found: {test_id} (environment {environment})")]
    TestNotFound { test_id: String, environment: String },

    #[error(transparent)]
    Catalog(#[from] anyhow::Error),
}

/// Drives catalog entries through expansion, the production guard and the
/// executor. Scenarios run one after another.
pub struct TestRunner {
    source: CatalogSource,
    executor: Executor,
}

impl TestRunner {
    pub fn new(source: CatalogSource, executor: Executor) -> Self {
        Self { source, executor }
    }

    /// Wires the executor from process settings around an existing token store.
    pub fn from_settings(settings: &Settings, tokens: Arc<TokenStore>, clock: Arc<dyn Clock>) -> Self {
        let headers = HeaderComposer::new(tokens, settings.default_headers.clone());
        let executor = Executor::new(HttpClient::new(settings.request_timeout), headers, clock);
        Self::new(CatalogSource::new(settings.environments_file.clone()), executor)
    }

    pub fn source(&self) -> &CatalogSource {
        &self.source
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    pub async fn list_environments(&self) -> Result<Vec<EnvironmentDefinition>, RunError> {
        Ok(self.source.environments().await?)
    }

    pub async fn list_test_cases(&self, environment_id: &str) -> Result<TestCatalog, RunError> {
        let (_, catalog) = self.load(environment_id).await?;
        Ok(catalog)
    }

    async fn load(
        &self,
        environment_id: &str,
    ) -> Result<(EnvironmentDefinition, TestCatalog), RunError> {
        let environment = self
            .source
            .environment(environment_id)
            .await?
            .ok_or_else(|| RunError::EnvironmentNotFound(environment_id.to_string()))?;
        let catalog = self.source.catalog_for(&environment).await?;
        Ok((environment, catalog))
    }

    pub async fn run_one(
        &self,
        test_id: &str,
        environment_id: &str,
        params: &ScenarioParams,
    ) -> Result<RunReport, RunError> {
        let (_, catalog) = self.load(environment_id).await?;
        let test_case = catalog
            .find(test_id)
            .ok_or_else(|| RunError::TestNotFound {
                test_id: test_id.to_string(),
                environment: environment_id.to_string(),
            })?;

        let (results, single_blocked) = self
            .run_case(test_case, &catalog.base_url, environment_id, params)
            .await;

        Ok(RunReport {
            environment_id: environment_id.to_string(),
            summary: Summary::from_results(&results),
            results,
            timestamp: self.executor.clock().now(),
            single_blocked,
        })
    }

    pub async fn run_all(
        &self,
        environment_id: &str,
        params: &ScenarioParams,
    ) -> Result<RunReport, RunError> {
        let (_, catalog) = self.load(environment_id).await?;
        info!(
            environment = %environment_id,
            test_cases = catalog.test_cases.len(),
            "running catalog"
        );

        let mut results = Vec::new();
        for test_case in &catalog.test_cases {
            let (case_results, _) = self
                .run_case(test_case, &catalog.base_url, environment_id, params)
                .await;
            results.extend(case_results);
        }

        let summary = Summary::from_results(&results).with_average(&results);
        info!(
            environment = %environment_id,
            passed = summary.passed,
            failed = summary.failed,
            blocked = summary.blocked,
            "catalog finished"
        );

        Ok(RunReport {
            environment_id: environment_id.to_string(),
            summary,
            results,
            timestamp: self.executor.clock().now(),
            single_blocked: false,
        })
    }

    /// Results for every scenario of `test_case`, plus whether the case was a
    /// single unlabeled request that the guard blocked.
    async fn run_case(
        &self,
        test_case: &TestCase,
        base_url: &str,
        environment_id: &str,
        params: &ScenarioParams,
    ) -> (Vec<ExecutionResult>, bool) {
        let expansion = expand(test_case, params, self.executor.clock().today());
        let mut results = Vec::with_capacity(expansion.scenarios.len());

        for scenario in &expansion.scenarios {
            let label = scenario.label.as_deref();
            let result = match &scenario.body {
                ScenarioBody::Invalid(reason) => {
                    warn!(test_id = %test_case.id, scenario = ?label, %reason, "skipping scenario");
                    ExecutionResult::new(test_case, label, self.executor.clock().now())
                        .with_error(reason.clone())
                }
                ScenarioBody::Ready(body) => {
                    self.run_scenario(test_case, body, base_url, environment_id, label)
                        .await
                }
            };
            results.push(result);
        }

        let single_blocked = expansion.kind == ExpansionKind::Single
            && results.first().is_some_and(|r| r.blocked);
        (results, single_blocked)
    }

    async fn run_scenario(
        &self,
        test_case: &TestCase,
        body: &Value,
        base_url: &str,
        environment_id: &str,
        label: Option<&str>,
    ) -> ExecutionResult {
        if let Err(rejection) = guard::validate(body, environment_id) {
            warn!(
                test_id = %test_case.id,
                scenario = ?label,
                environment = %environment_id,
                "production guard blocked request: {rejection}"
            );
            let mut result = ExecutionResult::new(test_case, label, self.executor.clock().now());
            if label.is_some() {
                result.request_body = Some(body.clone());
            }
            return result.into_blocked(rejection.to_string());
        }

        self.executor
            .execute(test_case, body, base_url, environment_id, label)
            .await
    }
}
