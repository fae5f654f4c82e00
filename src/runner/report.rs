use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::executor::{round_ms, ExecutionResult, Outcome};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub blocked: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_response_time_ms: Option<f64>,
}

impl Summary {
    pub fn from_results(results: &[ExecutionResult]) -> Self {
        let mut summary = Self {
            total: results.len(),
            passed: 0,
            failed: 0,
            blocked: 0,
            avg_response_time_ms: None,
        };
        for result in results {
            match result.outcome() {
                Outcome::Passed => summary.passed += 1,
                Outcome::Failed => summary.failed += 1,
                Outcome::Blocked => summary.blocked += 1,
            }
        }
        summary
    }

    /// Mean over successful results only; 0 when nothing succeeded.
    pub fn with_average(mut self, results: &[ExecutionResult]) -> Self {
        let times: Vec<f64> = results
            .iter()
            .filter(|r| r.success)
            .filter_map(|r| r.response_time_ms)
            .collect();
        let average = if times.is_empty() {
            0.0
        } else {
            round_ms(times.iter().sum::<f64>() / times.len() as f64)
        };
        self.avg_response_time_ms = Some(average);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub environment_id: String,
    pub results: Vec<ExecutionResult>,
    pub summary: Summary,
    pub timestamp: DateTime<Utc>,
    /// Set when a single, unlabeled request was stopped by the production guard.
    #[serde(skip)]
    pub single_blocked: bool,
}

impl RunReport {
    /// HTTP-style status for the whole invocation: 403 when the only request
    /// was blocked, 200 otherwise.
    pub fn status_code(&self) -> u16 {
        if self.single_blocked {
            403
        } else {
            200
        }
    }

    pub fn all_passed(&self) -> bool {
        self.summary.failed == 0 && self.summary.blocked == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TestCase;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn result(success: bool, blocked: bool, time: Option<f64>) -> ExecutionResult {
        let test_case: TestCase = serde_json::from_value(json!({
            "id": "tc",
            "name": "Case",
            "method": "GET",
            "endpoint": "/"
        }))
        .unwrap();
        let mut result = ExecutionResult::new(&test_case, None, Utc::now());
        result.success = success;
        result.blocked = blocked;
        result.response_time_ms = time;
        result
    }

    #[test]
    fn counts_partition_results() {
        let results = vec![
            result(true, false, Some(10.0)),
            result(false, false, Some(30.0)),
            result(false, true, None),
            result(true, false, Some(15.56)),
        ];
        let summary = Summary::from_results(&results).with_average(&results);

        assert_eq!(
            summary,
            Summary {
                total: 4,
                passed: 2,
                failed: 1,
                blocked: 1,
                avg_response_time_ms: Some(12.78),
            }
        );
        assert_eq!(summary.total, summary.passed + summary.failed + summary.blocked);
    }

    #[test]
    fn average_is_zero_without_successes() {
        let results = vec![result(false, false, Some(50.0))];
        let summary = Summary::from_results(&results).with_average(&results);
        assert_eq!(summary.avg_response_time_ms, Some(0.0));
    }

    #[test]
    fn single_blocked_report_maps_to_forbidden() {
        let results = vec![result(false, true, None)];
        let mut report = RunReport {
            environment_id: "rapid-prod".to_string(),
            summary: Summary::from_results(&results),
            results,
            timestamp: Utc::now(),
            single_blocked: true,
        };
        assert_eq!(report.status_code(), 403);
        assert!(!report.all_passed());

        report.single_blocked = false;
        assert_eq!(report.status_code(), 200);
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("single_blocked").is_none());
        assert!(json["summary"].get("avg_response_time_ms").is_none());
    }
}
