use chrono::NaiveDate;
use serde_json::{Map, Value};

use crate::catalog::TestCase;

use super::{
    params::{coerce_id, split_ids, ScenarioParams},
    transforms::apply_all,
};

#[derive(Debug, Clone, PartialEq)]
pub enum ScenarioBody {
    Ready(Value),
    /// The catalog entry could not be turned into a body; nothing is sent.
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub label: Option<String>,
    pub body: ScenarioBody,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpansionKind {
    Single,
    Bodies,
    IdFanOut,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expansion {
    pub kind: ExpansionKind,
    pub scenarios: Vec<Scenario>,
}

impl Expansion {
    pub fn is_fan_out(&self) -> bool {
        self.kind != ExpansionKind::Single
    }
}

/// Fan-out parameter → body field it overwrites, in priority order.
fn fan_out_target(body: &Value, params: &ScenarioParams) -> Option<(&'static str, Vec<String>)> {
    [
        (params.payment_account_ids.as_deref(), "payment_account_id"),
        (params.scheduled_payment_ids.as_deref(), "scheduled_payment_id"),
    ]
    .into_iter()
    .find_map(|(list, field)| {
        let ids = split_ids(list?);
        let present = body.as_object().is_some_and(|o| o.contains_key(field));
        (present && !ids.is_empty()).then_some((field, ids))
    })
}

fn variant(element: &Value) -> Result<(Option<String>, &Value), String> {
    let Some(object) = element.as_object() else {
        return Err(format!(
            "Unsupported scenario format: expected an object, got {}",
            kind_name(element)
        ));
    };
    match object.get("body") {
        Some(body) => {
            let name = object
                .get("name")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string);
            Ok((name, body))
        }
        None => Ok((None, element)),
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Produces the ordered scenarios for `test_case`. Catalog data is cloned,
/// never modified.
pub fn expand(test_case: &TestCase, params: &ScenarioParams, today: NaiveDate) -> Expansion {
    if let Some(bodies) = &test_case.bodies {
        let scenarios = bodies
            .iter()
            .enumerate()
            .map(|(index, element)| {
                let fallback = format!("Scenario {}", index + 1);
                match variant(element) {
                    Ok((name, body)) => {
                        let mut body = body.clone();
                        apply_all(&mut body, test_case, params, today, index as u64);
                        Scenario {
                            label: Some(name.unwrap_or(fallback)),
                            body: ScenarioBody::Ready(body),
                        }
                    }
                    Err(reason) => Scenario {
                        label: Some(fallback),
                        body: ScenarioBody::Invalid(reason),
                    },
                }
            })
            .collect();
        return Expansion {
            kind: ExpansionKind::Bodies,
            scenarios,
        };
    }

    let base = test_case
        .body
        .clone()
        .unwrap_or_else(|| Value::Object(Map::new()));

    if let Some((field, ids)) = fan_out_target(&base, params) {
        let scenarios = ids
            .iter()
            .enumerate()
            .map(|(index, id)| {
                let mut body = base.clone();
                body[field] = coerce_id(id);
                apply_all(&mut body, test_case, params, today, index as u64);
                Scenario {
                    label: Some(format!("{field} {id}")),
                    body: ScenarioBody::Ready(body),
                }
            })
            .collect();
        return Expansion {
            kind: ExpansionKind::IdFanOut,
            scenarios,
        };
    }

    let mut body = base;
    apply_all(&mut body, test_case, params, today, 0);
    Expansion {
        kind: ExpansionKind::Single,
        scenarios: vec![Scenario {
            label: None,
            body: ScenarioBody::Ready(body),
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn case(value: Value) -> TestCase {
        let mut base = json!({
            "id": "tc",
            "name": "Delete Payment Account",
            "method": "POST",
            "endpoint": "/v1/payment-accounts/delete"
        });
        if let (Some(target), Some(extra)) = (base.as_object_mut(), value.as_object()) {
            target.extend(extra.clone());
        }
        serde_json::from_value(base).unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 11, 20).unwrap()
    }

    fn ready(scenario: &Scenario) -> &Value {
        match &scenario.body {
            ScenarioBody::Ready(body) => body,
            ScenarioBody::Invalid(reason) => panic!("unexpected invalid scenario: {reason}"),
        }
    }

    #[test]
    fn bodies_list_uses_names_or_positions() {
        let test_case = case(json!({"bodies": [{"name": "A", "body": {"x": 1}}, {"x": 2}]}));
        let expansion = expand(&test_case, &ScenarioParams::default(), today());

        assert_eq!(expansion.kind, ExpansionKind::Bodies);
        assert_eq!(
            expansion.scenarios,
            vec![
                Scenario {
                    label: Some("A".to_string()),
                    body: ScenarioBody::Ready(json!({"x": 1})),
                },
                Scenario {
                    label: Some("Scenario 2".to_string()),
                    body: ScenarioBody::Ready(json!({"x": 2})),
                },
            ]
        );
    }

    #[test]
    fn unsupported_shapes_become_invalid_placeholders() {
        let test_case = case(json!({"bodies": [{"x": 1}, "oops", {"name": "", "body": {"y": 2}}]}));
        let expansion = expand(&test_case, &ScenarioParams::default(), today());

        assert_eq!(expansion.scenarios.len(), 3);
        assert!(matches!(
            &expansion.scenarios[1].body,
            ScenarioBody::Invalid(reason) if reason.contains("a string")
        ));
        assert_eq!(expansion.scenarios[1].label.as_deref(), Some("Scenario 2"));
        assert_eq!(expansion.scenarios[2].label.as_deref(), Some("Scenario 3"));
        assert_eq!(ready(&expansion.scenarios[2]), &json!({"y": 2}));
    }

    #[test]
    fn payment_account_ids_fan_out_single_body() {
        let test_case = case(json!({"body": {"cid": 4547, "payment_account_id": 0}}));
        let params = ScenarioParams {
            payment_account_ids: Some("10, 11".to_string()),
            ..ScenarioParams::default()
        };
        let expansion = expand(&test_case, &params, today());

        assert_eq!(expansion.kind, ExpansionKind::IdFanOut);
        assert!(expansion.is_fan_out());
        let labels: Vec<_> = expansion
            .scenarios
            .iter()
            .map(|s| s.label.clone().unwrap())
            .collect();
        assert_eq!(labels, vec!["payment_account_id 10", "payment_account_id 11"]);
        assert_eq!(ready(&expansion.scenarios[0])["payment_account_id"], json!(10));
        assert_eq!(ready(&expansion.scenarios[1])["payment_account_id"], json!(11));
        assert_eq!(test_case.body, Some(json!({"cid": 4547, "payment_account_id": 0})));
    }

    #[test]
    fn scheduled_payment_ids_used_when_field_matches() {
        let test_case = case(json!({"body": {"scheduled_payment_id": "x"}}));
        let params = ScenarioParams {
            payment_account_ids: Some("1,2".to_string()),
            scheduled_payment_ids: Some("SP-1".to_string()),
            ..ScenarioParams::default()
        };
        let expansion = expand(&test_case, &params, today());

        assert_eq!(expansion.scenarios.len(), 1);
        assert_eq!(
            expansion.scenarios[0].label.as_deref(),
            Some("scheduled_payment_id SP-1")
        );
        assert_eq!(ready(&expansion.scenarios[0]), &json!({"scheduled_payment_id": "SP-1"}));
    }

    #[test]
    fn blank_id_lists_fall_through_to_single_body() {
        let test_case = case(json!({"body": {"payment_account_id": 3}}));
        let params = ScenarioParams {
            payment_account_ids: Some("  ,  ".to_string()),
            ..ScenarioParams::default()
        };
        let expansion = expand(&test_case, &params, today());

        assert_eq!(expansion.kind, ExpansionKind::Single);
        assert_eq!(expansion.scenarios[0].label, None);
        assert_eq!(ready(&expansion.scenarios[0]), &json!({"payment_account_id": 3}));
    }

    #[test]
    fn missing_body_expands_to_empty_object() {
        let expansion = expand(&case(json!({})), &ScenarioParams::default(), today());
        assert_eq!(ready(&expansion.scenarios[0]), &json!({}));
        assert!(!expansion.is_fan_out());
    }

    #[test]
    fn auto_payment_offsets_follow_scenario_index() {
        let mut test_case = case(json!({"bodies": [{"cid": 4547}, {"cid": 4547}]}));
        test_case.name = "Add Auto Payment - Variants".to_string();
        let expansion = expand(&test_case, &ScenarioParams::default(), today());

        assert_eq!(ready(&expansion.scenarios[0])["start_date"], json!("2024-12-01"));
        assert_eq!(ready(&expansion.scenarios[1])["start_date"], json!("2024-12-02"));
        assert_eq!(ready(&expansion.scenarios[1])["end_date"], json!("2025-02-01"));
        assert!(test_case.bodies.as_ref().unwrap()[0].get("start_date").is_none());
    }
}
