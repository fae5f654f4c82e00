use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Account / payment-type substitution for payment creation scenarios.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PaymentOverride {
    #[serde(default)]
    pub payment_account_id: Option<String>,
    #[serde(default)]
    pub payment_type_id: Option<String>,
}

impl PaymentOverride {
    pub fn is_empty(&self) -> bool {
        self.payment_account_id.is_none() && self.payment_type_id.is_none()
    }
}

/// Caller-supplied knobs layered over the catalog body. Id lists are
/// comma-separated strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScenarioParams {
    pub auto_payment: Option<PaymentOverride>,
    pub make_payment: Option<PaymentOverride>,
    pub cancel_payment_ids: Option<String>,
    pub receipt_payment_ids: Option<String>,
    pub status_payment_ids: Option<String>,
    pub payment_account_ids: Option<String>,
    pub scheduled_payment_ids: Option<String>,
}

/// Splits a comma-separated list, dropping blanks. An all-blank list is
/// empty, which callers treat as "not provided".
pub fn split_ids(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

/// Digits-only ids become JSON integers; anything else stays a string.
pub fn coerce_id(id: &str) -> Value {
    let trimmed = id.trim();
    if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(number) = trimmed.parse::<u64>() {
            return Value::from(number);
        }
    }
    Value::String(trimmed.to_string())
}
