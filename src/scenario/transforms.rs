use chrono::NaiveDate;
use serde_json::{Map, Value};
use tracing::warn;

use crate::catalog::TestCase;

use super::{
    dates::{auto_payment_dates, DATE_FORMAT},
    params::{coerce_id, split_ids, PaymentOverride, ScenarioParams},
};

pub(super) const AUTO_PAYMENT_MARKER: &str = "add auto payment";
pub(super) const MAKE_PAYMENT_MARKER: &str = "make payment";
pub(super) const CANCEL_MARKER: &str = "cancel";
pub(super) const RECEIPT_MARKER: &str = "receipt";
pub(super) const STATUS_MARKER: &str = "status";

const BIMONTHLY_KEYS: [&str; 2] = ["Bimonthly", "bimonthly"];

/// Applies every transform the test name and parameters ask for, in a fixed
/// order. `offset_days` is the scenario's zero-based index.
pub(super) fn apply_all(
    body: &mut Value,
    test_case: &TestCase,
    params: &ScenarioParams,
    today: NaiveDate,
    offset_days: u64,
) {
    let Some(fields) = body.as_object_mut() else {
        return;
    };

    if test_case.name_contains(AUTO_PAYMENT_MARKER) {
        apply_auto_payment_dates(fields, today, offset_days);
        if let Some(config) = &params.auto_payment {
            apply_payment_override(fields, config);
        }
    }

    if test_case.name_contains(MAKE_PAYMENT_MARKER) {
        if let Some(config) = &params.make_payment {
            apply_payment_override(fields, config);
        }
    }

    let id_overrides = [
        (CANCEL_MARKER, params.cancel_payment_ids.as_deref()),
        (RECEIPT_MARKER, params.receipt_payment_ids.as_deref()),
        (STATUS_MARKER, params.status_payment_ids.as_deref()),
    ];
    for (marker, list) in id_overrides {
        if let Some(list) = list.filter(|_| test_case.name_contains(marker)) {
            apply_id_override(fields, list);
        }
    }
}

fn apply_auto_payment_dates(fields: &mut Map<String, Value>, today: NaiveDate, offset_days: u64) {
    let Some(dates) = auto_payment_dates(today, offset_days) else {
        warn!(%today, offset_days, "auto payment dates out of range, leaving body unchanged");
        return;
    };
    let start = dates.start_date.format(DATE_FORMAT).to_string();
    let end = dates.end_date.format(DATE_FORMAT).to_string();
    let second = dates.second_payment_start_date.format(DATE_FORMAT).to_string();

    fields.insert("start_date".to_string(), Value::String(start.clone()));
    fields.insert("end_date".to_string(), Value::String(end));

    for key in BIMONTHLY_KEYS {
        let Some(bimonthly) = fields.get_mut(key).and_then(Value::as_object_mut) else {
            continue;
        };
        for (payment, date) in [("first_payment", &start), ("second_payment", &second)] {
            if let Some(schedule) = bimonthly.get_mut(payment).and_then(Value::as_object_mut) {
                schedule.insert("start_date".to_string(), Value::String(date.clone()));
            }
        }
    }
}

/// Only keys already present in the body are rewritten.
fn apply_payment_override(fields: &mut Map<String, Value>, config: &PaymentOverride) {
    let overrides = [
        ("payment_account_id", config.payment_account_id.as_deref()),
        ("payment_type_id", config.payment_type_id.as_deref()),
    ];
    for (key, value) in overrides {
        if let (Some(slot), Some(value)) = (fields.get_mut(key), value) {
            *slot = coerce_id(value);
        }
    }
}

/// `payment_ids` receives the whole list; otherwise `payment_id` receives the
/// first id.
fn apply_id_override(fields: &mut Map<String, Value>, list: &str) {
    let ids = split_ids(list);
    let Some(first) = ids.first() else {
        return;
    };

    if let Some(slot) = fields.get_mut("payment_ids") {
        *slot = Value::Array(ids.iter().map(|id| coerce_id(id)).collect());
    } else if let Some(slot) = fields.get_mut("payment_id") {
        *slot = coerce_id(first);
    }
}
