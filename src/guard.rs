//! Production safety: requests against production environments must carry an
//! allow-listed `cid`. Checked before any network traffic.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use serde_json::Value;
use thiserror::Error;
use tracing::info;

static PRODUCTION_ENVIRONMENTS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ["rapid-prod", "standard-prod"].into_iter().collect());

pub const ALLOWED_PRODUCTION_CIDS: &[i64] = &[4547, 1995];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardRejection {
    #[error("PRODUCTION SAFETY: CID required for production environment ({environment})")]
    MissingCid { environment: String },

    #[error("PRODUCTION SAFETY: invalid format for CID: {value}")]
    InvalidFormat { value: String },

    #[error("PRODUCTION SAFETY: CID {cid} not allowed in production. Only CID 4547 or 1995 are permitted.")]
    NotAllowed { cid: i64 },
}

pub fn is_production(environment_id: &str) -> bool {
    PRODUCTION_ENVIRONMENTS.contains(environment_id)
}

pub fn validate(request_body: &Value, environment_id: &str) -> Result<(), GuardRejection> {
    if !is_production(environment_id) {
        return Ok(());
    }

    let Some(raw) = request_body.as_object().and_then(|body| body.get("cid")) else {
        return Err(GuardRejection::MissingCid {
            environment: environment_id.to_string(),
        });
    };

    let cid = cid_as_integer(raw).ok_or_else(|| GuardRejection::InvalidFormat {
        value: display_value(raw),
    })?;

    if !ALLOWED_PRODUCTION_CIDS.contains(&cid) {
        return Err(GuardRejection::NotAllowed { cid });
    }

    info!(environment = %environment_id, cid, "production CID check passed");
    Ok(())
}

/// Integers pass through, finite floats truncate, booleans count as 0/1 and
/// strings must parse as a base-10 integer once trimmed.
fn cid_as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                .map(|f| f.trunc() as i64)
        }),
        Value::Bool(b) => Some(i64::from(*b)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
