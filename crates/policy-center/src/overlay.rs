use std::path::PathBuf;

use serde_json::Value;

use crate::errors::PolicyError;
use crate::model::{PolicySource, PortalPolicy, MAX_INTERVAL_SECS, MAX_RETENTION_HOURS};

/// Every path `apply_override` accepts.
pub const KNOWN_PATHS: [&str; 12] = [
    "sync.interval_secs",
    "distribution.enabled",
    "distribution.max_per_cycle",
    "distribution.max_judge_workload",
    "distribution.min_judge_level",
    "notifications.retention_hours",
    "notifications.oversight_portal",
    "notifications.oversight_min_level",
    "storage.state_key",
    "storage.signal_key",
    "storage.dir",
    "channel.capacity",
];

/// Sets one dotted path, validating the value and recording provenance.
/// Unknown paths are rejected instead of ignored.
pub fn apply_override(
    policy: &mut PortalPolicy,
    path: &str,
    value: &Value,
    source: PolicySource,
) -> Result<(), PolicyError> {
    match path {
        "sync.interval_secs" => {
            policy.sync.interval_secs = to_bounded_u64(path, value, MAX_INTERVAL_SECS)?
        }
        "distribution.enabled" => policy.distribution.enabled = to_bool(path, value)?,
        "distribution.max_per_cycle" => {
            policy.distribution.max_per_cycle = to_u64(path, value)? as usize
        }
        "distribution.max_judge_workload" => {
            policy.distribution.max_judge_workload = to_positive_u64(path, value)? as usize
        }
        "distribution.min_judge_level" => {
            policy.distribution.min_judge_level = to_u8(path, value)?
        }
        "notifications.retention_hours" => {
            policy.notifications.retention_hours =
                to_bounded_u64(path, value, MAX_RETENTION_HOURS)?
        }
        "notifications.oversight_portal" => {
            policy.notifications.oversight_portal = to_key(path, value)?
        }
        "notifications.oversight_min_level" => {
            policy.notifications.oversight_min_level = to_u8(path, value)?
        }
        "storage.state_key" => policy.storage.state_key = to_key(path, value)?,
        "storage.signal_key" => policy.storage.signal_key = to_key(path, value)?,
        "storage.dir" => {
            policy.storage.dir = match value {
                Value::Null => None,
                other => Some(PathBuf::from(to_key(path, other)?)),
            }
        }
        "channel.capacity" => policy.channel.capacity = to_positive_u64(path, value)? as usize,
        other => return Err(PolicyError::UnsupportedPath(other.to_string())),
    }
    policy.provenance.insert(path.to_string(), source);
    Ok(())
}

fn invalid(path: &str, reason: impl Into<String>) -> PolicyError {
    PolicyError::InvalidValue {
        path: path.to_string(),
        reason: reason.into(),
    }
}

fn to_u64(path: &str, value: &Value) -> Result<u64, PolicyError> {
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|raw| raw.trim().parse().ok()))
        .ok_or_else(|| invalid(path, format!("expected non-negative integer, got {value}")))
}

fn to_positive_u64(path: &str, value: &Value) -> Result<u64, PolicyError> {
    match to_u64(path, value)? {
        0 => Err(invalid(path, "must be greater than zero")),
        parsed => Ok(parsed),
    }
}

fn to_bounded_u64(path: &str, value: &Value, max: u64) -> Result<u64, PolicyError> {
    match to_positive_u64(path, value)? {
        parsed if parsed > max => Err(invalid(path, format!("{parsed} exceeds maximum {max}"))),
        parsed => Ok(parsed),
    }
}

fn to_u8(path: &str, value: &Value) -> Result<u8, PolicyError> {
    let raw = to_u64(path, value)?;
    u8::try_from(raw).map_err(|_| invalid(path, format!("{raw} out of range 0..=255")))
}

fn to_bool(path: &str, value: &Value) -> Result<bool, PolicyError> {
    value
        .as_bool()
        .or_else(|| value.as_str().and_then(|raw| raw.trim().parse().ok()))
        .ok_or_else(|| invalid(path, format!("expected boolean, got {value}")))
}

fn to_key(path: &str, value: &Value) -> Result<String, PolicyError> {
    match value.as_str().map(str::trim) {
        Some(raw) if !raw.is_empty() => Ok(raw.to_string()),
        _ => Err(invalid(path, format!("expected non-empty string, got {value}"))),
    }
}
