use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::defaults::default_policy;
use crate::errors::PolicyError;
use crate::model::{PolicySource, PortalPolicy};
use crate::overlay::{apply_override, KNOWN_PATHS};

const ENV_PREFIX: &str = "COURTPORTAL_POLICY__";
const ENV_JSON: &str = "COURTPORTAL_POLICY_OVERRIDE_JSON";

#[derive(Debug, Default)]
pub struct LoadOptions {
    pub paths: Vec<PathBuf>,
    pub include_env: bool,
    /// `section.key=value` pairs given on the command line.
    pub cli_overrides: Vec<String>,
}

impl LoadOptions {
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            paths: vec![path.into()],
            include_env: true,
            cli_overrides: Vec::new(),
        }
    }
}

pub fn load_policy(path: Option<&Path>) -> Result<PortalPolicy, PolicyError> {
    let mut options = LoadOptions {
        include_env: true,
        ..LoadOptions::default()
    };
    if let Some(p) = path {
        options.paths.push(p.to_path_buf());
    }
    load_policy_with_options(&options)
}

/// Defaults, then each existing file, then env, then CLI pairs.
pub fn load_policy_with_options(options: &LoadOptions) -> Result<PortalPolicy, PolicyError> {
    let mut policy = default_policy();
    for path in KNOWN_PATHS {
        policy
            .provenance
            .insert(path.to_string(), PolicySource::Builtin);
    }

    for path in &options.paths {
        if path.exists() {
            debug!(path = %path.display(), "applying policy file");
            apply_overlays(&mut policy, overlays_from_file(path)?)?;
        }
    }

    if options.include_env {
        apply_overlays(&mut policy, overlays_from_env()?)?;
    }

    apply_overlays(&mut policy, overlays_from_cli(&options.cli_overrides)?)?;

    Ok(policy)
}

struct PolicyOverlay {
    path: String,
    value: Value,
    source: PolicySource,
}

fn apply_overlays(
    policy: &mut PortalPolicy,
    overlays: Vec<PolicyOverlay>,
) -> Result<(), PolicyError> {
    for overlay in overlays {
        apply_override(policy, &overlay.path, &overlay.value, overlay.source)?;
    }
    Ok(())
}

fn overlays_from_file(path: &Path) -> Result<Vec<PolicyOverlay>, PolicyError> {
    let content = fs::read_to_string(path).map_err(|err| PolicyError::Io(format!("{err}")))?;
    let yaml_value: serde_yaml::Value =
        serde_yaml::from_str(&content).map_err(|err| PolicyError::Invalid(format!("{err}")))?;
    let json_value =
        serde_json::to_value(yaml_value).map_err(|err| PolicyError::Invalid(format!("{err}")))?;
    Ok(flatten_value(json_value, None, PolicySource::File))
}

fn overlays_from_env() -> Result<Vec<PolicyOverlay>, PolicyError> {
    let mut overlays = Vec::new();
    for (key, raw) in env::vars() {
        if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
            let path = stripped
                .split("__")
                .filter(|segment| !segment.is_empty())
                .map(|segment| segment.to_ascii_lowercase())
                .collect::<Vec<_>>()
                .join(".");
            if path.is_empty() {
                continue;
            }
            overlays.push(PolicyOverlay {
                path,
                value: parse_scalar(&raw),
                source: PolicySource::Env,
            });
        }
    }

    if let Ok(raw_json) = env::var(ENV_JSON) {
        if !raw_json.trim().is_empty() {
            let json_value: Value = serde_json::from_str(&raw_json)
                .map_err(|err| PolicyError::Invalid(format!("{err}")))?;
            overlays.extend(flatten_value(json_value, None, PolicySource::Env));
        }
    }

    Ok(overlays)
}

fn overlays_from_cli(pairs: &[String]) -> Result<Vec<PolicyOverlay>, PolicyError> {
    let mut overlays = Vec::new();
    for pair in pairs {
        let trimmed = pair.trim();
        if trimmed.is_empty() {
            continue;
        }
        let (path, raw) = trimmed
            .split_once('=')
            .ok_or_else(|| PolicyError::Invalid(format!("expected key=value, got {trimmed}")))?;
        overlays.push(PolicyOverlay {
            path: path.trim().to_string(),
            value: parse_scalar(raw.trim()),
            source: PolicySource::Cli,
        });
    }
    Ok(overlays)
}

fn parse_scalar(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::Null;
    }
    if let Ok(parsed) = serde_json::from_str::<Value>(raw) {
        return parsed;
    }
    Value::String(raw.to_string())
}

fn flatten_value(value: Value, prefix: Option<String>, source: PolicySource) -> Vec<PolicyOverlay> {
    match value {
        Value::Object(map) => {
            let mut result = Vec::new();
            for (key, value) in map {
                let key_segment = key.trim().to_ascii_lowercase();
                let next_prefix = match &prefix {
                    Some(prefix) if !prefix.is_empty() => format!("{prefix}.{key_segment}"),
                    _ => key_segment,
                };
                result.extend(flatten_value(value, Some(next_prefix), source));
            }
            result
        }
        other => match prefix {
            Some(path) => vec![PolicyOverlay {
                path,
                value: other,
                source,
            }],
            None => Vec::new(),
        },
    }
}
