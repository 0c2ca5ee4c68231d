use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use courtportal_policy_center::{load_policy_with_options, LoadOptions, PortalPolicy};

/// Installs the global subscriber. `RUST_LOG` wins over `level`. Logs go to
/// stderr so command output on stdout stays machine-readable.
pub fn init_logging(level: &str, json: bool) -> Result<()> {
    let level: tracing::Level = level.parse().context("Invalid log level")?;
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string()));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .context("Failed to install log subscriber")?;
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .context("Failed to install log subscriber")?;
    }
    Ok(())
}

pub struct LoadedPolicy {
    pub policy: PortalPolicy,
    pub path: PathBuf,
}

/// Priority: `--config` > ./config/portal.yaml > <config_dir>/courtportal/portal.yaml
pub fn config_path(explicit: Option<&PathBuf>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.clone());
    }
    let local = PathBuf::from("config/portal.yaml");
    if local.exists() {
        return Ok(local);
    }
    let mut path = dirs::config_dir().context("Failed to get config directory")?;
    path.push("courtportal");
    path.push("portal.yaml");
    Ok(path)
}

pub fn load_policy(explicit: Option<&PathBuf>, overrides: &[String]) -> Result<LoadedPolicy> {
    let path = config_path(explicit)?;
    if path.exists() {
        info!("Loading policy from: {}", path.display());
    } else if explicit.is_some() {
        anyhow::bail!("Config file not found: {}", path.display());
    } else {
        warn!("Config file not found, using defaults: {}", path.display());
    }

    let options = LoadOptions {
        paths: vec![path.clone()],
        include_env: true,
        cli_overrides: overrides.to_vec(),
    };
    let policy = load_policy_with_options(&options).context("Failed to load portal policy")?;
    Ok(LoadedPolicy { policy, path })
}

/// Priority: `--state-dir` > storage.dir > <data_dir>/courtportal
pub fn state_dir(explicit: Option<PathBuf>, policy: &PortalPolicy) -> Result<PathBuf> {
    if let Some(dir) = explicit.or_else(|| policy.storage.dir.clone()) {
        return Ok(dir);
    }
    let mut dir = dirs::data_dir().context("Failed to get data directory")?;
    dir.push("courtportal");
    Ok(dir)
}
