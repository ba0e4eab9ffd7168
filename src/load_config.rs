use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{error, info};

use crate::{github, leetcode};

pub const STATE_ENV: &str = "LEETSYNC_STATE";
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";
pub const COOKIE_ENV: &str = "LEETCODE_COOKIE";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct StaticConfig {
    state_path: Option<PathBuf>,
    #[serde(default)]
    github: GitHubSection,
    #[serde(default)]
    leetcode: LeetCodeSection,
    #[serde(default)]
    watch: WatchSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct GitHubSection {
    api_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct LeetCodeSection {
    base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct WatchSection {
    interval_secs: Option<u64>,
}

/// Runtime settings for the CLI: endpoints and file locations from the YAML
/// file, secrets from the environment. Publishing preferences are not here;
/// they live in the state file and change through `config set`.
#[derive(Debug, Clone, PartialEq)]
pub struct CliConfig {
    pub state_path: PathBuf,
    pub github_api_url: String,
    pub leetcode_base_url: String,
    pub poll_interval: Duration,
    pub github_token: Option<String>,
    pub leetcode_cookie: Option<String>,
}

/// Loads the optional static YAML file and merges in environment values.
///
/// State path precedence: `state_override` (the `--state` flag), then
/// `LEETSYNC_STATE`, then `state_path` from the file, then
/// `<config dir>/leetsync/state.json`.
pub fn load_config(path: Option<&Path>, state_override: Option<PathBuf>) -> Result<CliConfig> {
    let static_conf = match path {
        Some(path) => read_static(path)?,
        None => StaticConfig::default(),
    };

    let state_path = match (state_override, non_empty_env(STATE_ENV)) {
        (Some(p), _) => p,
        (None, Some(p)) => {
            info!(state_path = %p, "State path taken from {STATE_ENV}");
            PathBuf::from(p)
        }
        (None, None) => match static_conf.state_path {
            Some(p) => p,
            None => default_state_path()?,
        },
    };

    let github_token = non_empty_env(TOKEN_ENV);
    if github_token.is_some() {
        info!("{TOKEN_ENV} found in env");
    }

    let interval_secs = static_conf
        .watch
        .interval_secs
        .unwrap_or(leetsync_core::watch::POLL_INTERVAL.as_secs());
    if interval_secs == 0 {
        error!("watch.interval_secs must be positive");
        anyhow::bail!("watch.interval_secs must be at least 1");
    }

    let config = CliConfig {
        state_path,
        github_api_url: static_conf
            .github
            .api_url
            .unwrap_or_else(|| github::DEFAULT_API_URL.to_string()),
        leetcode_base_url: static_conf
            .leetcode
            .base_url
            .unwrap_or_else(|| leetcode::DEFAULT_BASE_URL.to_string()),
        poll_interval: Duration::from_secs(interval_secs),
        github_token,
        leetcode_cookie: non_empty_env(COOKIE_ENV),
    };
    info!(
        state_path = %config.state_path.display(),
        github_api_url = %config.github_api_url,
        "Config loaded and merged successfully"
    );
    Ok(config)
}

fn read_static(path: &Path) -> Result<StaticConfig> {
    info!(config_path = ?path, "Loading configuration from file");
    let content = fs::read_to_string(path).map_err(|e| {
        error!(error = ?e, config_path = ?path, "Failed to read config file");
        anyhow::anyhow!("Failed to read config file {:?}: {}", path, e)
    })?;
    // An empty file is a valid, all-defaults config.
    if content.trim().is_empty() {
        return Ok(StaticConfig::default());
    }
    serde_yaml::from_str(&content).map_err(|e| {
        error!(error = ?e, config_path = ?path, "Failed to parse config YAML");
        anyhow::anyhow!("Failed to parse config YAML: {e}")
    })
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

pub fn default_state_path() -> Result<PathBuf> {
    let dir = dirs::config_dir()
        .with_context(|| format!("Could not determine the user config directory; set {STATE_ENV}"))?;
    Ok(dir.join("leetsync").join("state.json"))
}
