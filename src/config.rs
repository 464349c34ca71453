use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{BackupError, Result};

pub const DEFAULT_ALERTS_URL: &str = "https://api.newrelic.com/v2/";
pub const DEFAULT_SYNTHETICS_URL: &str = "https://synthetics.newrelic.com/synthetics/api/v3/monitors/";
pub const DEFAULT_LABEL_SYNTHETICS_URL: &str =
    "https://synthetics.newrelic.com/synthetics/api/v4/monitors/";
pub const DEFAULT_INSIGHTS_URL: &str = "https://insights-collector.newrelic.com/v1/accounts/";
pub const DEFAULT_INFRASTRUCTURE_URL: &str = "https://infra-api.newrelic.com/v2/alerts/";
pub const DEFAULT_GRAPHQL_URL: &str = "https://api.newrelic.com/graphql";

/// Base URLs of the remote endpoint groups.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub alerts: String,
    pub synthetics: String,
    pub label_synthetics: String,
    pub insights: String,
    pub infrastructure: String,
    pub graphql: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            alerts: DEFAULT_ALERTS_URL.to_string(),
            synthetics: DEFAULT_SYNTHETICS_URL.to_string(),
            label_synthetics: DEFAULT_LABEL_SYNTHETICS_URL.to_string(),
            insights: DEFAULT_INSIGHTS_URL.to_string(),
            infrastructure: DEFAULT_INFRASTRUCTURE_URL.to_string(),
            graphql: DEFAULT_GRAPHQL_URL.to_string(),
        }
    }
}

impl Endpoints {
    /// Points every endpoint group at one server, each under its own path
    /// prefix. Used to target a single mock or gateway.
    pub fn rooted_at(root: &str) -> Self {
        let root = root.trim_end_matches('/');
        Self {
            alerts: format!("{root}/v2/"),
            synthetics: format!("{root}/synthetics/api/v3/monitors/"),
            label_synthetics: format!("{root}/synthetics/api/v4/monitors/"),
            insights: format!("{root}/v1/accounts/"),
            infrastructure: format!("{root}/infra/v2/alerts/"),
            graphql: format!("{root}/graphql"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: String,
    pub proxy: Option<String>,
    pub proxy_auth: Option<String>,
    pub retries: u32,
    pub retry_backoff: Duration,
    pub request_timeout: Duration,
    pub log_dir: String,
    pub endpoints: Endpoints,
}

// File layer
#[derive(Deserialize, Default, Debug)]
struct PartialFileConfig {
    api_key: Option<String>,
    proxy: Option<String>,
    proxy_auth: Option<String>,
    retries: Option<u32>,
    retry_backoff_ms: Option<u64>,
    request_timeout_secs: Option<u64>,
    log_dir: Option<String>,
    endpoints: Option<PartialEndpoints>,
}

#[derive(Deserialize, Default, Debug)]
struct PartialEndpoints {
    alerts: Option<String>,
    synthetics: Option<String>,
    label_synthetics: Option<String>,
    insights: Option<String>,
    infrastructure: Option<String>,
    graphql: Option<String>,
}

// Environment layer, names kept compatible with existing deployments.
#[derive(Deserialize, Default, Debug)]
struct PartialEnvConfig {
    new_relic_apikey: Option<String>,
    new_relic_proxy: Option<String>,
    proxy_auth: Option<String>,
    retries: Option<u32>,
    retry_backoff_ms: Option<u64>,
    request_timeout_secs: Option<u64>,
    nrbackup_log_dir: Option<String>,
}

fn default_retries() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    3000
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    /// Builds the configuration from an optional TOML file, then the
    /// environment (which wins), then defaults.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        dotenv::dotenv().ok();

        let file_config: PartialFileConfig = match config_path {
            Some(path_str) => {
                let path = Path::new(path_str);
                if path.exists() {
                    let contents =
                        fs::read_to_string(path).map_err(|e| BackupError::io(path, e))?;
                    toml::from_str(&contents).map_err(|e| {
                        BackupError::Config(format!(
                            "Failed to parse TOML from config file at {path:?}: {e}"
                        ))
                    })?
                } else {
                    tracing::warn!(path = %path_str, "Config file not found, using environment and defaults.");
                    PartialFileConfig::default()
                }
            }
            None => PartialFileConfig::default(),
        };

        let env_config: PartialEnvConfig = envy::from_env::<PartialEnvConfig>().map_err(|e| {
            BackupError::Config(format!("Failed to load config from environment: {e}"))
        })?;

        Self::merge(file_config, env_config)
    }

    /// Parses a TOML document without consulting the environment.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let file_config: PartialFileConfig = toml::from_str(contents)
            .map_err(|e| BackupError::Config(format!("Failed to parse TOML: {e}")))?;
        Self::merge(file_config, PartialEnvConfig::default())
    }

    fn merge(file_config: PartialFileConfig, env_config: PartialEnvConfig) -> Result<Self> {
        let api_key = non_empty(env_config.new_relic_apikey)
            .or(non_empty(file_config.api_key))
            .ok_or_else(|| {
                BackupError::ClientConstruction("No NEW_RELIC_APIKEY detected.".to_string())
            })?;

        let file_endpoints = file_config.endpoints.unwrap_or_default();
        let defaults = Endpoints::default();
        let endpoints = Endpoints {
            alerts: file_endpoints.alerts.unwrap_or(defaults.alerts),
            synthetics: file_endpoints.synthetics.unwrap_or(defaults.synthetics),
            label_synthetics: file_endpoints
                .label_synthetics
                .unwrap_or(defaults.label_synthetics),
            insights: file_endpoints.insights.unwrap_or(defaults.insights),
            infrastructure: file_endpoints
                .infrastructure
                .unwrap_or(defaults.infrastructure),
            graphql: file_endpoints.graphql.unwrap_or(defaults.graphql),
        };

        let retries = env_config
            .retries
            .or(file_config.retries)
            .unwrap_or_else(default_retries)
            .max(1);

        Ok(AppConfig {
            api_key,
            proxy: non_empty(env_config.new_relic_proxy).or(non_empty(file_config.proxy)),
            proxy_auth: non_empty(env_config.proxy_auth).or(non_empty(file_config.proxy_auth)),
            retries,
            retry_backoff: Duration::from_millis(
                env_config
                    .retry_backoff_ms
                    .or(file_config.retry_backoff_ms)
                    .unwrap_or_else(default_retry_backoff_ms),
            ),
            request_timeout: Duration::from_secs(
                env_config
                    .request_timeout_secs
                    .or(file_config.request_timeout_secs)
                    .unwrap_or_else(default_request_timeout_secs),
            ),
            log_dir: non_empty(env_config.nrbackup_log_dir)
                .or(non_empty(file_config.log_dir))
                .unwrap_or_else(default_log_dir),
            endpoints,
        })
    }

    /// A configuration with defaults for everything except the key and the
    /// endpoint root.
    pub fn for_endpoints(api_key: &str, endpoints: Endpoints) -> Self {
        AppConfig {
            api_key: api_key.to_string(),
            proxy: None,
            proxy_auth: None,
            retries: default_retries(),
            retry_backoff: Duration::from_millis(default_retry_backoff_ms()),
            request_timeout: Duration::from_secs(default_request_timeout_secs()),
            log_dir: default_log_dir(),
            endpoints,
        }
    }
}
