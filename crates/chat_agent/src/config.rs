//! Startup configuration: optional JSON file, then environment overrides.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::engine::Delivery;

pub use gateway_provider::{
    DEFAULT_GATEWAY_BASE_URL as DEFAULT_GATEWAY_URL, DEFAULT_MAX_TOKENS,
    DEFAULT_PROVIDER as DEFAULT_UPSTREAM, DEFAULT_TEMPERATURE,
};

pub const PROVIDER_ENV_VAR: &str = "CHAT_AGENT_PROVIDER";
pub const GATEWAY_URL_ENV_VAR: &str = "CHAT_AGENT_GATEWAY_URL";
pub const UPSTREAM_ENV_VAR: &str = "CHAT_AGENT_UPSTREAM";
pub const MODEL_ENV_VAR: &str = "CHAT_AGENT_MODEL";
pub const TEMPERATURE_ENV_VAR: &str = "CHAT_AGENT_TEMPERATURE";
pub const MAX_TOKENS_ENV_VAR: &str = "CHAT_AGENT_MAX_TOKENS";
pub const STREAM_ENV_VAR: &str = "CHAT_AGENT_STREAM";
pub const TIMEOUT_ENV_VAR: &str = "CHAT_AGENT_TIMEOUT_SEC";
pub const STATE_PATH_ENV_VAR: &str = "CHAT_AGENT_STATE_PATH";
pub const CONFIG_PATH_ENV_VAR: &str = "CHAT_AGENT_CONFIG_PATH";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    ParseFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Unsupported provider '{0}'. Available providers: mock, http")]
    UnknownProvider(String),
    #[error("invalid value for {key}: '{value}' ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Which gateway implementation backs the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GatewayKind {
    #[default]
    Mock,
    Http,
}

impl GatewayKind {
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mock" => Ok(Self::Mock),
            "http" => Ok(Self::Http),
            other => Err(ConfigError::UnknownProvider(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mock => "mock",
            Self::Http => "http",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    pub gateway: GatewayKind,
    pub gateway_url: String,
    /// Upstream provider forwarded to the gateway (`groq`, `openrouter`, ...).
    pub upstream: String,
    pub model: Option<String>,
    pub temperature: f64,
    pub max_tokens: u32,
    pub delivery: Delivery,
    pub timeout: Option<Duration>,
    /// Explicit snapshot location; `None` means the default under the cwd.
    pub state_path: Option<PathBuf>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayKind::Mock,
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            upstream: DEFAULT_UPSTREAM.to_string(),
            model: None,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            delivery: Delivery::Complete,
            timeout: None,
            state_path: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    provider: Option<String>,
    gateway_url: Option<String>,
    upstream: Option<String>,
    model: Option<String>,
    temperature: Option<f64>,
    max_tokens: Option<u32>,
    stream: Option<bool>,
    timeout_sec: Option<u64>,
    state_path: Option<PathBuf>,
}

impl AgentConfig {
    /// Reads `CHAT_AGENT_CONFIG_PATH` (when set) and the `CHAT_AGENT_*` variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Self::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let mut config = match lookup(CONFIG_PATH_ENV_VAR) {
            Some(path) => Self::from_file(Path::new(path.trim()))?,
            None => Self::default(),
        };

        if let Some(value) = lookup(PROVIDER_ENV_VAR) {
            config.gateway = GatewayKind::parse(&value)?;
        }
        if let Some(value) = lookup(GATEWAY_URL_ENV_VAR) {
            config.gateway_url = value.trim().to_string();
        }
        if let Some(value) = lookup(UPSTREAM_ENV_VAR) {
            config.upstream = value.trim().to_string();
        }
        if let Some(value) = lookup(MODEL_ENV_VAR) {
            config.model = Some(value.trim().to_string());
        }
        if let Some(value) = lookup(TEMPERATURE_ENV_VAR) {
            config.temperature = parse_temperature(TEMPERATURE_ENV_VAR, &value)?;
        }
        if let Some(value) = lookup(MAX_TOKENS_ENV_VAR) {
            config.max_tokens = parse_positive(MAX_TOKENS_ENV_VAR, &value)?;
        }
        if let Some(value) = lookup(STREAM_ENV_VAR) {
            config.delivery = if value.trim() == "1" {
                Delivery::Stream
            } else {
                Delivery::Complete
            };
        }
        if let Some(value) = lookup(TIMEOUT_ENV_VAR) {
            let seconds: u64 = parse_positive(TIMEOUT_ENV_VAR, &value)?;
            config.timeout = Some(Duration::from_secs(seconds));
        }
        if let Some(value) = lookup(STATE_PATH_ENV_VAR) {
            config.state_path = Some(PathBuf::from(value.trim()));
        }

        Ok(config)
    }

    /// Loads settings from a JSON file; unknown fields are rejected.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let file: FileConfig =
            serde_json::from_str(&raw).map_err(|source| ConfigError::ParseFile {
                path: path.to_path_buf(),
                source,
            })?;

        let mut config = Self::default();
        if let Some(provider) = file.provider {
            config.gateway = GatewayKind::parse(&provider)?;
        }
        if let Some(url) = file.gateway_url {
            config.gateway_url = url;
        }
        if let Some(upstream) = file.upstream {
            config.upstream = upstream;
        }
        config.model = file.model.filter(|model| !model.trim().is_empty());
        if let Some(temperature) = file.temperature {
            config.temperature = check_temperature("temperature", temperature)?;
        }
        if let Some(max_tokens) = file.max_tokens {
            config.max_tokens = check_positive("max_tokens", max_tokens)?;
        }
        if file.stream == Some(true) {
            config.delivery = Delivery::Stream;
        }
        if let Some(seconds) = file.timeout_sec {
            config.timeout = Some(Duration::from_secs(check_positive("timeout_sec", seconds)?));
        }
        config.state_path = file.state_path;

        Ok(config)
    }

    /// Snapshot path, defaulting to `<cwd>/.agent/agentConversation.json`.
    pub fn resolve_state_path(&self, cwd: &Path) -> PathBuf {
        self.state_path
            .clone()
            .unwrap_or_else(|| conversation_store::default_snapshot_path(cwd))
    }
}

fn parse_temperature(key: &'static str, value: &str) -> Result<f64, ConfigError> {
    let parsed = value
        .trim()
        .parse::<f64>()
        .map_err(|_| ConfigError::InvalidValue {
            key,
            value: value.to_string(),
            reason: "expected a number",
        })?;
    check_temperature(key, parsed)
}

fn check_temperature(key: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
            reason: "must be a finite number >= 0",
        })
    }
}

fn parse_positive<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default + ToString,
{
    let parsed = value
        .trim()
        .parse::<T>()
        .map_err(|_| ConfigError::InvalidValue {
            key,
            value: value.to_string(),
            reason: "expected a positive integer",
        })?;
    check_positive(key, parsed)
}

fn check_positive<T>(key: &'static str, value: T) -> Result<T, ConfigError>
where
    T: PartialOrd + Default + ToString,
{
    if value > T::default() {
        Ok(value)
    } else {
        Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
            reason: "must be > 0",
        })
    }
}
