use std::collections::BTreeMap;
use std::time::Duration;

use crate::url::DEFAULT_GATEWAY_BASE_URL;

pub const DEFAULT_PROVIDER: &str = "groq";
pub const DEFAULT_TEMPERATURE: f64 = 0.14;
pub const DEFAULT_MAX_TOKENS: u32 = 2048;

/// Transport configuration for gateway requests.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayApiConfig {
    /// Base URL the `/api/...` routes are resolved against.
    pub base_url: String,
    /// Upstream provider the gateway should forward to.
    pub provider: String,
    /// Optional upstream model; the gateway picks one when absent.
    pub model: Option<String>,
    pub temperature: f64,
    pub max_tokens: u32,
    /// Optional `User-Agent` override.
    pub user_agent: Option<String>,
    /// Additional headers merged into request headers.
    pub extra_headers: BTreeMap<String, String>,
    /// Optional request timeout.
    pub timeout: Option<Duration>,
}

impl Default for GatewayApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GATEWAY_BASE_URL.to_string(),
            provider: DEFAULT_PROVIDER.to_string(),
            model: None,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            user_agent: None,
            extra_headers: BTreeMap::new(),
            timeout: None,
        }
    }
}

impl GatewayApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn insert_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(key.into(), value.into());
        self
    }
}
