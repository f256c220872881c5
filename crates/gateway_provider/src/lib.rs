//! HTTP-backed implementation of the shared `chat_model` gateway contract.
//!
//! Drives the async `gateway_api` client on a per-call current-thread runtime
//! and maps transport failures onto user-facing [`GatewayError`] messages.

use std::sync::Arc;
use std::time::Duration;

use chat_model::{AgentGateway, ChatTurn, GatewayError, GatewayProfile};
use gateway_api::{GatewayApiClient, GatewayApiConfig, GatewayApiError, GENERIC_FAILURE_MESSAGE};

pub use gateway_api::{
    DEFAULT_GATEWAY_BASE_URL, DEFAULT_MAX_TOKENS, DEFAULT_PROVIDER, DEFAULT_TEMPERATURE,
};

/// Stable gateway identifier used by `chat_agent` startup selection.
pub const HTTP_GATEWAY_ID: &str = "http";

/// Runtime configuration for the HTTP gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpGatewayConfig {
    pub base_url: String,
    pub provider: String,
    pub model: Option<String>,
    pub temperature: f64,
    pub max_tokens: u32,
    pub timeout: Option<Duration>,
}

impl HttpGatewayConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let defaults = GatewayApiConfig::default();
        Self {
            base_url: base_url.into(),
            provider: defaults.provider,
            model: defaults.model,
            temperature: defaults.temperature,
            max_tokens: defaults.max_tokens,
            timeout: None,
        }
    }

    #[must_use]
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn into_api_config(self) -> GatewayApiConfig {
        let mut config = GatewayApiConfig::new(self.base_url)
            .with_provider(self.provider)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens)
            .with_user_agent(concat!("chat-agent/", env!("CARGO_PKG_VERSION")));

        if let Some(model) = self.model {
            config = config.with_model(model);
        }

        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }

        config
    }
}

trait Transport: Send + Sync {
    fn complete(&self, turns: &[ChatTurn]) -> Result<String, GatewayApiError>;

    fn stream(
        &self,
        turns: &[ChatTurn],
        on_chunk: &mut dyn FnMut(&str),
    ) -> Result<String, GatewayApiError>;

    fn list_models(&self, provider: &str) -> Result<Vec<String>, GatewayApiError>;
}

#[derive(Debug)]
struct DefaultTransport {
    client: GatewayApiClient,
}

impl DefaultTransport {
    fn block_on<F, T>(&self, future: F) -> Result<T, GatewayApiError>
    where
        F: std::future::Future<Output = Result<T, GatewayApiError>>,
    {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|error| {
                GatewayApiError::Unknown(format!("failed to initialize tokio runtime: {error}"))
            })?;

        runtime.block_on(future)
    }
}

impl Transport for DefaultTransport {
    fn complete(&self, turns: &[ChatTurn]) -> Result<String, GatewayApiError> {
        self.block_on(self.client.complete(turns))
    }

    fn stream(
        &self,
        turns: &[ChatTurn],
        on_chunk: &mut dyn FnMut(&str),
    ) -> Result<String, GatewayApiError> {
        self.block_on(self.client.stream_with_handler(turns, |chunk| on_chunk(chunk)))
    }

    fn list_models(&self, provider: &str) -> Result<Vec<String>, GatewayApiError> {
        self.block_on(self.client.list_models(provider))
    }
}

/// `AgentGateway` backed by the HTTP agent endpoints.
pub struct HttpGateway {
    provider: String,
    model: Option<String>,
    transport: Arc<dyn Transport>,
}

impl HttpGateway {
    /// Creates a gateway using real HTTP transport.
    pub fn new(config: HttpGatewayConfig) -> Result<Self, GatewayError> {
        let provider = config.provider.clone();
        let model = config.model.clone();
        let client = GatewayApiClient::new(config.into_api_config()).map_err(map_init_error)?;

        Ok(Self {
            provider,
            model,
            transport: Arc::new(DefaultTransport { client }),
        })
    }

    #[cfg(test)]
    fn with_transport_for_tests(provider: &str, transport: Arc<dyn Transport>) -> Self {
        Self {
            provider: provider.to_string(),
            model: None,
            transport,
        }
    }
}

impl AgentGateway for HttpGateway {
    fn profile(&self) -> GatewayProfile {
        GatewayProfile {
            gateway_id: HTTP_GATEWAY_ID.to_string(),
            provider: self.provider.clone(),
            model: self.model.clone(),
        }
    }

    fn complete(&self, turns: &[ChatTurn]) -> Result<String, GatewayError> {
        self.transport.complete(turns).map_err(map_api_error)
    }

    fn stream(
        &self,
        turns: &[ChatTurn],
        on_chunk: &mut dyn FnMut(&str),
    ) -> Result<String, GatewayError> {
        self.transport.stream(turns, on_chunk).map_err(map_api_error)
    }

    fn list_models(&self, provider: &str) -> Result<Vec<String>, GatewayError> {
        self.transport.list_models(provider).map_err(map_api_error)
    }
}

/// Maps a transport error onto the message shown to the user.
///
/// Status errors keep the upstream message and code. Connection and decode
/// failures collapse to the generic message; their detail goes to the log.
fn map_api_error(error: GatewayApiError) -> GatewayError {
    match error {
        GatewayApiError::Status(status, message) => {
            GatewayError::with_status(message, status.as_u16())
        }
        GatewayApiError::Request(_) | GatewayApiError::Serde(_) => {
            tracing::warn!(%error, "gateway request failed");
            GatewayError::new(GENERIC_FAILURE_MESSAGE)
        }
        other => GatewayError::new(other.to_string()),
    }
}

fn map_init_error(error: GatewayApiError) -> GatewayError {
    GatewayError::new(format!("Failed to initialize http gateway: {error}"))
}
