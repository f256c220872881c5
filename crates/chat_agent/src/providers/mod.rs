use std::sync::Arc;

use chat_model::AgentGateway;
use gateway_mock::MockGateway;
use gateway_provider::{HttpGateway, HttpGatewayConfig};

use crate::config::{AgentConfig, GatewayKind};

/// Builds the gateway selected by `config`.
pub fn gateway_from_config(config: &AgentConfig) -> Result<Arc<dyn AgentGateway>, String> {
    match config.gateway {
        GatewayKind::Mock => Ok(Arc::new(
            MockGateway::new().with_provider(config.upstream.clone()),
        )),
        GatewayKind::Http => {
            let mut http = HttpGatewayConfig::new(config.gateway_url.clone())
                .with_provider(config.upstream.clone())
                .with_temperature(config.temperature)
                .with_max_tokens(config.max_tokens);
            if let Some(model) = &config.model {
                http = http.with_model(model.clone());
            }
            if let Some(timeout) = config.timeout {
                http = http.with_timeout(timeout);
            }
            let gateway = HttpGateway::new(http).map_err(|error| error.to_string())?;
            Ok(Arc::new(gateway))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_gateway_is_the_default() {
        let gateway = gateway_from_config(&AgentConfig::default()).expect("mock should resolve");
        let profile = gateway.profile();
        assert_eq!(profile.gateway_id, "mock");
        assert_eq!(profile.provider, "groq");
    }

    #[test]
    fn http_gateway_carries_upstream_and_model() {
        let config = AgentConfig {
            gateway: GatewayKind::Http,
            upstream: "openrouter".to_string(),
            model: Some("anthropic/claude-3-opus:beta".to_string()),
            ..AgentConfig::default()
        };

        let gateway = gateway_from_config(&config).expect("http should resolve");
        let profile = gateway.profile();
        assert_eq!(profile.gateway_id, "http");
        assert_eq!(profile.provider, "openrouter");
        assert_eq!(
            profile.model.as_deref(),
            Some("anthropic/claude-3-opus:beta")
        );
    }
}
