use chat_model::ChatTurn;
use serde::{Deserialize, Serialize};

use crate::config::GatewayApiConfig;

/// Request body shared by `/api/agent` and `/api/agent/stream`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRequest {
    pub messages: Vec<ChatTurn>,
    pub provider: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl AgentRequest {
    /// Builds a request carrying the configured provider settings.
    pub fn new(messages: Vec<ChatTurn>, config: &GatewayApiConfig) -> Self {
        Self {
            messages,
            provider: config.provider.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

/// Successful `/api/agent` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentResponse {
    pub content: String,
}
