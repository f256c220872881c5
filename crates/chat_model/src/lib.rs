//! Shared conversation types and the provider-neutral gateway contract.
//!
//! This crate defines the message log vocabulary (messages, checkpoints, and
//! the upstream `{role, content}` projection) plus the [`AgentGateway`] trait
//! that chat front-ends call for one request/response round trip. It contains
//! no transport details and no state management.

use std::fmt;

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Fixed timestamp used when the system clock cannot be formatted as RFC 3339.
pub const EPOCH_TIMESTAMP: &str = "1970-01-01T00:00:00Z";

/// Returns a fresh opaque identifier.
#[must_use]
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Returns the current UTC time formatted as RFC 3339.
#[must_use]
pub fn now_timestamp() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| EPOCH_TIMESTAMP.to_string())
}

/// Author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the conversation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: String,
}

impl Message {
    /// Creates a message with a fresh id and the current timestamp.
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            role,
            content: content.into(),
            timestamp: now_timestamp(),
        }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Empty assistant message shown while a reply is outstanding.
    #[must_use]
    pub fn placeholder() -> Self {
        Self::new(Role::Assistant, String::new())
    }

    /// Projects the message onto the fields sent upstream.
    #[must_use]
    pub fn to_turn(&self) -> ChatTurn {
        ChatTurn {
            role: self.role,
            content: self.content.clone(),
        }
    }
}

/// Rollback point anchored to an assistant message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    pub id: String,
    pub timestamp: String,
    pub after_message_id: String,
}

impl Checkpoint {
    /// Creates a checkpoint with a fresh id anchored to `after_message_id`.
    #[must_use]
    pub fn after(after_message_id: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            timestamp: now_timestamp(),
            after_message_id: after_message_id.into(),
        }
    }
}

/// Upstream-facing message: ids and timestamps are never sent to the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }
}

/// Error returned by a gateway round trip.
///
/// `Display` renders the message alone so callers can surface it verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayError {
    message: String,
    status: Option<u16>,
}

impl GatewayError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
        }
    }

    /// Creates an error that carries the HTTP status it was mapped from.
    #[must_use]
    pub fn with_status(message: impl Into<String>, status: u16) -> Self {
        Self {
            message: message.into(),
            status: Some(status),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.status
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for GatewayError {}

impl From<String> for GatewayError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for GatewayError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Immutable metadata describing a gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayProfile {
    pub gateway_id: String,
    pub provider: String,
    pub model: Option<String>,
}

/// Gateway interface for one chat round trip.
pub trait AgentGateway: Send + Sync + 'static {
    /// Returns gateway/provider identity metadata.
    fn profile(&self) -> GatewayProfile;

    /// Sends the conversation and returns the full reply.
    fn complete(&self, turns: &[ChatTurn]) -> Result<String, GatewayError>;

    /// Sends the conversation and delivers the reply incrementally.
    ///
    /// `on_chunk` is invoked synchronously for each chunk in arrival order. The
    /// returned string is the concatenation of every delivered chunk.
    fn stream(
        &self,
        turns: &[ChatTurn],
        on_chunk: &mut dyn FnMut(&str),
    ) -> Result<String, GatewayError> {
        let content = self.complete(turns)?;
        if !content.is_empty() {
            on_chunk(&content);
        }
        Ok(content)
    }

    /// Lists model identifiers offered for an upstream provider.
    fn list_models(&self, _provider: &str) -> Result<Vec<String>, GatewayError> {
        Err(GatewayError::new(
            "Model listing is not supported by this gateway",
        ))
    }
}
