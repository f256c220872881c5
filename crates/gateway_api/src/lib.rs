//! Transport-only client for the agent gateway HTTP API.
//!
//! Covers request building, status/error parsing and incremental decoding of
//! streamed replies for `/api/agent`, `/api/agent/stream` and `/api/models`.
//! Requests are never retried.

pub mod client;
pub mod config;
pub mod decode;
pub mod error;
pub mod payload;
pub mod url;

pub use client::GatewayApiClient;
pub use config::{GatewayApiConfig, DEFAULT_MAX_TOKENS, DEFAULT_PROVIDER, DEFAULT_TEMPERATURE};
pub use decode::Utf8ChunkDecoder;
pub use error::{parse_error_message, GatewayApiError, GENERIC_FAILURE_MESSAGE};
pub use payload::{AgentRequest, AgentResponse};
pub use reqwest::StatusCode;
pub use url::{normalize_base_url, DEFAULT_GATEWAY_BASE_URL};
