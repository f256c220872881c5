use std::fmt;

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Error as JsonError;

/// Message surfaced when the gateway fails without a usable explanation.
pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to communicate with agent";

#[derive(Debug)]
pub enum GatewayApiError {
    InvalidBaseUrl(String),
    InvalidHeader(String),
    EmptyConversation,
    Request(reqwest::Error),
    Status(StatusCode, String),
    Serde(JsonError),
    Unknown(String),
}

impl GatewayApiError {
    /// HTTP status for errors produced by a non-success response.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status(status, _) => Some(*status),
            _ => None,
        }
    }

    /// The user-facing part of the error, without transport prefixes.
    pub fn user_message(&self) -> String {
        match self {
            Self::Status(_, message) => message.clone(),
            Self::Request(_) => GENERIC_FAILURE_MESSAGE.to_owned(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorPayload {
    #[serde(rename = "error")]
    pub value: Option<ErrorPayloadFields>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorPayloadFields {
    pub message: Option<String>,
}

impl fmt::Display for GatewayApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBaseUrl(value) => write!(f, "invalid base URL: {value}"),
            Self::InvalidHeader(value) => write!(f, "invalid header: {value}"),
            Self::EmptyConversation => write!(f, "messages must not be empty"),
            Self::Request(error) => write!(f, "request error: {error}"),
            Self::Status(status, message) => write!(f, "HTTP {status} {message}"),
            Self::Serde(error) => write!(f, "serialization error: {error}"),
            Self::Unknown(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for GatewayApiError {}

impl From<reqwest::Error> for GatewayApiError {
    fn from(error: reqwest::Error) -> Self {
        Self::Request(error)
    }
}

impl From<JsonError> for GatewayApiError {
    fn from(error: JsonError) -> Self {
        Self::Serde(error)
    }
}

/// Extracts `error.message` from a gateway error body.
///
/// Anything else, including bodies that are not JSON, yields
/// [`GENERIC_FAILURE_MESSAGE`].
pub fn parse_error_message(_status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorPayload>(body)
        .ok()
        .and_then(|payload| payload.value)
        .and_then(|fields| fields.message)
        .map(|message| message.trim().to_owned())
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_owned())
}
