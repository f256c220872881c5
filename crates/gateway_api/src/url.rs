use url::Url;

use crate::error::GatewayApiError;

/// Default base URL for a locally running gateway.
pub const DEFAULT_GATEWAY_BASE_URL: &str = "http://localhost:5000";

pub const AGENT_PATH: &str = "api/agent";
pub const AGENT_STREAM_PATH: &str = "api/agent/stream";
pub const MODELS_PATH: &str = "api/models";

/// Normalize a base URL so route paths can be appended.
///
/// Blank input falls back to [`DEFAULT_GATEWAY_BASE_URL`]; a trailing `/api`
/// segment is dropped so both `http://host` and `http://host/api` work.
pub fn normalize_base_url(input: &str) -> Result<Url, GatewayApiError> {
    let base = if input.trim().is_empty() {
        DEFAULT_GATEWAY_BASE_URL
    } else {
        input.trim()
    };

    let trimmed = base.trim_end_matches('/');
    let trimmed = trimmed.strip_suffix("/api").unwrap_or(trimmed);
    let parsed = Url::parse(&format!("{trimmed}/"))
        .map_err(|error| GatewayApiError::InvalidBaseUrl(format!("{base}: {error}")))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(GatewayApiError::InvalidBaseUrl(format!(
            "{base}: unsupported scheme '{}'",
            parsed.scheme()
        )));
    }

    Ok(parsed)
}

pub fn agent_url(base: &str) -> Result<Url, GatewayApiError> {
    join(base, AGENT_PATH)
}

pub fn agent_stream_url(base: &str) -> Result<Url, GatewayApiError> {
    join(base, AGENT_STREAM_PATH)
}

/// Builds `<base>/api/models?provider=<provider>` with the provider percent-encoded.
pub fn models_url(base: &str, provider: &str) -> Result<Url, GatewayApiError> {
    let mut url = join(base, MODELS_PATH)?;
    url.query_pairs_mut().append_pair("provider", provider);
    Ok(url)
}

fn join(base: &str, path: &str) -> Result<Url, GatewayApiError> {
    normalize_base_url(base)?
        .join(path)
        .map_err(|error| GatewayApiError::InvalidBaseUrl(format!("{base}: {error}")))
}
