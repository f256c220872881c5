use chat_model::ChatTurn;
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::{Client, RequestBuilder, Response};

use crate::config::GatewayApiConfig;
use crate::decode::Utf8ChunkDecoder;
use crate::error::{parse_error_message, GatewayApiError, GENERIC_FAILURE_MESSAGE};
use crate::payload::{AgentRequest, AgentResponse};
use crate::url::{agent_stream_url, agent_url, models_url};

#[derive(Debug)]
pub struct GatewayApiClient {
    http: Client,
    config: GatewayApiConfig,
}

impl GatewayApiClient {
    pub fn new(config: GatewayApiConfig) -> Result<Self, GatewayApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(GatewayApiError::from)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &GatewayApiConfig {
        &self.config
    }

    pub fn build_headers(&self) -> Result<HeaderMap, GatewayApiError> {
        let mut out = HeaderMap::new();
        if let Some(user_agent) = self.config.user_agent.as_deref() {
            out.insert(
                USER_AGENT,
                HeaderValue::from_str(user_agent).map_err(|_| {
                    GatewayApiError::InvalidHeader(format!("invalid value for {USER_AGENT}"))
                })?,
            );
        }
        for (key, value) in &self.config.extra_headers {
            out.insert(
                HeaderName::from_bytes(key.as_bytes())
                    .map_err(|_| GatewayApiError::InvalidHeader(format!("invalid key: {key}")))?,
                HeaderValue::from_str(value).map_err(|_| {
                    GatewayApiError::InvalidHeader(format!("invalid value for {key}"))
                })?,
            );
        }
        Ok(out)
    }

    /// Builds the request body for a conversation, rejecting empty ones.
    pub fn build_payload(&self, turns: &[ChatTurn]) -> Result<AgentRequest, GatewayApiError> {
        if turns.is_empty() {
            return Err(GatewayApiError::EmptyConversation);
        }
        Ok(AgentRequest::new(turns.to_vec(), &self.config))
    }

    pub fn build_request(&self, turns: &[ChatTurn]) -> Result<RequestBuilder, GatewayApiError> {
        let payload = self.build_payload(turns)?;
        Ok(self
            .http
            .post(agent_url(&self.config.base_url)?)
            .headers(self.build_headers()?)
            .json(&payload))
    }

    pub fn build_stream_request(
        &self,
        turns: &[ChatTurn],
    ) -> Result<RequestBuilder, GatewayApiError> {
        let payload = self.build_payload(turns)?;
        Ok(self
            .http
            .post(agent_stream_url(&self.config.base_url)?)
            .headers(self.build_headers()?)
            .json(&payload))
    }

    /// Sends the conversation and returns the assistant reply text.
    pub async fn complete(&self, turns: &[ChatTurn]) -> Result<String, GatewayApiError> {
        let request = self.build_request(turns)?;
        tracing::debug!(turns = turns.len(), provider = %self.config.provider, "agent request");
        let response = ensure_success(request.send().await?).await?;
        let body = response.text().await?;
        let parsed: AgentResponse = serde_json::from_str(&body)?;
        Ok(parsed.content)
    }

    /// Streams the reply, invoking `on_chunk` for each decoded piece of text.
    ///
    /// Returns the full accumulated reply once the body ends.
    pub async fn stream_with_handler<F>(
        &self,
        turns: &[ChatTurn],
        mut on_chunk: F,
    ) -> Result<String, GatewayApiError>
    where
        F: FnMut(&str),
    {
        let request = self.build_stream_request(turns)?;
        tracing::debug!(turns = turns.len(), provider = %self.config.provider, "agent stream request");
        let response = ensure_success(request.send().await?).await?;
        let mut bytes = response.bytes_stream();
        let mut decoder = Utf8ChunkDecoder::default();
        let mut accumulated = String::new();

        while let Some(chunk) = bytes.next().await {
            let chunk = chunk?;
            let text = decoder.feed(&chunk);
            emit(&text, &mut accumulated, &mut on_chunk);
        }
        let rest = decoder.finish();
        emit(&rest, &mut accumulated, &mut on_chunk);

        Ok(accumulated)
    }

    pub async fn list_models(&self, provider: &str) -> Result<Vec<String>, GatewayApiError> {
        let url = models_url(&self.config.base_url, provider)?;
        let response = self
            .http
            .get(url)
            .headers(self.build_headers()?)
            .send()
            .await?;
        let response = ensure_success(response).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

fn emit<F>(text: &str, accumulated: &mut String, on_chunk: &mut F)
where
    F: FnMut(&str),
{
    if text.is_empty() {
        return;
    }
    accumulated.push_str(text);
    on_chunk(text);
}

async fn ensure_success(response: Response) -> Result<Response, GatewayApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| GENERIC_FAILURE_MESSAGE.to_owned());
    let message = parse_error_message(status, &body);
    tracing::warn!(status = status.as_u16(), %message, "gateway returned an error");
    Err(GatewayApiError::Status(status, message))
}
