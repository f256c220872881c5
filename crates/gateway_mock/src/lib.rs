//! Deterministic mock implementation of the shared `chat_model` gateway contract.
//!
//! Reproduces the development backend's canned replies and model lists with no
//! network access. Also provides a scripted mode that replays queued results and
//! records every conversation it receives, for tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use chat_model::{AgentGateway, ChatTurn, GatewayError, GatewayProfile};

/// Stable gateway identifier used for explicit startup selection.
pub const MOCK_GATEWAY_ID: &str = "mock";

pub const GREETING_REPLY: &str =
    "Hello! I'm Likhon Sheikh, your AI coding assistant. How can I help you today?";
pub const APPROVAL_REPLY: &str = "Great! I'll start implementing the plan right away. I'll provide you with detailed code and explanations as we go along. Let me begin with the first step...";
pub const DEFAULT_REPLY: &str = "I'm here to help with your coding tasks. Could you provide more details about what you'd like me to assist you with?";
pub const EMPTY_INPUT_REPLY: &str = "I didn't receive a valid message. Please try again.";

const COMPONENT_REPLY: &str = r#"I'd be happy to help you create a React component! Here's an example of a simple button component:

```tsx
import React from 'react';

interface ButtonProps {
  primary?: boolean;
  size?: 'small' | 'medium' | 'large';
  label: string;
  onClick?: () => void;
}

export const Button: React.FC<ButtonProps> = ({
  primary = false,
  size = 'medium',
  label,
  onClick,
}) => {
  const baseStyles = 'rounded-md font-medium';
  const sizeStyles = {
    small: 'px-2 py-1 text-sm',
    medium: 'px-4 py-2',
    large: 'px-6 py-3 text-lg',
  };
  const colorStyles = primary
    ? 'bg-primary text-white hover:bg-primary/90'
    : 'bg-gray-200 text-gray-800 hover:bg-gray-300';

  return (
    <button
      type="button"
      className={`${baseStyles} ${sizeStyles[size]} ${colorStyles}`}
      onClick={onClick}
    >
      {label}
    </button>
  );
};
```

This is a reusable button component with TypeScript types that accepts different props to customize its appearance. Would you like me to explain any part of this code in more detail?"#;

/// Models the development backend advertises per upstream provider.
#[must_use]
pub fn models_for_provider(provider: &str) -> Vec<String> {
    let models: &[&str] = match provider.to_ascii_lowercase().as_str() {
        "groq" => &["compound-beta", "llama3-8b", "llama3-70b", "mixtral-8x7b"],
        "openrouter" => &[
            "deepseek/deepseek-prover-v2:free",
            "anthropic/claude-3-opus:beta",
            "meta-llama/llama-3-70b-instruct",
        ],
        _ => &[],
    };
    models.iter().map(|model| model.to_string()).collect()
}

/// Picks the canned reply for a conversation, keyed on its last message.
#[must_use]
pub fn canned_reply(turns: &[ChatTurn]) -> &'static str {
    let Some(last) = turns.last().filter(|turn| !turn.content.trim().is_empty()) else {
        return EMPTY_INPUT_REPLY;
    };
    let text = last.content.to_lowercase();

    if text.contains("hello") || has_word(&text, "hi") {
        return GREETING_REPLY;
    }
    if text.contains("react") && text.contains("component") {
        return COMPONENT_REPLY;
    }
    if text.contains("approve") {
        return APPROVAL_REPLY;
    }
    DEFAULT_REPLY
}

fn has_word(text: &str, word: &str) -> bool {
    text.split(|ch: char| !ch.is_alphanumeric())
        .any(|token| token == word)
}

/// Splits a reply into whitespace-delimited chunks that concatenate back to it.
fn chunk_reply(reply: &str) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut in_space = false;
    for (index, ch) in reply.char_indices() {
        let is_space = ch.is_whitespace();
        if in_space && !is_space {
            chunks.push(&reply[start..index]);
            start = index;
        }
        in_space = is_space;
    }
    if start < reply.len() {
        chunks.push(&reply[start..]);
    }
    chunks
}

#[derive(Debug, Default)]
struct Recorder {
    script: Option<VecDeque<Result<String, GatewayError>>>,
    requests: Vec<Vec<ChatTurn>>,
}

/// Deterministic gateway used by `chat_agent` tests and local runs.
///
/// Clones share the same script and request log.
#[derive(Debug, Clone)]
pub struct MockGateway {
    provider: String,
    chunk_delay: Option<Duration>,
    recorder: Arc<Mutex<Recorder>>,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGateway {
    /// Creates a mock that answers with the canned development replies.
    #[must_use]
    pub fn new() -> Self {
        Self {
            provider: "groq".to_string(),
            chunk_delay: None,
            recorder: Arc::new(Mutex::new(Recorder::default())),
        }
    }

    /// Creates a mock that replays `replies` in order, one per request.
    ///
    /// Once the script is exhausted every request fails.
    #[must_use]
    pub fn scripted(replies: Vec<Result<String, GatewayError>>) -> Self {
        let gateway = Self::new();
        lock_unpoisoned(&gateway.recorder).script = Some(replies.into());
        gateway
    }

    /// Queues one more scripted result; switches a canned mock to scripted mode.
    pub fn push_reply(&self, reply: Result<String, GatewayError>) {
        lock_unpoisoned(&self.recorder)
            .script
            .get_or_insert_with(VecDeque::new)
            .push_back(reply);
    }

    #[must_use]
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    /// Sleeps between streamed chunks to imitate network pacing.
    #[must_use]
    pub fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = Some(delay);
        self
    }

    /// Every conversation received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<Vec<ChatTurn>> {
        lock_unpoisoned(&self.recorder).requests.clone()
    }

    #[must_use]
    pub fn request_count(&self) -> usize {
        lock_unpoisoned(&self.recorder).requests.len()
    }

    fn next_reply(&self, turns: &[ChatTurn]) -> Result<String, GatewayError> {
        let mut recorder = lock_unpoisoned(&self.recorder);
        recorder.requests.push(turns.to_vec());

        match recorder.script.as_mut() {
            Some(script) => script
                .pop_front()
                .unwrap_or_else(|| Err(GatewayError::new("mock script exhausted"))),
            None => Ok(canned_reply(turns).to_string()),
        }
    }
}

impl AgentGateway for MockGateway {
    fn profile(&self) -> GatewayProfile {
        GatewayProfile {
            gateway_id: MOCK_GATEWAY_ID.to_string(),
            provider: self.provider.clone(),
            model: models_for_provider(&self.provider).into_iter().next(),
        }
    }

    fn complete(&self, turns: &[ChatTurn]) -> Result<String, GatewayError> {
        self.next_reply(turns)
    }

    fn stream(
        &self,
        turns: &[ChatTurn],
        on_chunk: &mut dyn FnMut(&str),
    ) -> Result<String, GatewayError> {
        let reply = self.next_reply(turns)?;
        for chunk in chunk_reply(&reply) {
            if let Some(delay) = self.chunk_delay {
                thread::sleep(delay);
            }
            on_chunk(chunk);
        }
        Ok(reply)
    }

    fn list_models(&self, provider: &str) -> Result<Vec<String>, GatewayError> {
        if provider.trim().is_empty() {
            return Err(GatewayError::with_status(
                "Provider parameter is required",
                400,
            ));
        }
        Ok(models_for_provider(provider))
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
