//! Text-mode chat agent with checkpoints and rollback.
//!
//! ## Gateway selection
//!
//! - `CHAT_AGENT_PROVIDER=mock` (default) answers locally with canned replies.
//! - `CHAT_AGENT_PROVIDER=http` talks to an agent gateway at
//!   `CHAT_AGENT_GATEWAY_URL` (default `http://localhost:5000`).
//!
//! The upstream provider and model are forwarded with every request:
//! `CHAT_AGENT_UPSTREAM` (default `groq`) and `CHAT_AGENT_MODEL`. Sampling is
//! tuned with `CHAT_AGENT_TEMPERATURE` and `CHAT_AGENT_MAX_TOKENS`;
//! `CHAT_AGENT_STREAM=1` patches replies into the transcript as they arrive.
//!
//! ## State
//!
//! The conversation is persisted as JSON after every change, at
//! `CHAT_AGENT_STATE_PATH` or `<cwd>/.agent/agentConversation.json`.
//! `CHAT_AGENT_CONFIG_PATH` may point at a JSON file carrying the same
//! settings; environment values win over file values.

pub mod app;
pub mod commands;
pub mod config;
pub mod console;
pub mod engine;
pub mod providers;
