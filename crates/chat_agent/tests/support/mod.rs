#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use chat_agent::app::App;
use chat_agent::engine::{CheckpointEngine, Delivery};
use chat_model::GatewayError;
use conversation_store::{ConversationStore, FileSnapshotSink};
use gateway_mock::MockGateway;

pub fn engine_with(gateway: &MockGateway) -> CheckpointEngine {
    CheckpointEngine::new(ConversationStore::in_memory(), Arc::new(gateway.clone()))
}

pub fn streaming_engine_with(gateway: &MockGateway) -> CheckpointEngine {
    engine_with(gateway).with_delivery(Delivery::Stream)
}

pub fn file_engine(path: &Path, gateway: &MockGateway) -> CheckpointEngine {
    CheckpointEngine::new(
        ConversationStore::open(FileSnapshotSink::new(path)),
        Arc::new(gateway.clone()),
    )
}

pub fn app_with(gateway: &MockGateway) -> App {
    App::new(engine_with(gateway))
}

pub fn scripted(replies: &[&str]) -> MockGateway {
    MockGateway::scripted(replies.iter().map(|reply| Ok(reply.to_string())).collect())
}

pub fn rate_limited() -> GatewayError {
    GatewayError::with_status("rate limited", 500)
}
