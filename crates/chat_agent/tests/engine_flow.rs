mod support;

use chat_agent::engine::{SendOutcome, APPROVE_PLAN_MESSAGE};
use chat_model::{ChatTurn, Role};
use gateway_mock::MockGateway;
use pretty_assertions::assert_eq;

use support::{engine_with, rate_limited, scripted, streaming_engine_with};

#[test]
fn hello_exchange_records_reply_and_checkpoint() {
    let gateway = scripted(&["Hi there!"]);
    let mut engine = engine_with(&gateway);

    let outcome = engine.send_message("Hello");

    let state = engine.state();
    assert_eq!(state.messages.len(), 2);
    assert_eq!(state.messages[0].role, Role::User);
    assert_eq!(state.messages[0].content, "Hello");
    assert_eq!(state.messages[1].role, Role::Assistant);
    assert_eq!(state.messages[1].content, "Hi there!");
    assert_eq!(state.checkpoints.len(), 1);
    assert_eq!(state.checkpoints[0].after_message_id, state.messages[1].id);
    assert!(!state.is_loading);
    assert_eq!(state.error, None);
    assert_eq!(
        outcome,
        SendOutcome::Completed {
            message_id: state.messages[1].id.clone(),
            checkpoint_id: state.checkpoints[0].id.clone(),
        }
    );
    assert_eq!(gateway.requests(), vec![vec![ChatTurn::user("Hello")]]);
}

#[test]
fn upstream_failure_sets_error_without_checkpoint() {
    let gateway = MockGateway::scripted(vec![Err(rate_limited())]);
    let mut engine = engine_with(&gateway);

    let outcome = engine.send_message("Hello");

    assert_eq!(
        outcome,
        SendOutcome::Failed {
            error: "rate limited".to_string()
        }
    );
    let state = engine.state();
    assert_eq!(state.error.as_deref(), Some("rate limited"));
    assert!(!state.is_loading);
    assert!(state.checkpoints.is_empty());
    // The log is kept: the user turn and the empty placeholder stay.
    assert_eq!(state.messages.len(), 2);
    assert!(state.messages[1].content.is_empty());
}

#[test]
fn follow_up_request_carries_history_but_no_placeholder() {
    let gateway = scripted(&["first reply", "second reply"]);
    let mut engine = engine_with(&gateway);

    engine.send_message("one");
    engine.send_message("two");

    let requests = gateway.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(
        requests[1],
        vec![
            ChatTurn::user("one"),
            ChatTurn::new(Role::Assistant, "first reply"),
            ChatTurn::user("two"),
        ]
    );
    assert_eq!(engine.state().checkpoints.len(), 2);
}

#[test]
fn blank_input_is_ignored_without_a_request() {
    let gateway = scripted(&[]);
    let mut engine = engine_with(&gateway);

    assert_eq!(engine.send_message(" \n\t "), SendOutcome::Ignored);
    assert!(engine.state().messages.is_empty());
    assert_eq!(gateway.request_count(), 0);
}

#[test]
fn submissions_are_rejected_while_loading() {
    let gateway = scripted(&["late"]);
    let mut engine = engine_with(&gateway);

    let _pending = engine.begin_send("first");
    assert_eq!(engine.send_message("second"), SendOutcome::Busy);
    assert_eq!(engine.state().messages.len(), 2);
    assert_eq!(gateway.request_count(), 0);
}

#[test]
fn approve_plan_sends_the_fixed_message() {
    let gateway = scripted(&["Great, starting now."]);
    let mut engine = engine_with(&gateway);

    engine.approve_plan();

    let requests = gateway.requests();
    assert_eq!(requests, vec![vec![ChatTurn::user(APPROVE_PLAN_MESSAGE)]]);
}

#[test]
fn rollback_truncates_to_anchor_and_is_idempotent() {
    let gateway = scripted(&["a1", "a2", "a3"]);
    let mut engine = engine_with(&gateway);
    engine.send_message("q1");
    engine.send_message("q2");
    engine.send_message("q3");
    assert_eq!(engine.state().messages.len(), 6);

    let first = engine.state().checkpoints[0].clone();
    engine.rollback_to_checkpoint(&first.id);

    let after_once = engine.state().clone();
    assert_eq!(after_once.messages.len(), 2);
    assert_eq!(after_once.messages[1].id, first.after_message_id);
    assert_eq!(after_once.checkpoints, vec![first.clone()]);

    engine.rollback_to_checkpoint(&first.id);
    assert_eq!(engine.state(), &after_once);

    engine.rollback_to_checkpoint("no-such-checkpoint");
    assert_eq!(engine.state(), &after_once);
}

#[test]
fn streaming_patches_placeholder_and_forwards_chunks() {
    let gateway = scripted(&["alpha beta gamma"]);
    let mut engine = streaming_engine_with(&gateway);

    let mut chunks = Vec::new();
    let outcome = engine.send_message_with("go", &mut |chunk| chunks.push(chunk.to_string()));

    assert!(matches!(outcome, SendOutcome::Completed { .. }));
    assert!(chunks.len() > 1);
    assert_eq!(chunks.concat(), "alpha beta gamma");
    let state = engine.state();
    assert_eq!(state.messages[1].content, "alpha beta gamma");
    assert_eq!(state.checkpoints.len(), 1);
}

#[test]
fn available_models_come_from_the_gateway() {
    let gateway = MockGateway::new();
    let engine = engine_with(&gateway);

    assert_eq!(
        engine.available_models("openrouter").expect("models").first().map(String::as_str),
        Some("deepseek/deepseek-prover-v2:free")
    );
    let error = engine.available_models("").expect_err("blank provider");
    assert_eq!(error.status(), Some(400));
}
