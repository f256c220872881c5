mod support;

use chat_agent::app::{Notice, NoticeKind};
use chat_agent::engine::APPROVE_PLAN_MESSAGE;
use gateway_mock::MockGateway;
use pretty_assertions::assert_eq;

use support::{app_with, rate_limited, scripted};

const PLAN_REPLY: &str = "Here's my implementation plan:\n- Scaffold the form\n- Add validation";

#[test]
fn approve_requires_a_plan() {
    let gateway = scripted(&["no plan here"]);
    let mut app = app_with(&gateway);
    app.submit("build a form");
    app.drain_notices();

    app.submit("/approve");

    assert_eq!(
        app.drain_notices(),
        vec![Notice::info("There is no implementation plan to approve")]
    );
    assert_eq!(gateway.request_count(), 1);
}

#[test]
fn approve_sends_fixed_text_after_a_plan() {
    let gateway = scripted(&[PLAN_REPLY, "On it."]);
    let mut app = app_with(&gateway);
    app.submit("build a form");

    app.submit("/approve");

    let requests = gateway.requests();
    assert_eq!(requests.len(), 2);
    let last_turn = requests[1].last().expect("approval turn");
    assert_eq!(last_turn.content, APPROVE_PLAN_MESSAGE);
    assert_eq!(app.engine().state().checkpoints.len(), 2);

    let lines = app.render(80);
    assert!(lines.contains(&"  [x] 1. Scaffold the form".to_string()));
    assert!(lines.contains(&"  [x] 2. Add validation".to_string()));
}

#[test]
fn checkpoints_listing_and_rollback_by_ordinal() {
    let gateway = scripted(&["first", "second"]);
    let mut app = app_with(&gateway);
    app.submit("one");
    app.submit("two");

    app.submit("/checkpoints");
    let listing = app.drain_notices();
    assert_eq!(listing.len(), 2);
    let first_id = app.engine().state().checkpoints[0].id.clone();
    assert_eq!(listing[0].text, format!("#1 {first_id} first"));

    app.submit("/rollback #1");
    assert_eq!(
        app.drain_notices(),
        vec![Notice::info("Rolled back to checkpoint #1")]
    );
    assert_eq!(app.engine().state().messages.len(), 2);
    assert_eq!(app.engine().state().checkpoints.len(), 1);
}

#[test]
fn rollback_by_id_and_unknown_targets() {
    let gateway = scripted(&["first", "second"]);
    let mut app = app_with(&gateway);
    app.submit("one");
    app.submit("two");
    let second_id = app.engine().state().checkpoints[1].id.clone();

    app.submit(&format!("/rollback {second_id}"));
    assert_eq!(
        app.drain_notices(),
        vec![Notice::info("Rolled back to checkpoint #2")]
    );
    assert_eq!(app.engine().state().messages.len(), 4);

    app.submit("/rollback #9");
    app.submit("/rollback");
    let notices = app.drain_notices();
    assert_eq!(notices.len(), 2);
    assert!(notices.iter().all(|notice| notice.kind == NoticeKind::Error));
    assert_eq!(notices[0].text, "Unknown checkpoint");
}

#[test]
fn failed_reply_becomes_error_notice_and_failed_block() {
    let gateway = MockGateway::scripted(vec![Err(rate_limited())]);
    let mut app = app_with(&gateway);

    app.submit("Hello");

    assert_eq!(app.drain_notices(), vec![Notice::error("rate limited")]);
    let lines = app.render(80);
    assert_eq!(
        lines.last().map(String::as_str),
        Some("  (no reply: the request failed)")
    );
}

#[test]
fn models_lists_for_current_or_named_provider() {
    let mut app = app_with(&MockGateway::new());

    app.submit("/models");
    app.submit("/models nowhere");

    assert_eq!(
        app.drain_notices(),
        vec![
            Notice::info("Models for groq: compound-beta, llama3-8b, llama3-70b, mixtral-8x7b"),
            Notice::info("No models available for nowhere"),
        ]
    );
}

#[test]
fn reset_starts_an_empty_conversation() {
    let mut app = app_with(&MockGateway::new());
    app.submit("Hello");
    let before = app.engine().state().conversation_id.clone();

    app.submit("/reset");

    let state = app.engine().state();
    assert!(state.messages.is_empty());
    assert!(state.checkpoints.is_empty());
    assert_ne!(state.conversation_id, before);
}

#[test]
fn code_view_shows_only_code_blocks() {
    let gateway = scripted(&["Try this:\n```rust\nfn main() {}\n```"]);
    let mut app = app_with(&gateway);
    app.submit("show code");

    let full = app.render(80);
    assert!(full.contains(&"  Try this:".to_string()));

    app.submit("/code");
    let code_only = app.render(80);
    assert!(code_only.contains(&"  │ fn main() {}".to_string()));
}
