mod common;

use common::{RoomHarness, at, batch, message};
use salon_backend::testing::{BackendCall, Scripted};
use salon_core::{DELETED_PLACEHOLDER, MessageId, SendResponse};
use salon_sync::UserActionError;

fn confirmed(id: u64, content: &str) -> SendResponse {
    SendResponse {
        ok: true,
        message: Some(message(id, "alice", content)),
    }
}

#[tokio::test]
async fn blank_input_is_ignored() {
    let harness = RoomHarness::for_alice();

    let sent = harness.session.send("   \n\t").await.unwrap();

    assert_eq!(sent, None);
    assert!(harness.backend.calls().is_empty());
    assert_eq!(harness.messages.cleared_inputs(), 0);
}

#[tokio::test]
async fn confirmed_message_is_appended_without_moving_the_cursor() {
    let harness = RoomHarness::for_alice();
    let engine = harness.session.messages();
    harness
        .backend
        .script_messages(Scripted::ok(batch(&[1], &[], Some(at(1)))));
    harness.backend.script_send(Scripted::ok(confirmed(5, "hi all")));
    engine.poll_once().await;
    let scrolls_before = harness.messages.scrolls();

    let sent = harness.session.send("  hi all  ").await.unwrap().unwrap();

    assert_eq!(sent.id, MessageId::new(5));
    assert_eq!(harness.messages.row_ids(), vec![1, 5]);
    assert_eq!(harness.messages.cleared_inputs(), 1);
    assert_eq!(harness.messages.scrolls(), scrolls_before + 1);
    assert_eq!(engine.cursor().last_seen_id, MessageId::new(1));
    assert_eq!(
        harness.backend.calls()[1],
        BackendCall::Send {
            room: common::ROOM,
            content: "hi all".to_string(),
        }
    );
}

#[tokio::test]
async fn poll_redelivering_a_sent_message_does_not_duplicate_it() {
    let harness = RoomHarness::for_alice();
    let engine = harness.session.messages();
    harness.backend.script_send(Scripted::ok(confirmed(3, "mine")));
    harness
        .backend
        .script_messages(Scripted::ok(batch(&[2, 3], &[], Some(at(3)))));

    harness.session.send("mine").await.unwrap();
    let poll = engine.poll_once().await.applied().unwrap();

    assert_eq!(poll.new_messages, vec![MessageId::new(2)]);
    assert_eq!(harness.messages.row_ids(), vec![2, 3]);
    assert_eq!(engine.messages().len(), 2);
    assert_eq!(engine.cursor().last_seen_id, MessageId::new(3));
}

#[tokio::test]
async fn late_poll_rows_are_placed_before_a_newer_sent_message() {
    let harness = RoomHarness::for_alice();
    let engine = harness.session.messages();
    harness
        .backend
        .script_messages(Scripted::ok(batch(&[1], &[], Some(at(1)))));
    harness.backend.script_send(Scripted::ok(confirmed(3, "mine")));
    harness
        .backend
        .script_messages(Scripted::ok(batch(&[2, 3], &[], Some(at(3)))));

    engine.poll_once().await;
    harness.session.send("mine").await.unwrap();
    engine.poll_once().await;

    let log_ids = engine
        .messages()
        .iter()
        .map(|message| message.id.get())
        .collect::<Vec<_>>();
    assert_eq!(log_ids, vec![1, 2, 3]);
    assert_eq!(harness.messages.row_ids(), log_ids);
}

#[tokio::test]
async fn failed_send_surfaces_status_and_keeps_state() {
    let harness = RoomHarness::for_alice();
    harness.backend.script_send(Scripted::status("send", 500));

    let error = harness.session.send("hello").await.unwrap_err();

    assert!(matches!(error, UserActionError::Request { .. }));
    assert_eq!(error.status(), Some(500));
    assert!(harness.messages.rows().is_empty());
    assert_eq!(harness.messages.cleared_inputs(), 0);
}

#[tokio::test]
async fn unconfirmed_send_is_a_failure_without_status() {
    let harness = RoomHarness::for_alice();
    harness.backend.script_send(Scripted::ok(SendResponse {
        ok: false,
        message: None,
    }));

    let error = harness.session.send("hello").await.unwrap_err();

    assert!(matches!(error, UserActionError::NotConfirmed { .. }));
    assert_eq!(error.status(), None);
    assert!(harness.messages.rows().is_empty());
}

#[tokio::test]
async fn delete_tombstones_immediately() {
    let harness = RoomHarness::for_alice();
    harness
        .backend
        .script_messages(Scripted::ok(batch(&[1, 2], &[], Some(at(2)))));
    harness.session.messages().poll_once().await;

    harness.session.delete(MessageId::new(2)).await.unwrap();

    let row = harness.messages.row(2).unwrap();
    assert_eq!(row.text, DELETED_PLACEHOLDER);
    assert!(!row.deletable);
    assert_eq!(harness.messages.row(1).unwrap().text, "hello 1");
}

#[tokio::test]
async fn failed_delete_keeps_the_message_visible() {
    let harness = RoomHarness::for_alice();
    harness
        .backend
        .script_messages(Scripted::ok(batch(&[1], &[], Some(at(1)))));
    harness.backend.script_delete(Scripted::status("delete", 403));
    harness.session.messages().poll_once().await;

    let error = harness.session.delete(MessageId::new(1)).await.unwrap_err();

    assert_eq!(error.status(), Some(403));
    assert_eq!(harness.messages.row(1).unwrap().text, "hello 1");
    assert!(harness.messages.row(1).unwrap().deletable);
    assert!(
        harness.navigator.events().is_empty(),
        "a refused write is not a lost room"
    );
}
