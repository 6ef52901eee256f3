mod common;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use common::RecordingDirectory;
use salon_backend::testing::{BackendCall, Scripted, ScriptedBackend};
use salon_core::{
    EMPTY_ROOMS_PLACEHOLDER, RoomId, RoomListResponse, RoomListView, RoomPreview,
    RoomSummaryPayload,
};
use salon_sync::{DirectorySession, PollFailure, PollOutcome};

fn room(id: u64, name: &str) -> RoomSummaryPayload {
    RoomSummaryPayload {
        id: RoomId::new(id),
        name: name.to_string(),
        has_password: false,
        created_by: "alice".to_string(),
        last_message_content: None,
        last_message_author: None,
        last_message_is_deleted: None,
        last_message_created_at: None,
    }
}

fn rooms(rooms: Vec<RoomSummaryPayload>) -> RoomListResponse {
    RoomListResponse { rooms: Some(rooms) }
}

struct DirectoryHarness {
    backend: Arc<ScriptedBackend>,
    surface: Arc<RecordingDirectory>,
    session: DirectorySession,
}

impl DirectoryHarness {
    fn new() -> Self {
        let backend = Arc::new(ScriptedBackend::new());
        let surface = Arc::new(RecordingDirectory::default());
        let config = common::config("alice", 1);
        let session = DirectorySession::new(&config, backend.clone(), surface.clone());
        Self {
            backend,
            surface,
            session,
        }
    }
}

#[tokio::test]
async fn empty_room_list_renders_the_placeholder() {
    let harness = DirectoryHarness::new();
    harness.backend.script_room_list(Scripted::ok(rooms(Vec::new())));

    let outcome = harness.session.directory().poll_once().await;

    assert_eq!(outcome, PollOutcome::Applied(0));
    assert_eq!(
        harness.surface.views(),
        vec![RoomListView::Empty {
            placeholder: EMPTY_ROOMS_PLACEHOLDER,
        }]
    );
}

#[tokio::test]
async fn every_poll_replaces_the_whole_list() {
    let harness = DirectoryHarness::new();
    let directory = harness.session.directory();
    let mut locked = room(2, "Secret");
    locked.has_password = true;
    locked.last_message_content = Some("psst".to_string());
    locked.last_message_author = Some("bob".to_string());
    locked.last_message_created_at = Some(Utc::now() - chrono::Duration::minutes(5));
    harness
        .backend
        .script_room_list(Scripted::ok(rooms(vec![room(1, "Lobby"), locked])));
    harness
        .backend
        .script_room_list(Scripted::ok(rooms(vec![room(3, "Fresh")])));

    directory.poll_once().await;
    let RoomListView::Rooms(first) = harness.surface.views()[0].clone() else {
        panic!("expected a room list");
    };
    assert_eq!(first.len(), 2);
    assert_eq!(first[0].preview, RoomPreview::NoMessages);
    assert!(first[1].locked);
    assert_eq!(first[1].href, "http://127.0.0.1:8000/rooms/2/");
    assert!(first[1].preview.text().starts_with("bob: psst - 5 min ago"));

    directory.poll_once().await;
    let snapshot = directory.rooms();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].name, "Fresh");
}

#[tokio::test]
async fn response_without_rooms_keeps_the_current_view() {
    let harness = DirectoryHarness::new();
    let directory = harness.session.directory();
    harness
        .backend
        .script_room_list(Scripted::ok(rooms(vec![room(1, "Lobby")])));
    harness
        .backend
        .script_room_list(Scripted::ok(RoomListResponse { rooms: None }));

    directory.poll_once().await;
    directory.poll_once().await;

    assert_eq!(harness.surface.views().len(), 1);
    assert_eq!(directory.rooms().len(), 1);
}

#[tokio::test]
async fn directory_failures_are_always_transient() {
    let harness = DirectoryHarness::new();
    harness
        .backend
        .script_room_list(Scripted::status("room-list", 403));

    let outcome = harness.session.directory().poll_once().await;

    assert_eq!(outcome, PollOutcome::Failed(PollFailure::Transient));
    assert!(harness.surface.views().is_empty());
}

#[tokio::test(start_paused = true)]
async fn loop_polls_every_three_seconds_until_stopped() {
    let mut harness = DirectoryHarness::new();
    harness.session.start();

    tokio::time::sleep(Duration::from_millis(6_500)).await;
    harness.session.shutdown().await;
    tokio::time::sleep(Duration::from_millis(9_000)).await;

    assert_eq!(
        harness
            .backend
            .count_calls(|call| matches!(call, BackendCall::RoomList)),
        3
    );
    assert!(!harness.session.is_running());
}
