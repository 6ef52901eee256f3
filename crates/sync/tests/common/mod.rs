#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};
use salon_backend::testing::ScriptedBackend;
use salon_core::{
    Member, Message, MessageId, MessageView, MessagesResponse, Role, RoomId, RoomInfo,
    RoomListView, RoomStateResponse, RoomStateView, UserId,
};
use salon_sync::{
    AccessLost, ClientConfig, MessageSurface, Navigator, RoomSession, RoomStateSurface,
    RoomSurfaces, ScrollMetrics, TypingSurface,
};

pub const ROOM: RoomId = RoomId::new(4);

pub fn at(seconds: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap() + chrono::Duration::seconds(seconds)
}

pub fn message(id: u64, author: &str, content: &str) -> Message {
    Message {
        id: MessageId::new(id),
        author: author.to_string(),
        content: content.to_string(),
        created_at: at(id as i64),
        is_deleted: false,
        can_delete: true,
    }
}

pub fn batch(ids: &[u64], deleted: &[u64], server_now: Option<DateTime<Utc>>) -> MessagesResponse {
    MessagesResponse {
        messages: ids
            .iter()
            .map(|&id| message(id, "bob", &format!("hello {id}")))
            .collect(),
        deleted_ids: deleted.iter().map(|&id| MessageId::new(id)).collect(),
        server_now,
    }
}

pub fn member(user_id: u64, username: &str, role: Role) -> Member {
    Member {
        user_id: UserId::new(user_id),
        username: username.to_string(),
        role,
    }
}

/// Owner alice(1), moderator bob(2), member carol(3), banned dave(4).
pub fn roster(viewer_role: Role) -> RoomStateResponse {
    RoomStateResponse {
        room: RoomInfo {
            id: Some(ROOM),
            name: "General".to_string(),
        },
        role: Some(viewer_role),
        members: vec![
            member(1, "alice", Role::Owner),
            member(2, "bob", Role::Mod),
            member(3, "carol", Role::Member),
            member(4, "dave", Role::Banned),
        ],
    }
}

pub fn config(current_user: &str, current_user_id: u64) -> ClientConfig {
    ClientConfig {
        room_id: Some(ROOM),
        current_user: Some(current_user.to_string()),
        current_user_id: Some(UserId::new(current_user_id)),
        ..ClientConfig::default()
    }
    .normalized()
}

#[derive(Default)]
pub struct RecordingMessages {
    rows: Mutex<Vec<MessageView>>,
    metrics: Mutex<ScrollMetrics>,
    scrolls: AtomicUsize,
    cleared_inputs: AtomicUsize,
}

impl RecordingMessages {
    pub fn rows(&self) -> Vec<MessageView> {
        self.rows.lock().unwrap().clone()
    }

    pub fn row(&self, id: u64) -> Option<MessageView> {
        self.rows()
            .into_iter()
            .find(|row| row.id == MessageId::new(id))
    }

    pub fn row_ids(&self) -> Vec<u64> {
        self.rows().iter().map(|row| row.id.get()).collect()
    }

    pub fn set_metrics(&self, metrics: ScrollMetrics) {
        *self.metrics.lock().unwrap() = metrics;
    }

    pub fn scrolls(&self) -> usize {
        self.scrolls.load(Ordering::SeqCst)
    }

    pub fn cleared_inputs(&self) -> usize {
        self.cleared_inputs.load(Ordering::SeqCst)
    }
}

impl MessageSurface for RecordingMessages {
    fn insert_message(&self, after: Option<MessageId>, row: &MessageView) {
        let mut rows = self.rows.lock().unwrap();
        let index = match after {
            None => 0,
            Some(after) => {
                rows.iter()
                    .position(|existing| existing.id == after)
                    .expect("predecessor row is displayed")
                    + 1
            }
        };
        rows.insert(index, row.clone());
    }

    fn replace_message(&self, row: &MessageView) {
        let mut rows = self.rows.lock().unwrap();
        if let Some(existing) = rows.iter_mut().find(|existing| existing.id == row.id) {
            *existing = row.clone();
        }
    }

    fn scroll_metrics(&self) -> ScrollMetrics {
        *self.metrics.lock().unwrap()
    }

    fn scroll_to_bottom(&self) {
        self.scrolls.fetch_add(1, Ordering::SeqCst);
    }

    fn clear_input(&self) {
        self.cleared_inputs.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct RecordingTyping {
    lines: Mutex<Vec<Option<String>>>,
}

impl RecordingTyping {
    pub fn last(&self) -> Option<Option<String>> {
        self.lines.lock().unwrap().last().cloned()
    }
}

impl TypingSurface for RecordingTyping {
    fn show_typing(&self, line: Option<&str>) {
        self.lines.lock().unwrap().push(line.map(str::to_string));
    }
}

#[derive(Default)]
pub struct RecordingRoomState {
    views: Mutex<Vec<RoomStateView>>,
}

impl RecordingRoomState {
    pub fn last(&self) -> Option<RoomStateView> {
        self.views.lock().unwrap().last().cloned()
    }
}

impl RoomStateSurface for RecordingRoomState {
    fn show_room_state(&self, view: &RoomStateView) {
        self.views.lock().unwrap().push(view.clone());
    }
}

#[derive(Default)]
pub struct RecordingDirectory {
    views: Mutex<Vec<RoomListView>>,
}

impl RecordingDirectory {
    pub fn views(&self) -> Vec<RoomListView> {
        self.views.lock().unwrap().clone()
    }
}

impl salon_sync::DirectorySurface for RecordingDirectory {
    fn show_rooms(&self, view: &RoomListView) {
        self.views.lock().unwrap().push(view.clone());
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    events: Mutex<Vec<AccessLost>>,
}

impl RecordingNavigator {
    pub fn events(&self) -> Vec<AccessLost> {
        self.events.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate_away(&self, event: &AccessLost) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// A room session wired to a scripted backend and recording surfaces.
pub struct RoomHarness {
    pub backend: Arc<ScriptedBackend>,
    pub messages: Arc<RecordingMessages>,
    pub typing: Arc<RecordingTyping>,
    pub room_state: Arc<RecordingRoomState>,
    pub navigator: Arc<RecordingNavigator>,
    pub session: RoomSession,
}

impl RoomHarness {
    pub fn new(config: &ClientConfig) -> Self {
        let backend = Arc::new(ScriptedBackend::new());
        let messages = Arc::new(RecordingMessages::default());
        let typing = Arc::new(RecordingTyping::default());
        let room_state = Arc::new(RecordingRoomState::default());
        let navigator = Arc::new(RecordingNavigator::default());

        let surfaces = RoomSurfaces {
            messages: messages.clone(),
            typing: typing.clone(),
            room_state: room_state.clone(),
            navigator: navigator.clone(),
        };
        let session = RoomSession::new(config, ROOM, backend.clone(), surfaces);

        Self {
            backend,
            messages,
            typing,
            room_state,
            navigator,
            session,
        }
    }

    /// Harness for viewer alice (user 1).
    pub fn for_alice() -> Self {
        Self::new(&config("alice", 1))
    }
}
