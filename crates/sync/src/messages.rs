use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use salon_backend::{BoxFuture, ChatBackend};
use salon_core::{
    Message, MessageId, MessageView, MessagesQuery, MessagesResponse, RoomId, SyncCursor,
    render_message,
};

use super::access::RoomAccess;
use super::config::ClientConfig;
use super::failure::PollFailure;
use super::scheduler::{PollOutcome, PollTask};
use super::scroll::ScrollPolicy;
use super::sequence::RequestSequence;
use super::surface::MessageSurface;

const ENDPOINT: &str = "messages";

/// Ids touched by one merge.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MergeOutcome {
    /// Newly stored messages, ascending.
    pub appended: Vec<MessageId>,
    /// Already displayed messages that just became tombstones.
    pub tombstoned: Vec<MessageId>,
}

impl MergeOutcome {
    pub fn is_empty(&self) -> bool {
        self.appended.is_empty() && self.tombstoned.is_empty()
    }
}

/// Local message state of one room, keyed and ordered by id.
///
/// Messages are never removed. A deletion reported for an id that has not arrived yet is
/// remembered and applied when the message shows up.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    entries: BTreeMap<MessageId, Message>,
    pending_tombstones: BTreeSet<MessageId>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.entries.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.entries.values()
    }

    /// Id of the stored message directly before `id` in id order.
    pub fn predecessor(&self, id: MessageId) -> Option<MessageId> {
        self.entries.range(..id).next_back().map(|(&before, _)| before)
    }

    /// Stores `message` unless its id is already present. Returns `true` when stored.
    pub fn insert(&mut self, mut message: Message) -> bool {
        if let Some(existing) = self.entries.get_mut(&message.id) {
            if message.is_deleted {
                existing.mark_deleted();
            }
            return false;
        }

        if self.pending_tombstones.remove(&message.id) {
            message.mark_deleted();
        }
        self.entries.insert(message.id, message);
        true
    }

    /// Applies the tombstone transition. Returns `true` only when a stored message changed.
    pub fn tombstone(&mut self, id: MessageId) -> bool {
        match self.entries.get_mut(&id) {
            Some(message) => message.mark_deleted(),
            None => {
                self.pending_tombstones.insert(id);
                false
            }
        }
    }

    pub fn merge(&mut self, response: &MessagesResponse) -> MergeOutcome {
        let mut outcome = MergeOutcome::default();

        for message in &response.messages {
            let id = message.id;
            match self.entries.get_mut(&id) {
                Some(existing) => {
                    if message.is_deleted && existing.mark_deleted() {
                        outcome.tombstoned.push(id);
                    }
                }
                None => {
                    self.insert(message.clone());
                    outcome.appended.push(id);
                }
            }
        }

        for &id in &response.deleted_ids {
            if self.tombstone(id) && !outcome.appended.contains(&id) {
                outcome.tombstoned.push(id);
            }
        }

        outcome.appended.sort_unstable();
        outcome.tombstoned.sort_unstable();
        outcome.tombstoned.dedup();
        outcome
    }
}

/// Result of one applied message poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagePoll {
    pub new_messages: Vec<MessageId>,
    pub deleted_ids: Vec<MessageId>,
    pub next_cursor: SyncCursor,
}

struct MessageState {
    log: MessageLog,
    cursor: SyncCursor,
    scroll: ScrollPolicy,
}

/// Keeps the message list of one room in sync with the backend.
pub struct MessageSyncEngine {
    room: RoomId,
    backend: Arc<dyn ChatBackend>,
    surface: Arc<dyn MessageSurface>,
    access: Arc<RoomAccess>,
    current_user: Option<String>,
    sequence: RequestSequence,
    state: Mutex<MessageState>,
}

impl MessageSyncEngine {
    pub fn new(
        config: &ClientConfig,
        backend: Arc<dyn ChatBackend>,
        surface: Arc<dyn MessageSurface>,
        access: Arc<RoomAccess>,
    ) -> Self {
        Self {
            room: access.room(),
            backend,
            surface,
            access,
            current_user: config.current_user.clone(),
            sequence: RequestSequence::new(),
            state: Mutex::new(MessageState {
                log: MessageLog::new(),
                cursor: SyncCursor::default(),
                scroll: ScrollPolicy::new(f64::from(config.near_bottom_threshold_px)),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, MessageState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn room(&self) -> RoomId {
        self.room
    }

    pub fn cursor(&self) -> SyncCursor {
        self.state().cursor
    }

    /// Snapshot of every stored message, ascending by id.
    pub fn messages(&self) -> Vec<Message> {
        self.state().log.iter().cloned().collect()
    }

    pub fn views(&self) -> Vec<MessageView> {
        self.state()
            .log
            .iter()
            .map(|message| self.render(message))
            .collect()
    }

    fn render(&self, message: &Message) -> MessageView {
        render_message(message, self.current_user.as_deref())
    }

    /// Runs one request/merge cycle.
    pub async fn poll_once(&self) -> PollOutcome<MessagePoll> {
        if self.access.is_lost() {
            return PollOutcome::Closed;
        }

        let ticket = self.sequence.issue();
        let cursor = self.cursor();
        let query = MessagesQuery {
            after: cursor.last_seen_id,
            since: cursor.last_sync_time,
        };
        let result = self.backend.messages(self.room, query).await;

        if !self.sequence.is_current(ticket) {
            tracing::debug!(
                room_id = %self.room,
                ticket = ticket.get(),
                "discarding stale message response"
            );
            return PollOutcome::Stale;
        }
        if self.access.is_lost() {
            return PollOutcome::Closed;
        }

        match result {
            Ok(response) => PollOutcome::Applied(self.apply_response(&response)),
            Err(error) => {
                let failure = PollFailure::classify(&error, true);
                match failure {
                    PollFailure::AccessLost => {
                        self.sequence.retire();
                        self.access.revoke(ENDPOINT);
                    }
                    PollFailure::Transient => {
                        tracing::debug!(
                            room_id = %self.room,
                            error = %error,
                            "message poll failed; retrying on next tick"
                        );
                    }
                }
                PollOutcome::Failed(failure)
            }
        }
    }

    /// Merges one poll response into local state and updates the view.
    pub fn apply_response(&self, response: &MessagesResponse) -> MessagePoll {
        let before_append = self.surface.scroll_metrics();

        let (appended, tombstoned, follow, poll) = {
            let mut state = self.state();
            let outcome = state.log.merge(response);
            let max_seen = response.messages.iter().map(|message| message.id).max();
            state.cursor = state.cursor.advance(max_seen, response.server_now);

            let follow = !outcome.appended.is_empty() && state.scroll.should_follow(before_append);
            let appended = self.render_placed(&state.log, &outcome.appended);
            let tombstoned = self.render_ids(&state.log, &outcome.tombstoned);
            let poll = MessagePoll {
                new_messages: outcome.appended,
                deleted_ids: outcome.tombstoned,
                next_cursor: state.cursor,
            };
            (appended, tombstoned, follow, poll)
        };

        if !appended.is_empty() {
            for (after, row) in &appended {
                self.surface.insert_message(*after, row);
            }
            if follow {
                self.surface.scroll_to_bottom();
            }
        }
        for row in &tombstoned {
            self.surface.replace_message(row);
        }

        poll
    }

    /// Renders new rows with the id each one goes after. `ids` must be ascending.
    fn render_placed(
        &self,
        log: &MessageLog,
        ids: &[MessageId],
    ) -> Vec<(Option<MessageId>, MessageView)> {
        ids.iter()
            .filter_map(|id| log.get(*id))
            .map(|message| (log.predecessor(message.id), self.render(message)))
            .collect()
    }

    fn render_ids(&self, log: &MessageLog, ids: &[MessageId]) -> Vec<MessageView> {
        ids.iter()
            .filter_map(|id| log.get(*id))
            .map(|message| self.render(message))
            .collect()
    }

    /// Inserts a message confirmed by the send endpoint, clears the input and scrolls down.
    pub(crate) fn apply_sent(&self, message: Message) {
        let row = {
            let mut state = self.state();
            let id = message.id;
            if state.log.insert(message) {
                state
                    .log
                    .get(id)
                    .map(|message| (state.log.predecessor(id), self.render(message)))
            } else {
                None
            }
        };

        if let Some((after, row)) = row {
            self.surface.insert_message(after, &row);
        }
        self.surface.clear_input();
        self.surface.scroll_to_bottom();
    }

    /// Tombstones a message right after the delete endpoint confirmed it.
    pub(crate) fn apply_deleted(&self, id: MessageId) -> bool {
        let row = {
            let mut state = self.state();
            if state.log.tombstone(id) {
                state.log.get(id).map(|message| self.render(message))
            } else {
                None
            }
        };

        match row {
            Some(row) => {
                self.surface.replace_message(&row);
                true
            }
            None => false,
        }
    }

    pub(crate) fn backend(&self) -> &dyn ChatBackend {
        self.backend.as_ref()
    }
}

impl PollTask for MessageSyncEngine {
    fn name(&self) -> &'static str {
        ENDPOINT
    }

    fn is_closed(&self) -> bool {
        self.access.is_lost()
    }

    fn tick(&self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            self.poll_once().await;
        })
    }

    fn retire(&self) {
        self.sequence.retire();
    }
}
