use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use salon_backend::{BoxFuture, ChatBackend};
use salon_core::{RoomListView, RoomSummary, render_room_list};

use super::failure::PollFailure;
use super::scheduler::{PollOutcome, PollTask};
use super::sequence::RequestSequence;
use super::surface::DirectorySurface;

const ENDPOINT: &str = "room-list";

/// Room directory, replaced wholesale by every applied poll.
pub struct RoomDirectorySyncEngine {
    backend: Arc<dyn ChatBackend>,
    surface: Arc<dyn DirectorySurface>,
    room_detail_base: String,
    rooms: ArcSwap<Vec<RoomSummary>>,
    sequence: RequestSequence,
}

impl RoomDirectorySyncEngine {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        surface: Arc<dyn DirectorySurface>,
        room_detail_base: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            surface,
            room_detail_base: room_detail_base.into(),
            rooms: ArcSwap::from_pointee(Vec::new()),
            sequence: RequestSequence::new(),
        }
    }

    pub fn rooms(&self) -> Arc<Vec<RoomSummary>> {
        self.rooms.load_full()
    }

    /// Renders the current snapshot with ages relative to `now`.
    pub fn render_at(&self, now: DateTime<Utc>) -> RoomListView {
        render_room_list(&self.rooms.load(), now, &self.room_detail_base)
    }

    pub async fn poll_once(&self) -> PollOutcome<usize> {
        let ticket = self.sequence.issue();
        let result = self.backend.room_list().await;

        if !self.sequence.is_current(ticket) {
            tracing::debug!(ticket = ticket.get(), "discarding stale room list response");
            return PollOutcome::Stale;
        }

        match result {
            Ok(response) => {
                let Some(rooms) = response.into_summaries() else {
                    tracing::debug!("room list response without rooms; keeping current view");
                    return PollOutcome::Applied(self.rooms.load().len());
                };
                let count = rooms.len();
                self.rooms.store(Arc::new(rooms));
                self.surface.show_rooms(&self.render_at(Utc::now()));
                PollOutcome::Applied(count)
            }
            Err(error) => {
                tracing::debug!(error = %error, "room list poll failed; retrying on next tick");
                PollOutcome::Failed(PollFailure::classify(&error, false))
            }
        }
    }
}

impl PollTask for RoomDirectorySyncEngine {
    fn name(&self) -> &'static str {
        ENDPOINT
    }

    fn is_closed(&self) -> bool {
        false
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
