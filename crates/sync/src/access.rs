use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use salon_core::RoomId;

use super::events::AccessLost;
use super::surface::Navigator;

/// Room-wide access latch shared by every engine of one room session.
///
/// The first engine that sees a 403 revokes access; the navigator runs exactly once and every
/// engine of the room stops applying responses afterwards.
pub struct RoomAccess {
    room: RoomId,
    redirect_to: String,
    lost: AtomicBool,
    navigator: Arc<dyn Navigator>,
}

impl RoomAccess {
    pub fn new(room: RoomId, redirect_to: impl Into<String>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            room,
            redirect_to: redirect_to.into(),
            lost: AtomicBool::new(false),
            navigator,
        }
    }

    pub fn room(&self) -> RoomId {
        self.room
    }

    pub fn is_lost(&self) -> bool {
        self.lost.load(Ordering::Acquire)
    }

    /// Returns `true` for the call that actually revoked access.
    pub fn revoke(&self, endpoint: &'static str) -> bool {
        if self.lost.swap(true, Ordering::AcqRel) {
            return false;
        }

        let event = AccessLost {
            room: self.room,
            endpoint,
            redirect_to: self.redirect_to.clone(),
        };
        tracing::warn!(
            room_id = %self.room,
            endpoint,
            redirect_to = %event.redirect_to,
            "room access lost; leaving the room"
        );
        self.navigator.navigate_away(&event);
        true
    }
}
