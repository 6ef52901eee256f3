//! View seams the engines draw into. Each engine owns exactly one surface.

use salon_core::{MessageId, MessageView, RoomListView, RoomStateView};

use super::events::AccessLost;

/// Scroll geometry of the message list, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollMetrics {
    pub scroll_height: f64,
    pub scroll_top: f64,
    pub client_height: f64,
}

impl ScrollMetrics {
    pub fn distance_from_bottom(&self) -> f64 {
        (self.scroll_height - self.scroll_top - self.client_height).max(0.0)
    }
}

pub trait MessageSurface: Send + Sync {
    /// Inserts a new row right after the row `after`, or at the top when `after` is `None`.
    fn insert_message(&self, after: Option<MessageId>, row: &MessageView);

    /// Redraws an already displayed row in place.
    fn replace_message(&self, row: &MessageView);

    fn scroll_metrics(&self) -> ScrollMetrics;

    fn scroll_to_bottom(&self);

    fn clear_input(&self);
}

pub trait TypingSurface: Send + Sync {
    /// `None` hides the typing line.
    fn show_typing(&self, line: Option<&str>);
}

pub trait DirectorySurface: Send + Sync {
    fn show_rooms(&self, view: &RoomListView);
}

pub trait RoomStateSurface: Send + Sync {
    fn show_room_state(&self, view: &RoomStateView);
}

/// Leaves the room once the viewer lost access to it.
pub trait Navigator: Send + Sync {
    fn navigate_away(&self, event: &AccessLost);
}
