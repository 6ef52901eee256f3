use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use salon_backend::{BoxFuture, ChatBackend};
use salon_core::{RoomId, render_typing};
use tokio::time::Instant;

use super::access::RoomAccess;
use super::config::ClientConfig;
use super::failure::PollFailure;
use super::scheduler::{PollOutcome, PollTask};
use super::sequence::RequestSequence;
use super::surface::TypingSurface;

const ENDPOINT: &str = "typing";

/// Leading-edge debounce: the first event fires, later ones inside the window are dropped.
#[derive(Debug, Clone)]
pub struct TypingDebounce {
    min_interval: Duration,
    last_sent: Option<Instant>,
}

impl TypingDebounce {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_sent: None,
        }
    }

    /// Returns `true` when a ping should go out at `now`, and records it as sent.
    pub fn should_ping(&mut self, now: Instant) -> bool {
        let ready = self
            .last_sent
            .is_none_or(|last| now.saturating_duration_since(last) >= self.min_interval);
        if ready {
            self.last_sent = Some(now);
        }
        ready
    }
}

/// Outbound typing pings and the inbound "who is typing" line of one room.
pub struct PresenceTracker {
    room: RoomId,
    backend: Arc<dyn ChatBackend>,
    surface: Arc<dyn TypingSurface>,
    access: Arc<RoomAccess>,
    debounce: Mutex<TypingDebounce>,
    sequence: RequestSequence,
}

impl PresenceTracker {
    pub fn new(
        config: &ClientConfig,
        backend: Arc<dyn ChatBackend>,
        surface: Arc<dyn TypingSurface>,
        access: Arc<RoomAccess>,
    ) -> Self {
        Self {
            room: access.room(),
            backend,
            surface,
            access,
            debounce: Mutex::new(TypingDebounce::new(
                config.polling.typing_ping_min_interval(),
            )),
            sequence: RequestSequence::new(),
        }
    }

    /// Handles one local input change. The ping is sent in the background and never awaited.
    ///
    /// Returns whether a ping was issued.
    pub fn input_changed(self: &Arc<Self>) -> bool {
        if self.access.is_lost() {
            return false;
        }

        let should_ping = self
            .debounce
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .should_ping(Instant::now());
        if !should_ping {
            return false;
        }

        let tracker = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(error) = tracker.backend.typing_ping(tracker.room).await {
                tracing::debug!(
                    room_id = %tracker.room,
                    error = %error,
                    "typing ping failed"
                );
            }
        });
        true
    }

    /// Fetches the typing set and replaces the typing line with it.
    pub async fn poll_once(&self) -> PollOutcome<Vec<String>> {
        if self.access.is_lost() {
            return PollOutcome::Closed;
        }

        let ticket = self.sequence.issue();
        let result = self.backend.typing_state(self.room).await;

        if !self.sequence.is_current(ticket) {
            tracing::debug!(
                room_id = %self.room,
                ticket = ticket.get(),
                "discarding stale typing response"
            );
            return PollOutcome::Stale;
        }
        if self.access.is_lost() {
            return PollOutcome::Closed;
        }

        match result {
            Ok(response) => {
                let line = render_typing(&response.typing);
                self.surface.show_typing(line.as_deref());
                PollOutcome::Applied(response.typing)
            }
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
                            "typing poll failed; clearing typing line"
                        );
                        self.surface.show_typing(None);
                    }
                }
                PollOutcome::Failed(failure)
            }
        }
    }
}

impl PollTask for PresenceTracker {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_event_fires_immediately() {
        let mut debounce = TypingDebounce::new(Duration::from_millis(800));
        assert!(debounce.should_ping(Instant::now()));
    }

    #[test]
    fn events_inside_the_window_are_dropped() {
        let start = Instant::now();
        let mut debounce = TypingDebounce::new(Duration::from_millis(800));

        assert!(debounce.should_ping(start));
        assert!(!debounce.should_ping(start + Duration::from_millis(100)));
        assert!(!debounce.should_ping(start + Duration::from_millis(799)));
        assert!(debounce.should_ping(start + Duration::from_millis(800)));
        // The window restarts at the last sent ping, not at the last event.
        assert!(!debounce.should_ping(start + Duration::from_millis(1_500)));
        assert!(debounce.should_ping(start + Duration::from_millis(1_600)));
    }

    #[test]
    fn at_most_one_ping_per_window_under_a_burst() {
        let start = Instant::now();
        let window = Duration::from_millis(800);
        let mut debounce = TypingDebounce::new(window);

        let sent = (0..500u64)
            .map(|step| start + Duration::from_millis(step * 7))
            .filter(|&at| debounce.should_ping(at))
            .collect::<Vec<_>>();

        for pair in sent.windows(2) {
            assert!(pair[1] - pair[0] >= window);
        }
        assert!(sent.len() > 1);
    }
}
