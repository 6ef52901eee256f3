#![deny(unsafe_code)]

//! Poll-driven synchronization of the salon client: one engine per view slice, each running
//! its own cancellable loop against a [`salon_backend::ChatBackend`].

mod access;
pub mod config;
mod directory;
mod events;
mod failure;
mod messages;
mod presence;
mod room_state;
mod scheduler;
mod scroll;
mod send;
mod sequence;
mod session;
pub mod surface;

pub use access::RoomAccess;
pub use config::{ClientConfig, ConfigError, ConfigStore, PollingConfig};
pub use directory::RoomDirectorySyncEngine;
pub use events::AccessLost;
pub use failure::{PollFailure, UserAction, UserActionError, UserActionResult};
pub use messages::{MergeOutcome, MessageLog, MessagePoll, MessageSyncEngine};
pub use presence::{PresenceTracker, TypingDebounce};
pub use room_state::RoomStateSyncEngine;
pub use scheduler::{PollHandle, PollOutcome, PollTask};
pub use scroll::ScrollPolicy;
pub use send::SendPipeline;
pub use sequence::{RequestSequence, RequestTicket};
pub use session::{DirectorySession, RoomSession, RoomSurfaces};
pub use surface::{
    DirectorySurface, MessageSurface, Navigator, RoomStateSurface, ScrollMetrics, TypingSurface,
};
