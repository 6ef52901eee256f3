#![deny(unsafe_code)]

//! Shared vocabulary of the salon client: typed ids, the chat domain model, backend
//! payloads, the member action matrix and the pure render model.

/// Role-gated moderation actions.
pub mod actions;
pub mod error;
pub mod ids;
/// Domain entities and the sync cursor.
pub mod model;
pub mod render;
pub mod wire;

pub use actions::{MemberAction, allowed_actions, is_allowed};
pub use error::{CoreError, CoreResult};
pub use ids::{MessageId, RoomId, UserId};
pub use model::{
    LastMessage, Member, Message, Role, RoomInfo, RoomState, RoomSummary, SYSTEM_PREFIX,
    SyncCursor,
};
pub use render::{
    DELETED_PLACEHOLDER, EMPTY_ROOMS_PLACEHOLDER, MemberGroupView, MemberRowView, MessageTone,
    MessageView, NO_MESSAGES_PREVIEW, RoomItemView, RoomListView, RoomPreview, RoomStateView,
    TimeAgo, render_message, render_room_list, render_room_state, render_typing,
};
pub use wire::{
    ErrorBody, MessagesQuery, MessagesResponse, RoomListResponse, RoomStateResponse,
    RoomSummaryPayload, SendResponse, TypingResponse,
};
