use std::future::Future;
use std::pin::Pin;

use salon_core::{
    MemberAction, MessageId, MessagesQuery, MessagesResponse, RoomId, RoomListResponse,
    RoomStateResponse, SendResponse, TypingResponse, UserId,
};

use super::error::BackendResult;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Request/response surface of the chat backend.
///
/// Every engine talks to the server through this trait only, so the HTTP transport can be
/// swapped for a scripted one in tests. Implementations must not retry: failure policy is
/// decided by the caller.
pub trait ChatBackend: Send + Sync {
    /// Messages with an id greater than `query.after`, plus deletions since `query.since`.
    fn messages(
        &self,
        room: RoomId,
        query: MessagesQuery,
    ) -> BoxFuture<'_, BackendResult<MessagesResponse>>;

    fn send_message<'a>(
        &'a self,
        room: RoomId,
        content: &'a str,
    ) -> BoxFuture<'a, BackendResult<SendResponse>>;

    fn delete_message(&self, room: RoomId, message_id: MessageId)
    -> BoxFuture<'_, BackendResult<()>>;

    fn typing_ping(&self, room: RoomId) -> BoxFuture<'_, BackendResult<()>>;

    fn typing_state(&self, room: RoomId) -> BoxFuture<'_, BackendResult<TypingResponse>>;

    fn room_list(&self) -> BoxFuture<'_, BackendResult<RoomListResponse>>;

    fn room_state(&self, room: RoomId) -> BoxFuture<'_, BackendResult<RoomStateResponse>>;

    /// Promote, demote, ban or unban exactly one member.
    fn change_role(
        &self,
        room: RoomId,
        user_id: UserId,
        action: MemberAction,
    ) -> BoxFuture<'_, BackendResult<()>>;
}
