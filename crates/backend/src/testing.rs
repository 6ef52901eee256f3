//! In-memory `ChatBackend` whose replies are queued up front by a test.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use salon_core::{
    MemberAction, MessageId, MessagesQuery, MessagesResponse, RoomId, RoomListResponse,
    RoomStateResponse, SendResponse, TypingResponse, UserId,
};

use super::backend::{BoxFuture, ChatBackend};
use super::error::{BackendError, BackendResult};

/// One queued reply, optionally delivered after a delay on the tokio clock.
#[derive(Debug)]
pub struct Scripted<T> {
    delay: Duration,
    result: BackendResult<T>,
}

impl<T> Scripted<T> {
    pub fn ok(value: T) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Ok(value),
        }
    }

    pub fn err(error: BackendError) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Err(error),
        }
    }

    /// Answers with `status` the way the HTTP backend reports a non-2xx response.
    pub fn status(endpoint: &str, status: u16) -> Self {
        Self::err(BackendError::Status {
            stage: "scripted-reply",
            endpoint: endpoint.to_string(),
            status,
            code: None,
        })
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Request observed by the scripted backend, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    Messages { room: RoomId, query: MessagesQuery },
    Send { room: RoomId, content: String },
    Delete { room: RoomId, message_id: MessageId },
    TypingPing { room: RoomId },
    TypingState { room: RoomId },
    RoomList,
    RoomState { room: RoomId },
    ChangeRole {
        room: RoomId,
        user_id: UserId,
        action: MemberAction,
    },
}

#[derive(Default)]
struct Script {
    messages: VecDeque<Scripted<MessagesResponse>>,
    sends: VecDeque<Scripted<SendResponse>>,
    deletes: VecDeque<Scripted<()>>,
    typing_pings: VecDeque<Scripted<()>>,
    typing_states: VecDeque<Scripted<TypingResponse>>,
    room_lists: VecDeque<Scripted<RoomListResponse>>,
    room_states: VecDeque<Scripted<RoomStateResponse>>,
    role_changes: VecDeque<Scripted<()>>,
    calls: Vec<BackendCall>,
}

/// Backend that replays queued replies; an empty queue answers with the payload's default.
#[derive(Default)]
pub struct ScriptedBackend {
    script: Mutex<Script>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn script_messages(&self, reply: Scripted<MessagesResponse>) {
        self.script().messages.push_back(reply);
    }

    pub fn script_send(&self, reply: Scripted<SendResponse>) {
        self.script().sends.push_back(reply);
    }

    pub fn script_delete(&self, reply: Scripted<()>) {
        self.script().deletes.push_back(reply);
    }

    pub fn script_typing_ping(&self, reply: Scripted<()>) {
        self.script().typing_pings.push_back(reply);
    }

    pub fn script_typing_state(&self, reply: Scripted<TypingResponse>) {
        self.script().typing_states.push_back(reply);
    }

    pub fn script_room_list(&self, reply: Scripted<RoomListResponse>) {
        self.script().room_lists.push_back(reply);
    }

    pub fn script_room_state(&self, reply: Scripted<RoomStateResponse>) {
        self.script().room_states.push_back(reply);
    }

    pub fn script_role_change(&self, reply: Scripted<()>) {
        self.script().role_changes.push_back(reply);
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.script().calls.clone()
    }

    pub fn count_calls(&self, matches: impl Fn(&BackendCall) -> bool) -> usize {
        self.script().calls.iter().filter(|call| matches(call)).count()
    }

    fn record<T: Default>(
        &self,
        call: BackendCall,
        queue: impl FnOnce(&mut Script) -> &mut VecDeque<Scripted<T>>,
    ) -> Scripted<T> {
        let mut script = self.script();
        script.calls.push(call);
        queue(&mut script)
            .pop_front()
            .unwrap_or_else(|| Scripted::ok(T::default()))
    }
}

async fn deliver<T>(reply: Scripted<T>) -> BackendResult<T> {
    if !reply.delay.is_zero() {
        tokio::time::sleep(reply.delay).await;
    }
    reply.result
}

impl ChatBackend for ScriptedBackend {
    fn messages(
        &self,
        room: RoomId,
        query: MessagesQuery,
    ) -> BoxFuture<'_, BackendResult<MessagesResponse>> {
        let reply = self.record(BackendCall::Messages { room, query }, |script| {
            &mut script.messages
        });
        Box::pin(deliver(reply))
    }

    fn send_message<'a>(
        &'a self,
        room: RoomId,
        content: &'a str,
    ) -> BoxFuture<'a, BackendResult<SendResponse>> {
        let call = BackendCall::Send {
            room,
            content: content.to_string(),
        };
        let reply = self.record(call, |script| &mut script.sends);
        Box::pin(deliver(reply))
    }

    fn delete_message(
        &self,
        room: RoomId,
        message_id: MessageId,
    ) -> BoxFuture<'_, BackendResult<()>> {
        let reply = self.record(BackendCall::Delete { room, message_id }, |script| {
            &mut script.deletes
        });
        Box::pin(deliver(reply))
    }

    fn typing_ping(&self, room: RoomId) -> BoxFuture<'_, BackendResult<()>> {
        let reply = self.record(BackendCall::TypingPing { room }, |script| {
            &mut script.typing_pings
        });
        Box::pin(deliver(reply))
    }

    fn typing_state(&self, room: RoomId) -> BoxFuture<'_, BackendResult<TypingResponse>> {
        let reply = self.record(BackendCall::TypingState { room }, |script| {
            &mut script.typing_states
        });
        Box::pin(deliver(reply))
    }

    fn room_list(&self) -> BoxFuture<'_, BackendResult<RoomListResponse>> {
        let reply = self.record(BackendCall::RoomList, |script| &mut script.room_lists);
        Box::pin(deliver(reply))
    }

    fn room_state(&self, room: RoomId) -> BoxFuture<'_, BackendResult<RoomStateResponse>> {
        let reply = self.record(BackendCall::RoomState { room }, |script| {
            &mut script.room_states
        });
        Box::pin(deliver(reply))
    }

    fn change_role(
        &self,
        room: RoomId,
        user_id: UserId,
        action: MemberAction,
    ) -> BoxFuture<'_, BackendResult<()>> {
        let call = BackendCall::ChangeRole {
            room,
            user_id,
            action,
        };
        let reply = self.record(call, |script| &mut script.role_changes);
        Box::pin(deliver(reply))
    }
}
