use std::sync::Arc;
use std::time::Duration;

use salon_backend::ChatBackend;
use salon_core::{MemberAction, Message, MessageId, RoomId, UserId};

use super::access::RoomAccess;
use super::config::{ClientConfig, PollingConfig};
use super::directory::RoomDirectorySyncEngine;
use super::failure::UserActionResult;
use super::messages::MessageSyncEngine;
use super::presence::PresenceTracker;
use super::room_state::RoomStateSyncEngine;
use super::scheduler::PollHandle;
use super::send::SendPipeline;
use super::surface::{
    DirectorySurface, MessageSurface, Navigator, RoomStateSurface, TypingSurface,
};

/// Views a room session draws into.
#[derive(Clone)]
pub struct RoomSurfaces {
    pub messages: Arc<dyn MessageSurface>,
    pub typing: Arc<dyn TypingSurface>,
    pub room_state: Arc<dyn RoomStateSurface>,
    pub navigator: Arc<dyn Navigator>,
}

/// Every loop and action of one open room: messages, typing presence and room state.
pub struct RoomSession {
    room: RoomId,
    polling: PollingConfig,
    access: Arc<RoomAccess>,
    messages: Arc<MessageSyncEngine>,
    presence: Arc<PresenceTracker>,
    room_state: Arc<RoomStateSyncEngine>,
    send: SendPipeline,
    handles: Vec<PollHandle>,
}

impl RoomSession {
    pub fn new(
        config: &ClientConfig,
        room: RoomId,
        backend: Arc<dyn ChatBackend>,
        surfaces: RoomSurfaces,
    ) -> Self {
        let redirect_to = config.backend.routes().room_detail(room);
        let access = Arc::new(RoomAccess::new(room, redirect_to, surfaces.navigator));

        let messages = Arc::new(MessageSyncEngine::new(
            config,
            Arc::clone(&backend),
            surfaces.messages,
            Arc::clone(&access),
        ));
        let presence = Arc::new(PresenceTracker::new(
            config,
            Arc::clone(&backend),
            surfaces.typing,
            Arc::clone(&access),
        ));
        let room_state = Arc::new(RoomStateSyncEngine::new(
            config,
            backend,
            surfaces.room_state,
            Arc::clone(&access),
        ));

        Self {
            room,
            polling: config.polling.clone(),
            access,
            send: SendPipeline::new(Arc::clone(&messages)),
            messages,
            presence,
            room_state,
            handles: Vec::new(),
        }
    }

    pub fn room(&self) -> RoomId {
        self.room
    }

    /// Starts the three poll loops. Starting a running session does nothing.
    pub fn start(&mut self) {
        if !self.handles.is_empty() {
            return;
        }

        self.handles = vec![
            PollHandle::start(Arc::clone(&self.messages), self.polling.messages()),
            PollHandle::start(Arc::clone(&self.presence), self.polling.typing()),
            PollHandle::start(Arc::clone(&self.room_state), self.polling.room_state()),
        ];
        tracing::info!(room_id = %self.room, "room session started");
    }

    /// Stops every loop of the room; responses still in flight are discarded.
    pub fn stop(&mut self) {
        if self.handles.is_empty() {
            return;
        }

        for handle in &mut self.handles {
            handle.stop();
        }
        self.handles.clear();
        tracing::info!(room_id = %self.room, "room session stopped");
    }

    /// Stops every loop and waits for the workers to exit.
    pub async fn shutdown(&mut self) {
        let handles = std::mem::take(&mut self.handles);
        for handle in handles {
            handle.shutdown().await;
        }
        tracing::info!(room_id = %self.room, "room session shut down");
    }

    pub fn is_running(&self) -> bool {
        self.handles.iter().any(PollHandle::is_running)
    }

    pub fn is_access_lost(&self) -> bool {
        self.access.is_lost()
    }

    pub fn messages(&self) -> &Arc<MessageSyncEngine> {
        &self.messages
    }

    pub fn presence(&self) -> &Arc<PresenceTracker> {
        &self.presence
    }

    pub fn room_state(&self) -> &Arc<RoomStateSyncEngine> {
        &self.room_state
    }

    pub async fn send(&self, content: &str) -> UserActionResult<Option<Message>> {
        self.send.send(content).await
    }

    pub async fn delete(&self, message_id: MessageId) -> UserActionResult<()> {
        self.send.delete(message_id).await
    }

    pub fn input_changed(&self) -> bool {
        self.presence.input_changed()
    }

    pub async fn request_role_change(
        &self,
        user_id: UserId,
        action: MemberAction,
    ) -> UserActionResult<()> {
        self.room_state.request_role_change(user_id, action).await
    }
}

/// Room directory page: a single room list loop.
pub struct DirectorySession {
    period: Duration,
    directory: Arc<RoomDirectorySyncEngine>,
    handle: Option<PollHandle>,
}

impl DirectorySession {
    pub fn new(
        config: &ClientConfig,
        backend: Arc<dyn ChatBackend>,
        surface: Arc<dyn DirectorySurface>,
    ) -> Self {
        let room_detail_base = config.backend.routes().room_detail_base();
        Self {
            period: config.polling.rooms(),
            directory: Arc::new(RoomDirectorySyncEngine::new(
                backend,
                surface,
                room_detail_base,
            )),
            handle: None,
        }
    }

    pub fn start(&mut self) {
        if self.handle.is_some() {
            return;
        }
        self.handle = Some(PollHandle::start(Arc::clone(&self.directory), self.period));
        tracing::info!("directory session started");
    }

    pub fn stop(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            handle.stop();
            tracing::info!("directory session stopped");
        }
    }

    pub async fn shutdown(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.shutdown().await;
            tracing::info!("directory session shut down");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(PollHandle::is_running)
    }

    pub fn directory(&self) -> &Arc<RoomDirectorySyncEngine> {
        &self.directory
    }
}
