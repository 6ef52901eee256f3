use std::sync::Arc;

use arc_swap::ArcSwapOption;
use salon_backend::{BoxFuture, ChatBackend};
use salon_core::{
    MemberAction, RoomId, RoomState, RoomStateView, UserId, is_allowed, render_room_state,
};
use snafu::{OptionExt, ResultExt, ensure};

use super::access::RoomAccess;
use super::config::ClientConfig;
use super::failure::{
    NotPermittedSnafu, PollFailure, RequestSnafu, RoomStateUnavailableSnafu, UnknownMemberSnafu,
    UserAction, UserActionResult,
};
use super::scheduler::{PollOutcome, PollTask};
use super::sequence::RequestSequence;
use super::surface::RoomStateSurface;

const ENDPOINT: &str = "room-state";

/// Room header, viewer role and roster of one room. Role changes are only requested here;
/// the roster changes when the next poll says so.
pub struct RoomStateSyncEngine {
    room: RoomId,
    backend: Arc<dyn ChatBackend>,
    surface: Arc<dyn RoomStateSurface>,
    access: Arc<RoomAccess>,
    current_user: Option<String>,
    current_user_id: Option<UserId>,
    state: ArcSwapOption<RoomState>,
    sequence: RequestSequence,
}

impl RoomStateSyncEngine {
    pub fn new(
        config: &ClientConfig,
        backend: Arc<dyn ChatBackend>,
        surface: Arc<dyn RoomStateSurface>,
        access: Arc<RoomAccess>,
    ) -> Self {
        Self {
            room: access.room(),
            backend,
            surface,
            access,
            current_user: config.current_user.clone(),
            current_user_id: config.current_user_id,
            state: ArcSwapOption::empty(),
            sequence: RequestSequence::new(),
        }
    }

    pub fn snapshot(&self) -> Option<Arc<RoomState>> {
        self.state.load_full()
    }

    /// The viewer's user id: configured, or looked up by username in the roster.
    pub fn viewer_id(&self, state: &RoomState) -> Option<UserId> {
        self.current_user_id.or_else(|| {
            let username = self.current_user.as_deref()?;
            state
                .members
                .iter()
                .find(|member| member.username == username)
                .map(|member| member.user_id)
        })
    }

    pub fn render(&self) -> RoomStateView {
        self.snapshot()
            .map(|state| render_room_state(&state, self.viewer_id(&state)))
            .unwrap_or_default()
    }

    pub async fn poll_once(&self) -> PollOutcome<Arc<RoomState>> {
        if self.access.is_lost() {
            return PollOutcome::Closed;
        }

        let ticket = self.sequence.issue();
        let result = self.backend.room_state(self.room).await;

        if !self.sequence.is_current(ticket) {
            tracing::debug!(
                room_id = %self.room,
                ticket = ticket.get(),
                "discarding stale room state response"
            );
            return PollOutcome::Stale;
        }
        if self.access.is_lost() {
            return PollOutcome::Closed;
        }

        match result {
            Ok(response) => {
                let state = Arc::new(RoomState::from(response));
                self.state.store(Some(Arc::clone(&state)));
                let view = render_room_state(&state, self.viewer_id(&state));
                self.surface.show_room_state(&view);
                PollOutcome::Applied(state)
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
                            "room state poll failed; retrying on next tick"
                        );
                    }
                }
                PollOutcome::Failed(failure)
            }
        }
    }

    /// Requests one role change for `user_id`, refusing locally what the snapshot forbids.
    pub async fn request_role_change(
        &self,
        user_id: UserId,
        action: MemberAction,
    ) -> UserActionResult<()> {
        let result = self.change_role_checked(user_id, action).await;

        match &result {
            Ok(()) => tracing::info!(
                room_id = %self.room,
                user_id = %user_id,
                action = %action,
                "role change requested"
            ),
            Err(error) => tracing::warn!(
                room_id = %self.room,
                user_id = %user_id,
                action = %action,
                status = ?error.status(),
                error = %error,
                "role change failed"
            ),
        }
        result
    }

    async fn change_role_checked(
        &self,
        user_id: UserId,
        action: MemberAction,
    ) -> UserActionResult<()> {
        let requested = UserAction::ChangeRole { user_id, action };
        self.ensure_allowed(user_id, action, requested)?;
        self.backend
            .change_role(self.room, user_id, action)
            .await
            .context(RequestSnafu {
                stage: "change-member-role",
                action: requested,
            })
    }

    fn ensure_allowed(
        &self,
        user_id: UserId,
        action: MemberAction,
        requested: UserAction,
    ) -> UserActionResult<()> {
        let state = self.snapshot().context(RoomStateUnavailableSnafu {
            stage: "check-role-change",
        })?;
        let target = state.member(user_id).context(UnknownMemberSnafu {
            stage: "check-role-change",
            user_id,
        })?;
        let viewer = state.role.context(NotPermittedSnafu {
            stage: "check-viewer-role",
            action: requested,
        })?;
        let is_self = self.viewer_id(&state) == Some(user_id);

        ensure!(
            is_allowed(viewer, target.role, is_self, action),
            NotPermittedSnafu {
                stage: "check-action-matrix",
                action: requested,
            }
        );
        Ok(())
    }
}

impl PollTask for RoomStateSyncEngine {
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
