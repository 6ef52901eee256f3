use std::fmt;

use salon_backend::BackendError;
use salon_core::{MemberAction, MessageId, UserId};
use snafu::Snafu;

/// How a failed poll is recovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollFailure {
    /// The viewer can no longer read the room; the session ends and navigates away.
    AccessLost,
    /// Dropped silently, the next tick retries.
    Transient,
}

impl PollFailure {
    /// Only room-scoped reads can lose access; everything else is transient.
    pub fn classify(error: &BackendError, room_scoped: bool) -> Self {
        if room_scoped && error.is_access_lost() {
            Self::AccessLost
        } else {
            Self::Transient
        }
    }
}

/// A one-shot request triggered by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    Send,
    Delete(MessageId),
    ChangeRole { user_id: UserId, action: MemberAction },
}

impl fmt::Display for UserAction {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Send => formatter.write_str("send message"),
            Self::Delete(message_id) => write!(formatter, "delete message {message_id}"),
            Self::ChangeRole { user_id, action } => {
                write!(formatter, "{action} user {user_id}")
            }
        }
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum UserActionError {
    #[snafu(display("failed to {action} on `{stage}`: {source}"))]
    Request {
        stage: &'static str,
        action: UserAction,
        source: BackendError,
    },
    #[snafu(display("backend did not confirm {action} on `{stage}`"))]
    NotConfirmed {
        stage: &'static str,
        action: UserAction,
    },
    #[snafu(display("{action} is not allowed for the current role on `{stage}`"))]
    NotPermitted {
        stage: &'static str,
        action: UserAction,
    },
    #[snafu(display("user {user_id} is not a member of the room on `{stage}`"))]
    UnknownMember { stage: &'static str, user_id: UserId },
    #[snafu(display("room state has not been loaded yet on `{stage}`"))]
    RoomStateUnavailable { stage: &'static str },
}

impl UserActionError {
    /// Failure status to show next to the error, when the backend answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Request { source, .. } => source.status(),
            Self::NotConfirmed { .. }
            | Self::NotPermitted { .. }
            | Self::UnknownMember { .. }
            | Self::RoomStateUnavailable { .. } => None,
        }
    }
}

pub type UserActionResult<T> = Result<T, UserActionError>;
