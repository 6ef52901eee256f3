//! Pure mapping from domain entities to display-ready view models.
//!
//! Nothing here touches engine state; every function reads a snapshot and returns a value
//! the host is free to draw however it likes.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::actions::{MemberAction, allowed_actions};
use crate::ids::{MessageId, RoomId, UserId};
use crate::model::{Message, Role, RoomState, RoomSummary};

/// Text shown in place of a deleted message.
pub const DELETED_PLACEHOLDER: &str = "[message deleted]";
/// Rendered instead of an empty room list.
pub const EMPTY_ROOMS_PLACEHOLDER: &str = "No rooms yet.";
/// Preview of a room nobody has written in.
pub const NO_MESSAGES_PREVIEW: &str = "No messages";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageTone {
    System,
    Own,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageView {
    pub id: MessageId,
    pub tone: MessageTone,
    /// `None` for system notices.
    pub author: Option<String>,
    pub text: String,
    pub sent_at: Option<String>,
    pub deletable: bool,
}

pub fn render_message(message: &Message, current_user: Option<&str>) -> MessageView {
    if message.is_system() {
        return MessageView {
            id: message.id,
            tone: MessageTone::System,
            author: None,
            text: message_text(message),
            sent_at: None,
            deletable: false,
        };
    }

    let tone = if current_user == Some(message.author.as_str()) {
        MessageTone::Own
    } else {
        MessageTone::Other
    };

    MessageView {
        id: message.id,
        tone,
        author: Some(message.author.clone()),
        text: message_text(message),
        sent_at: Some(message.created_at.format(TIMESTAMP_FORMAT).to_string()),
        deletable: message.is_deletable(),
    }
}

fn message_text(message: &Message) -> String {
    if message.is_deleted {
        DELETED_PLACEHOLDER.to_string()
    } else {
        message.display_content().to_string()
    }
}

/// Coarse age of a timestamp, bucketed the way the room list shows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeAgo {
    Seconds(i64),
    Minutes(i64),
    Hours(i64),
    Days(i64),
}

impl TimeAgo {
    /// Future timestamps (clock skew) clamp to zero seconds.
    pub fn between(then: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let seconds = (now - then).num_seconds().max(0);
        if seconds < 60 {
            return Self::Seconds(seconds);
        }
        let minutes = seconds / 60;
        if minutes < 60 {
            return Self::Minutes(minutes);
        }
        let hours = minutes / 60;
        if hours < 24 {
            return Self::Hours(hours);
        }
        Self::Days(hours / 24)
    }
}

impl fmt::Display for TimeAgo {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Seconds(value) => write!(formatter, "{value} s"),
            Self::Minutes(value) => write!(formatter, "{value} min"),
            Self::Hours(value) => write!(formatter, "{value} h"),
            Self::Days(value) => write!(formatter, "{value} d"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomPreview {
    NoMessages,
    Deleted,
    Message {
        author: String,
        content: String,
        ago: Option<TimeAgo>,
    },
}

impl RoomPreview {
    pub fn text(&self) -> String {
        match self {
            Self::NoMessages => NO_MESSAGES_PREVIEW.to_string(),
            Self::Deleted => DELETED_PLACEHOLDER.to_string(),
            Self::Message {
                author,
                content,
                ago: Some(ago),
            } => format!("{author}: {content} - {ago} ago"),
            Self::Message {
                author,
                content,
                ago: None,
            } => format!("{author}: {content}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomItemView {
    pub id: RoomId,
    pub name: String,
    pub locked: bool,
    pub created_by: String,
    pub href: String,
    pub preview: RoomPreview,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomListView {
    Empty { placeholder: &'static str },
    Rooms(Vec<RoomItemView>),
}

impl RoomListView {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty { .. })
    }
}

pub fn render_room_list(
    rooms: &[RoomSummary],
    now: DateTime<Utc>,
    room_detail_base: &str,
) -> RoomListView {
    if rooms.is_empty() {
        return RoomListView::Empty {
            placeholder: EMPTY_ROOMS_PLACEHOLDER,
        };
    }

    RoomListView::Rooms(
        rooms
            .iter()
            .map(|room| render_room_item(room, now, room_detail_base))
            .collect(),
    )
}

fn render_room_item(
    room: &RoomSummary,
    now: DateTime<Utc>,
    room_detail_base: &str,
) -> RoomItemView {
    let preview = match &room.last_message {
        None => RoomPreview::NoMessages,
        Some(last) if last.is_deleted => RoomPreview::Deleted,
        Some(last) => RoomPreview::Message {
            author: last.author.clone(),
            content: last.content.clone(),
            ago: last.created_at.map(|created_at| TimeAgo::between(created_at, now)),
        },
    };

    RoomItemView {
        id: room.id,
        name: room.name.clone(),
        locked: room.has_password,
        created_by: room.created_by.clone(),
        href: format!("{room_detail_base}{}/", room.id),
        preview,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRowView {
    pub user_id: UserId,
    pub username: String,
    pub muted: bool,
    pub actions: Vec<MemberAction>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberGroupView {
    pub role: Role,
    pub title: &'static str,
    pub members: Vec<MemberRowView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RoomStateView {
    pub room_name: Option<String>,
    pub role_label: Option<&'static str>,
    /// Non-empty groups in owner, moderator, member, banned order.
    pub groups: Vec<MemberGroupView>,
}

pub fn render_room_state(state: &RoomState, viewer_id: Option<UserId>) -> RoomStateView {
    let room_name = Some(state.room.name.trim())
        .filter(|name| !name.is_empty())
        .map(str::to_string);

    let groups = Role::ALL
        .iter()
        .filter_map(|&role| {
            let members = state
                .members
                .iter()
                .filter(|member| member.role == role)
                .map(|member| {
                    let is_self = viewer_id == Some(member.user_id);
                    let actions = state
                        .role
                        .map(|viewer| allowed_actions(viewer, member.role, is_self))
                        .unwrap_or_default();
                    MemberRowView {
                        user_id: member.user_id,
                        username: member.username.clone(),
                        muted: member.role == Role::Banned,
                        actions,
                    }
                })
                .collect::<Vec<_>>();

            if members.is_empty() {
                None
            } else {
                Some(MemberGroupView {
                    role,
                    title: role.group_title(),
                    members,
                })
            }
        })
        .collect();

    RoomStateView {
        room_name,
        role_label: state.role.map(Role::label),
        groups,
    }
}

/// Typing line for the given set of names; `None` when nobody is typing.
pub fn render_typing(names: &[String]) -> Option<String> {
    match names {
        [] => None,
        [single] => Some(format!("{single} is typing...")),
        several => Some(format!("{} are typing...", several.join(", "))),
    }
}
