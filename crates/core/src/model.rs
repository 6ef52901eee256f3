use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::{CoreError, CoreResult, UnknownRoleSnafu};
use super::ids::{MessageId, RoomId, UserId};

/// Content prefix the backend uses for join/ban/moderation notices.
pub const SYSTEM_PREFIX: &str = "[SYSTEM] ";

/// One chat message as the backend reports it to the current viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub author: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_deleted: bool,
    /// Viewer-specific capability computed by the backend.
    #[serde(default)]
    pub can_delete: bool,
}

impl Message {
    pub fn is_system(&self) -> bool {
        self.content.starts_with(SYSTEM_PREFIX)
    }

    /// Content without the system prefix.
    pub fn display_content(&self) -> &str {
        self.content
            .strip_prefix(SYSTEM_PREFIX)
            .unwrap_or(&self.content)
    }

    /// Whether the delete affordance should be offered.
    pub fn is_deletable(&self) -> bool {
        self.can_delete && !self.is_deleted && !self.is_system()
    }

    /// Applies the tombstone transition, returning `true` only on the first application.
    pub fn mark_deleted(&mut self) -> bool {
        if self.is_deleted {
            return false;
        }
        self.is_deleted = true;
        true
    }
}

/// Client-held high-water mark for one room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncCursor {
    pub last_seen_id: MessageId,
    /// Server clock of the last applied poll; `None` until the first response.
    pub last_sync_time: Option<DateTime<Utc>>,
}

impl SyncCursor {
    /// Returns the cursor moved forward by one response. Neither field ever regresses.
    pub fn advance(
        self,
        max_seen: Option<MessageId>,
        server_now: Option<DateTime<Utc>>,
    ) -> Self {
        let last_seen_id = match max_seen {
            Some(id) if id > self.last_seen_id => id,
            _ => self.last_seen_id,
        };
        let last_sync_time = match (self.last_sync_time, server_now) {
            (Some(current), Some(next)) if next > current => Some(next),
            (None, next) => next,
            (current, _) => current,
        };

        Self {
            last_seen_id,
            last_sync_time,
        }
    }
}

/// Membership role inside one room, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Owner,
    Mod,
    Member,
    Banned,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Owner, Role::Mod, Role::Member, Role::Banned];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "OWNER",
            Self::Mod => "MOD",
            Self::Member => "MEMBER",
            Self::Banned => "BANNED",
        }
    }

    /// Label used for the viewer's own role.
    pub fn label(self) -> &'static str {
        match self {
            Self::Owner => "Owner",
            Self::Mod => "Moderator",
            Self::Member => "Member",
            Self::Banned => "Banned",
        }
    }

    /// Heading of the roster group holding this role.
    pub fn group_title(self) -> &'static str {
        match self {
            Self::Owner => "Owner",
            Self::Mod => "Moderators",
            Self::Member => "Members",
            Self::Banned => "Banned",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(raw: &str) -> CoreResult<Self> {
        match raw.trim() {
            "OWNER" => Ok(Self::Owner),
            "MOD" => Ok(Self::Mod),
            "MEMBER" => Ok(Self::Member),
            "BANNED" => Ok(Self::Banned),
            other => UnknownRoleSnafu {
                stage: "parse-role",
                raw: other.to_string(),
            }
            .fail(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub user_id: UserId,
    pub username: String,
    pub role: Role,
}

/// Preview of the most recent message of a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastMessage {
    pub author: String,
    pub content: String,
    pub created_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
}

/// Directory entry; replaced wholesale on every poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSummary {
    pub id: RoomId,
    pub name: String,
    pub has_password: bool,
    pub created_by: String,
    pub last_message: Option<LastMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoomInfo {
    #[serde(default)]
    pub id: Option<RoomId>,
    #[serde(default)]
    pub name: String,
}

/// Room metadata, viewer role and roster from one room-state poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomState {
    pub room: RoomInfo,
    pub role: Option<Role>,
    pub members: Vec<Member>,
}

impl RoomState {
    pub fn member(&self, user_id: UserId) -> Option<&Member> {
        self.members.iter().find(|member| member.user_id == user_id)
    }
}
