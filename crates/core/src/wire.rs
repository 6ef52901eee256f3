//! JSON payloads exchanged with the chat backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{MessageId, RoomId};
use crate::model::{LastMessage, Member, Message, Role, RoomInfo, RoomState, RoomSummary};

/// Query of one message poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MessagesQuery {
    /// Only messages with a strictly greater id are returned.
    pub after: MessageId,
    /// Deletions that happened after this server instant are reported.
    pub since: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub deleted_ids: Vec<MessageId>,
    #[serde(default)]
    pub server_now: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SendResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TypingResponse {
    #[serde(default)]
    pub typing: Vec<String>,
}

/// Flat room row as the directory endpoint reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummaryPayload {
    pub id: RoomId,
    pub name: String,
    #[serde(default)]
    pub has_password: bool,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub last_message_content: Option<String>,
    #[serde(default)]
    pub last_message_author: Option<String>,
    #[serde(default)]
    pub last_message_is_deleted: Option<bool>,
    #[serde(default)]
    pub last_message_created_at: Option<DateTime<Utc>>,
}

impl RoomSummaryPayload {
    pub fn into_summary(self) -> RoomSummary {
        let last_message = self
            .last_message_content
            .filter(|content| !content.is_empty())
            .map(|content| LastMessage {
                author: self.last_message_author.unwrap_or_default(),
                content,
                created_at: self.last_message_created_at,
                is_deleted: self.last_message_is_deleted.unwrap_or(false),
            });

        RoomSummary {
            id: self.id,
            name: self.name,
            has_password: self.has_password,
            created_by: self.created_by,
            last_message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoomListResponse {
    /// Absent when the backend answered without a room list; the view is then left as is.
    #[serde(default)]
    pub rooms: Option<Vec<RoomSummaryPayload>>,
}

impl RoomListResponse {
    pub fn into_summaries(self) -> Option<Vec<RoomSummary>> {
        self.rooms.map(|rooms| {
            rooms
                .into_iter()
                .map(RoomSummaryPayload::into_summary)
                .collect()
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoomStateResponse {
    #[serde(default)]
    pub room: RoomInfo,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub members: Vec<Member>,
}

impl From<RoomStateResponse> for RoomState {
    fn from(response: RoomStateResponse) -> Self {
        Self {
            room: response.room,
            role: response.role,
            members: response.members,
        }
    }
}

/// Error body the backend attaches to rejected requests.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::ids::UserId;

    #[test]
    fn messages_response_decodes_backend_payload() {
        let payload = json!({
            "messages": [{
                "id": 12,
                "author": "alice",
                "content": "hello",
                "created_at": "2025-03-01T12:00:00.123456+00:00",
                "is_deleted": false,
                "can_delete": true
            }],
            "deleted_ids": [3, 4],
            "server_now": "2025-03-01T12:00:01+01:00"
        });

        let response: MessagesResponse = serde_json::from_value(payload).unwrap();
        assert_eq!(response.messages.len(), 1);
        assert_eq!(response.messages[0].id, MessageId::new(12));
        assert_eq!(
            response.deleted_ids,
            vec![MessageId::new(3), MessageId::new(4)]
        );
        assert_eq!(
            response.server_now.unwrap().to_rfc3339(),
            "2025-03-01T11:00:01+00:00"
        );
    }

    #[test]
    fn missing_collections_default_to_empty() {
        let response: MessagesResponse = serde_json::from_str("{}").unwrap();
        assert!(response.messages.is_empty());
        assert!(response.deleted_ids.is_empty());
        assert!(response.server_now.is_none());
    }

    #[test]
    fn flat_room_row_folds_last_message() {
        let payload = json!({
            "rooms": [
                {
                    "id": 1,
                    "name": "general",
                    "has_password": true,
                    "created_by": "alice",
                    "last_message_content": "hey",
                    "last_message_author": "bob",
                    "last_message_is_deleted": false,
                    "last_message_created_at": "2025-03-01T12:00:00+00:00"
                },
                {
                    "id": 2,
                    "name": "quiet",
                    "has_password": false,
                    "created_by": "carol",
                    "last_message_content": null,
                    "last_message_author": null,
                    "last_message_is_deleted": null,
                    "last_message_created_at": null
                }
            ]
        });

        let response: RoomListResponse = serde_json::from_value(payload).unwrap();
        let rooms = response.into_summaries().unwrap();

        let general = &rooms[0];
        assert!(general.has_password);
        let last = general.last_message.as_ref().unwrap();
        assert_eq!(last.author, "bob");
        assert_eq!(last.content, "hey");
        assert!(!last.is_deleted);

        assert!(rooms[1].last_message.is_none());
    }

    #[test]
    fn room_list_without_rooms_key_is_distinct_from_empty() {
        let missing: RoomListResponse = serde_json::from_str("{}").unwrap();
        assert!(missing.into_summaries().is_none());

        let empty: RoomListResponse = serde_json::from_str(r#"{"rooms": []}"#).unwrap();
        assert_eq!(empty.into_summaries(), Some(Vec::new()));
    }

    #[test]
    fn room_state_decodes_roster() {
        let payload = json!({
            "room": {"id": 4, "name": "general"},
            "role": "OWNER",
            "members": [
                {"user_id": 1, "username": "alice", "role": "OWNER"},
                {"user_id": 2, "username": "bob", "role": "BANNED"}
            ]
        });

        let state: RoomState = serde_json::from_value::<RoomStateResponse>(payload)
            .unwrap()
            .into();
        assert_eq!(state.room.name, "general");
        assert_eq!(state.role, Some(Role::Owner));
        assert_eq!(state.member(UserId::new(2)).unwrap().role, Role::Banned);
    }
}
