use salon_core::{MemberAction, MessageId, RoomId, UserId};

/// URL layout of the chat backend, rooted at a base URL without trailing slash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routes {
    base_url: String,
}

impl Routes {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn room_list(&self) -> String {
        format!("{}/api/rooms/", self.base_url)
    }

    pub fn room_state(&self, room: RoomId) -> String {
        format!("{}/api/rooms/{room}/state/", self.base_url)
    }

    pub fn messages(&self, room: RoomId) -> String {
        format!("{}/api/rooms/{room}/messages/", self.base_url)
    }

    pub fn send(&self, room: RoomId) -> String {
        format!("{}/api/rooms/{room}/send/", self.base_url)
    }

    /// Serves both the typing ping (POST) and the typing state (GET).
    pub fn typing(&self, room: RoomId) -> String {
        format!("{}/api/rooms/{room}/typing/", self.base_url)
    }

    pub fn delete_message(&self, room: RoomId, message_id: MessageId) -> String {
        format!("{}/api/rooms/{room}/delete/{message_id}/", self.base_url)
    }

    pub fn change_role(&self, room: RoomId, action: MemberAction, user_id: UserId) -> String {
        format!(
            "{}/api/rooms/{room}/{}/{user_id}/",
            self.base_url,
            action.endpoint_segment()
        )
    }

    /// Prefix of room pages; a room's page is this prefix followed by `{id}/`.
    pub fn room_detail_base(&self) -> String {
        format!("{}/rooms/", self.base_url)
    }

    /// Page the client navigates to once it lost access to `room`.
    pub fn room_detail(&self, room: RoomId) -> String {
        format!("{}{room}/", self.room_detail_base())
    }
}
