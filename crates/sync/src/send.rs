use std::sync::Arc;

use salon_core::{Message, MessageId, RoomId, SendResponse};
use snafu::ResultExt;

use super::failure::{
    NotConfirmedSnafu, RequestSnafu, UserAction, UserActionError, UserActionResult,
};
use super::messages::MessageSyncEngine;

/// User-triggered writes into the message list. Nothing is shown before the backend confirms.
pub struct SendPipeline {
    engine: Arc<MessageSyncEngine>,
}

impl SendPipeline {
    pub fn new(engine: Arc<MessageSyncEngine>) -> Self {
        Self { engine }
    }

    /// Sends the trimmed `content`. Blank input is ignored and yields `Ok(None)`.
    pub async fn send(&self, content: &str) -> UserActionResult<Option<Message>> {
        let content = content.trim();
        if content.is_empty() {
            return Ok(None);
        }

        let room = self.engine.room();
        let action = UserAction::Send;
        let response = self
            .engine
            .backend()
            .send_message(room, content)
            .await
            .context(RequestSnafu {
                stage: "send-message",
                action,
            })
            .inspect_err(|error| log_failure(room, error))?;

        let SendResponse {
            ok: true,
            message: Some(message),
        } = response
        else {
            let error = NotConfirmedSnafu {
                stage: "confirm-sent-message",
                action,
            }
            .build();
            log_failure(room, &error);
            return Err(error);
        };

        self.engine.apply_sent(message.clone());
        tracing::debug!(room_id = %room, message_id = %message.id, "message sent");
        Ok(Some(message))
    }

    /// Deletes a message and tombstones it locally without waiting for the next poll.
    pub async fn delete(&self, message_id: MessageId) -> UserActionResult<()> {
        let room = self.engine.room();
        self.engine
            .backend()
            .delete_message(room, message_id)
            .await
            .context(RequestSnafu {
                stage: "delete-message",
                action: UserAction::Delete(message_id),
            })
            .inspect_err(|error| log_failure(room, error))?;

        self.engine.apply_deleted(message_id);
        tracing::debug!(room_id = %room, message_id = %message_id, "message deleted");
        Ok(())
    }
}

fn log_failure(room: RoomId, error: &UserActionError) {
    tracing::warn!(
        room_id = %room,
        status = ?error.status(),
        error = %error,
        "user action failed"
    );
}
