//! Streamed reply chunks and their wire format

use serde::{Deserialize, Serialize};

use crate::types::{FormPayload, MessageId, SessionId};

/// One atomic unit of a streaming agent reply.
///
/// Chunks for a single reply arrive in strict order: a `Start`, zero or more
/// `Text`/`Form` chunks, then exactly one terminal chunk (`End` or `Error`).
/// All chunks of one reply carry the same `messageId`.
///
/// Wire shape (internally tagged, camelCase):
/// `{type, messageId, content?, formDefinition?, error?, chatId?, timestamp?}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Chunk {
    /// Reply opened
    #[serde(rename_all = "camelCase")]
    Start {
        message_id: MessageId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        chat_id: Option<SessionId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<i64>,
    },
    /// A text fragment to append
    #[serde(rename_all = "camelCase")]
    Text {
        message_id: MessageId,
        content: String,
    },
    /// A structured-form payload attached to the reply
    #[serde(rename_all = "camelCase")]
    Form {
        message_id: MessageId,
        form_definition: FormPayload,
    },
    /// Terminal: the reply failed
    #[serde(rename_all = "camelCase")]
    Error {
        message_id: MessageId,
        error: String,
    },
    /// Terminal: the reply completed
    #[serde(rename_all = "camelCase")]
    End {
        message_id: MessageId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<i64>,
    },
}

impl Chunk {
    /// The message this chunk targets
    pub fn message_id(&self) -> &MessageId {
        match self {
            Self::Start { message_id, .. }
            | Self::Text { message_id, .. }
            | Self::Form { message_id, .. }
            | Self::Error { message_id, .. }
            | Self::End { message_id, .. } => message_id,
        }
    }

    /// Check if this chunk closes the reply stream
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::End { .. } | Self::Error { .. })
    }

    /// Create a text chunk
    pub fn text(message_id: impl Into<MessageId>, content: impl Into<String>) -> Self {
        Self::Text {
            message_id: message_id.into(),
            content: content.into(),
        }
    }

    /// Create an end chunk with no timestamp
    pub fn end(message_id: impl Into<MessageId>) -> Self {
        Self::End {
            message_id: message_id.into(),
            timestamp: None,
        }
    }
}
