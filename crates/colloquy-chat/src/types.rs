//! Core types for sessions and messages

use serde::{Deserialize, Serialize};

/// Current UTC time in milliseconds since the epoch.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Opaque session identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    /// Generate a fresh random identifier
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Message identifier, unique across the whole system
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub String);

impl MessageId {
    /// Generate a fresh random identifier
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Generate an ephemeral identifier for an optimistic placeholder.
    ///
    /// Ephemeral ids are only used for store addressing until the confirmed
    /// message arrives; they are never handed to external collaborators.
    pub fn ephemeral() -> Self {
        Self(format!("local-{}", uuid::Uuid::new_v4()))
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for MessageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Message author roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
    System,
}

/// Message lifecycle status.
///
/// `Pending` and `Streaming` are the only non-terminal states. An identifier
/// is never reused once its message reaches a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    /// User message created locally, not yet acknowledged
    Pending,
    /// User message acknowledged by the collaborator
    Sent,
    /// Agent message currently being assembled from chunks
    Streaming,
    /// Terminal: complete and acknowledged
    Delivered,
    /// Terminal: send or stream failed
    Error,
}

impl MessageStatus {
    /// Check if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Error)
    }
}

/// Opaque structured-form payload attached to an agent reply.
///
/// Pass-through data: the engine never inspects it, only carries it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormPayload(pub serde_json::Value);

/// A single message in a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub session_id: SessionId,
    pub role: Role,
    pub content: String,
    /// Creation/last-update time, UTC milliseconds
    pub timestamp: i64,
    pub status: MessageStatus,
    /// Optional structured-form payload (opaque)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form: Option<FormPayload>,
}

impl Message {
    /// Create a user message with the given status
    pub fn user(
        id: MessageId,
        session_id: SessionId,
        content: impl Into<String>,
        status: MessageStatus,
    ) -> Self {
        Self {
            id,
            session_id,
            role: Role::User,
            content: content.into(),
            timestamp: now_millis(),
            status,
            form: None,
        }
    }

    /// Create an empty agent message in the streaming state
    pub fn agent_streaming(id: MessageId, session_id: SessionId) -> Self {
        Self {
            id,
            session_id,
            role: Role::Agent,
            content: String::new(),
            timestamp: now_millis(),
            status: MessageStatus::Streaming,
            form: None,
        }
    }

    /// Leading snippet of the content for directory listings.
    ///
    /// Truncates on a char boundary and appends an ellipsis.
    pub fn snippet(&self, max_chars: usize) -> String {
        if self.content.chars().count() <= max_chars {
            self.content.clone()
        } else {
            let head: String = self.content.chars().take(max_chars).collect();
            format!("{head}\u{2026}")
        }
    }
}

/// A named conversation session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub title: String,
    /// Creation time, UTC milliseconds
    pub created_at: i64,
    /// Time of the most recent message; monotonically non-decreasing
    pub last_message_at: i64,
    /// Short text snippet of the most recent message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_snippet: Option<String>,
}

impl Session {
    /// Create a new session with no activity
    pub fn new(id: SessionId, title: impl Into<String>) -> Self {
        let now = now_millis();
        Self {
            id,
            title: title.into(),
            created_at: now,
            last_message_at: now,
            last_snippet: None,
        }
    }
}
