//! Engine event types

use colloquy_chat::{Message, SessionId};
use serde::{Deserialize, Serialize};

/// Events emitted by the conversation engine for the rendering layer.
///
/// The rendering layer holds read-only snapshots; these events tell it when
/// to re-read. Delivered over a `tokio::sync::broadcast` channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    /// The session list or its ordering changed
    SessionsChanged,

    /// The message list of a session changed
    MessagesChanged { session_id: SessionId },

    /// A streaming agent message grew
    StreamUpdate { message: Message },

    /// A streaming agent message reached a terminal state
    StreamEnd { message: Message },

    /// The single-flight lock was taken or released
    BusyChanged { busy: bool },

    /// A recovered failure worth surfacing (the affected message already
    /// carries its error status)
    EngineError { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serde_tag() {
        let ev = EngineEvent::BusyChanged { busy: true };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "busy_changed");
        assert_eq!(json["busy"], true);
    }
}
