//! Reply channel abstraction: the opaque chunk-producing collaborator

use async_trait::async_trait;
use colloquy_chat::{ChunkStream, Message, MessageId, Session, SessionId};

use crate::error::Result;

/// What a successful send returns: the server-confirmed user message plus the
/// chunk stream carrying the forthcoming agent reply.
pub struct SendReply {
    /// The confirmed user message with its durable identifier
    pub user_message: Message,
    /// Ordered chunks for the agent reply, closed by exactly one terminal
    /// chunk
    pub chunks: ChunkStream,
}

/// The backend collaborator the engine talks to.
///
/// The engine treats reply generation as opaque: the channel delivers
/// reliable, ordered chunks per request, and the engine only assembles them.
/// Lookup methods return empty collections for unknown identifiers rather
/// than erroring.
#[async_trait]
pub trait ReplyChannel: Send + Sync {
    /// Open a reply stream for a user message in a session
    async fn send(&self, session_id: &SessionId, content: &str) -> Result<SendReply>;

    /// List all known sessions
    async fn list_sessions(&self) -> Vec<Session>;

    /// List the message history of a session; empty if unknown
    async fn list_messages(&self, session_id: &SessionId) -> Vec<Message>;

    /// Replace a message's content; `NotFound` if the id is unknown
    async fn edit(&self, message_id: &MessageId, new_content: &str) -> Result<Message>;

    /// Produce a single-shot agent acknowledgment for a prior message;
    /// `NotFound` if the id is unknown. Deliberately not streamed.
    async fn resend(&self, message_id: &MessageId) -> Result<Message>;
}
