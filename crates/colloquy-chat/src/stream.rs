//! Reply-stream assembly: folding an ordered chunk sequence into one message

use std::pin::Pin;

use tokio_stream::Stream;

use crate::chunk::Chunk;
use crate::types::{Message, MessageId, MessageStatus, SessionId, now_millis};

/// A stream of reply chunks
pub type ChunkStream = Pin<Box<dyn Stream<Item = Chunk> + Send>>;

/// Outcome of folding one chunk
#[derive(Debug, Clone, PartialEq)]
pub enum Fold {
    /// First chunk: an empty streaming message was constructed
    Started,
    /// Content or form updated; the partial message grew
    Updated,
    /// Terminal `end` chunk: content frozen, status `Delivered`
    Completed,
    /// Terminal `error` chunk: status `Error`, with the carried description
    Failed(String),
    /// Chunk ignored (after a terminal chunk, or wrong message id)
    Ignored,
}

/// Builds a single agent message from an ordered chunk sequence.
///
/// One assembler serves exactly one in-flight reply. The first chunk
/// constructs an empty `Streaming` agent message; `text` chunks append to its
/// content (append only, never shrinking or reordering); a `form` chunk
/// attaches its payload unchanged; the terminal chunk freezes the message.
/// Anything after a terminal chunk is ignored.
#[derive(Debug)]
pub struct StreamAssembler {
    session_id: SessionId,
    message: Option<Message>,
    done: bool,
}

impl StreamAssembler {
    /// Create an assembler for one reply in the given session
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            message: None,
            done: false,
        }
    }

    /// The partially or fully assembled message, if any chunk has arrived
    pub fn message(&self) -> Option<&Message> {
        self.message.as_ref()
    }

    /// Whether a terminal chunk has been folded
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Take ownership of the assembled message
    pub fn into_message(self) -> Option<Message> {
        self.message
    }

    /// Fold the next chunk into the message.
    pub fn fold(&mut self, chunk: &Chunk) -> Fold {
        if self.done {
            tracing::debug!(chunk = ?chunk, "chunk after terminal, ignoring");
            return Fold::Ignored;
        }

        // All chunks of one reply share a message id; a mismatch means the
        // channel broke its ordering contract.
        if let Some(msg) = &self.message {
            if chunk.message_id() != &msg.id {
                tracing::warn!(
                    expected = %msg.id,
                    got = %chunk.message_id(),
                    "chunk for a different message, ignoring"
                );
                return Fold::Ignored;
            }
        }

        let started = self.message.is_none();
        let msg = self.message.get_or_insert_with(|| {
            Message::agent_streaming(chunk.message_id().clone(), self.session_id.clone())
        });

        match chunk {
            Chunk::Start { .. } => {
                if started {
                    Fold::Started
                } else {
                    // Redundant explicit start after an implicit one
                    Fold::Ignored
                }
            }
            Chunk::Text { content, .. } => {
                msg.content.push_str(content);
                msg.timestamp = now_millis();
                if started { Fold::Started } else { Fold::Updated }
            }
            Chunk::Form {
                form_definition, ..
            } => {
                msg.form = Some(form_definition.clone());
                msg.timestamp = now_millis();
                if started { Fold::Started } else { Fold::Updated }
            }
            Chunk::Error { error, .. } => {
                msg.status = MessageStatus::Error;
                msg.timestamp = now_millis();
                self.done = true;
                Fold::Failed(error.clone())
            }
            Chunk::End { timestamp, .. } => {
                msg.status = MessageStatus::Delivered;
                msg.timestamp = (*timestamp).unwrap_or_else(now_millis);
                self.done = true;
                Fold::Completed
            }
        }
    }

    /// The id of the message being assembled, once known
    pub fn message_id(&self) -> Option<&MessageId> {
        self.message.as_ref().map(|m| &m.id)
    }
}
