//! Demo reply channel: echoes prompts back word by word
//!
//! Stands in for the real backend so the streaming behavior of the engine is
//! observable from a terminal without any network transport.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use colloquy_chat::{
    Chunk, ChunkStream, Message, MessageId, MessageStatus, Session, SessionId,
};
use colloquy_engine::{Error, ReplyChannel, Result, SendReply};
use parking_lot::Mutex;

/// In-process channel that answers every prompt with a word-by-word echo.
pub struct DemoChannel {
    sessions: Vec<Session>,
    /// Everything confirmed or produced, across all sessions
    log: Arc<Mutex<Vec<Message>>>,
    chunk_delay: Duration,
}

impl DemoChannel {
    pub fn new(chunk_delay: Duration) -> Self {
        Self {
            sessions: vec![
                Session::new(SessionId::from("scratch"), "Scratchpad"),
                Session::new(SessionId::from("ideas"), "Ideas"),
            ],
            log: Arc::new(Mutex::new(Vec::new())),
            chunk_delay,
        }
    }

    fn reply_text(content: &str) -> String {
        format!("You said: \"{content}\". Anything else?")
    }
}

#[async_trait]
impl ReplyChannel for DemoChannel {
    async fn send(&self, session_id: &SessionId, content: &str) -> Result<SendReply> {
        tracing::debug!(session_id = %session_id, "demo channel opening reply stream");
        let user_message = Message::user(
            MessageId::random(),
            session_id.clone(),
            content,
            MessageStatus::Sent,
        );
        self.log.lock().push(user_message.clone());

        let agent_id = MessageId::random();
        let reply = Self::reply_text(content);
        let delay = self.chunk_delay;
        let log = Arc::clone(&self.log);
        let session = session_id.clone();

        let chunks: ChunkStream = Box::pin(async_stream::stream! {
            yield Chunk::Start {
                message_id: agent_id.clone(),
                chat_id: Some(session.clone()),
                timestamp: None,
            };

            let mut full = String::new();
            for word in reply.split_inclusive(' ') {
                tokio::time::sleep(delay).await;
                full.push_str(word);
                yield Chunk::text(agent_id.clone(), word);
            }

            let mut done = Message::agent_streaming(agent_id.clone(), session.clone());
            done.content = full;
            done.status = MessageStatus::Delivered;
            log.lock().push(done);

            yield Chunk::end(agent_id.clone());
        });

        Ok(SendReply {
            user_message,
            chunks,
        })
    }

    async fn list_sessions(&self) -> Vec<Session> {
        self.sessions.clone()
    }

    async fn list_messages(&self, session_id: &SessionId) -> Vec<Message> {
        self.log
            .lock()
            .iter()
            .filter(|m| &m.session_id == session_id)
            .cloned()
            .collect()
    }

    async fn edit(&self, message_id: &MessageId, new_content: &str) -> Result<Message> {
        let mut log = self.log.lock();
        let Some(msg) = log.iter_mut().find(|m| &m.id == message_id) else {
            return Err(Error::NotFound(message_id.clone()));
        };
        msg.content = new_content.to_string();
        msg.timestamp = colloquy_chat::types::now_millis();
        Ok(msg.clone())
    }

    async fn resend(&self, message_id: &MessageId) -> Result<Message> {
        let mut log = self.log.lock();
        let Some(original) = log.iter().find(|m| &m.id == message_id).cloned() else {
            return Err(Error::NotFound(message_id.clone()));
        };
        let mut ack = Message::agent_streaming(MessageId::random(), original.session_id.clone());
        ack.content = format!("(again) {}", Self::reply_text(&original.content));
        ack.status = MessageStatus::Delivered;
        log.push(ack.clone());
        Ok(ack)
    }
}
