//! Conversation engine: intent dispatch and streaming orchestration

use std::sync::Arc;

use colloquy_chat::{
    Fold, Message, MessageId, MessageStatus, Role, Session, SessionId, StreamAssembler,
    types::now_millis,
};
use futures::StreamExt;
use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::{
    channel::ReplyChannel,
    directory::ChatDirectory,
    error::{Error, Result},
    events::EngineEvent,
    store::MessageStore,
};

/// Directory snippets keep this many leading chars of the message
/// unless overridden with [`ConversationEngine::with_snippet_chars`]
const DEFAULT_SNIPPET_CHARS: usize = 80;

/// Interior state guarded by one mutex. The mutex is never held across an
/// await point; chunk arrivals and intents interleave at those suspension
/// points, guarded by the `busy` flag rather than the scheduler.
#[derive(Default)]
struct EngineState {
    directory: ChatDirectory,
    store: MessageStore,
    active_session: Option<SessionId>,
    /// Single-flight lock: a reply stream is in progress
    busy: bool,
    /// Message currently in edit mode, if any
    editing: Option<MessageId>,
}

/// Orchestrates the directory, store, and stream assembly in response to user
/// intents.
///
/// The engine exclusively owns both collections; the rendering layer reads
/// snapshots and subscribes to [`EngineEvent`]s. At most one reply stream is
/// in progress at a time; while it runs, send/select/resend/edit intents are
/// rejected as silent no-ops.
#[derive(Clone)]
pub struct ConversationEngine {
    state: Arc<Mutex<EngineState>>,
    channel: Arc<dyn ReplyChannel>,
    event_tx: broadcast::Sender<EngineEvent>,
    snippet_chars: usize,
}

impl ConversationEngine {
    /// Create an engine over a reply channel
    pub fn new(channel: Arc<dyn ReplyChannel>) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            state: Arc::new(Mutex::new(EngineState::default())),
            channel,
            event_tx,
            snippet_chars: DEFAULT_SNIPPET_CHARS,
        }
    }

    /// Override how many leading chars of a message feed the directory snippet
    pub fn with_snippet_chars(mut self, snippet_chars: usize) -> Self {
        self.snippet_chars = snippet_chars;
        self
    }

    /// Subscribe to engine events
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.event_tx.subscribe()
    }

    // ---- Snapshots for the rendering layer ----

    /// Ordered session list, most recent activity first
    pub fn sessions(&self) -> Vec<Session> {
        self.state.lock().directory.list().to_vec()
    }

    /// Messages of a session in conversation order
    pub fn messages(&self, session_id: &SessionId) -> Vec<Message> {
        self.state.lock().store.list_for(session_id).to_vec()
    }

    /// Messages of the active session, empty when none is selected
    pub fn active_messages(&self) -> Vec<Message> {
        let state = self.state.lock();
        match &state.active_session {
            Some(id) => state.store.list_for(id).to_vec(),
            None => Vec::new(),
        }
    }

    /// The currently selected session
    pub fn active_session(&self) -> Option<SessionId> {
        self.state.lock().active_session.clone()
    }

    /// Whether a reply stream is in progress (input should be disabled)
    pub fn is_busy(&self) -> bool {
        self.state.lock().busy
    }

    /// The message currently in edit mode
    pub fn editing(&self) -> Option<MessageId> {
        self.state.lock().editing.clone()
    }

    // ---- Intents ----

    /// Load the session list from the collaborator
    pub async fn refresh_sessions(&self) {
        let sessions = self.channel.list_sessions().await;
        self.state.lock().directory.seed(sessions);
        let _ = self.event_tx.send(EngineEvent::SessionsChanged);
    }

    /// Select the active session, loading its history from the collaborator
    /// on first access. Rejected while a reply stream is in progress.
    pub async fn select_session(&self, session_id: SessionId) {
        let needs_load = {
            let mut state = self.state.lock();
            if state.busy {
                tracing::debug!(session_id = %session_id, "select rejected: reply in progress");
                return;
            }
            state.active_session = Some(session_id.clone());
            !state.store.has_session(&session_id)
        };

        if needs_load {
            let history = self.channel.list_messages(&session_id).await;
            // The load ran without the lock; a send dispatched during the
            // await may already have written to this session. A stale seed
            // would erase those messages, so re-check before applying it.
            let mut state = self.state.lock();
            if state.store.has_session(&session_id) {
                tracing::debug!(session_id = %session_id, "discarding stale history load");
            } else {
                state.store.seed(session_id.clone(), history);
            }
        }

        let _ = self
            .event_tx
            .send(EngineEvent::MessagesChanged { session_id });
    }

    /// Send a user message in the active session and stream the agent reply.
    ///
    /// Invalid intents (empty content, no active session, reply in progress,
    /// edit mode open) are silent no-ops. Channel failures are recovered by
    /// marking the placeholder `Error`; only store invariant violations
    /// propagate as `Err`.
    pub async fn send(&self, content: &str) -> Result<()> {
        let content = content.trim();

        // Validate and take the single-flight lock in one critical section.
        let (session_id, temp_id) = {
            let mut state = self.state.lock();
            if content.is_empty() {
                tracing::debug!("send rejected: empty content");
                return Ok(());
            }
            let Some(session_id) = state.active_session.clone() else {
                tracing::debug!("send rejected: no active session");
                return Ok(());
            };
            if state.busy {
                tracing::debug!("send rejected: reply in progress");
                return Ok(());
            }
            if state.editing.is_some() {
                tracing::debug!("send rejected: edit in progress");
                return Ok(());
            }
            state.busy = true;

            // Optimistic placeholder under a client-generated ephemeral id.
            // The id never leaves the engine: it is swapped for the durable
            // one before the send settles.
            let temp_id = MessageId::ephemeral();
            let placeholder = Message::user(
                temp_id.clone(),
                session_id.clone(),
                content,
                MessageStatus::Pending,
            );
            if let Err(e) = state.store.append(placeholder) {
                state.busy = false;
                return Err(e);
            }
            (session_id, temp_id)
        };
        let _ = self.event_tx.send(EngineEvent::BusyChanged { busy: true });
        let _ = self.event_tx.send(EngineEvent::MessagesChanged {
            session_id: session_id.clone(),
        });

        let reply = match self.channel.send(&session_id, content).await {
            Ok(reply) => reply,
            Err(e) => {
                self.settle_failed_send(&session_id, &temp_id, &e);
                return Ok(());
            }
        };

        // Fold the chunk stream into the agent message, upserting each
        // intermediate state so the rendering layer sees the reply grow.
        let mut chunks = reply.chunks;
        let mut assembler = StreamAssembler::new(session_id.clone());
        let mut delivered = false;

        while let Some(chunk) = chunks.next().await {
            match assembler.fold(&chunk) {
                Fold::Started | Fold::Updated => {
                    if let Some(msg) = assembler.message().cloned() {
                        self.state.lock().store.upsert(msg.clone());
                        let _ = self.event_tx.send(EngineEvent::StreamUpdate { message: msg });
                    }
                }
                Fold::Completed => {
                    if let Some(msg) = assembler.message().cloned() {
                        let snippet = msg.snippet(self.snippet_chars);
                        {
                            let mut state = self.state.lock();
                            state.store.upsert(msg.clone());
                            state.directory.touch(&session_id, msg.timestamp, snippet);
                        }
                        let _ = self.event_tx.send(EngineEvent::StreamEnd { message: msg });
                        let _ = self.event_tx.send(EngineEvent::SessionsChanged);
                        delivered = true;
                    }
                }
                Fold::Failed(error) => {
                    if let Some(msg) = assembler.message().cloned() {
                        self.state.lock().store.upsert(msg.clone());
                        let _ = self.event_tx.send(EngineEvent::StreamEnd { message: msg });
                    }
                    tracing::warn!(session_id = %session_id, error = %error, "reply stream errored");
                    let _ = self.event_tx.send(EngineEvent::EngineError { message: error });
                }
                Fold::Ignored => {}
            }
        }

        // A stream that dries up without a terminal chunk broke the channel
        // contract; settle whatever was assembled as an error.
        if !assembler.is_done() {
            if let Some(mut msg) = assembler.into_message() {
                tracing::warn!(message_id = %msg.id, "chunk stream ended without terminal chunk");
                msg.status = MessageStatus::Error;
                msg.timestamp = now_millis();
                self.state.lock().store.upsert(msg.clone());
                let _ = self.event_tx.send(EngineEvent::StreamEnd { message: msg });
            }
        }

        // Swap the placeholder for the confirmed user message, keeping its
        // position. On a failed stream the swap still happens (the message
        // was acknowledged) but only a delivered reply counts as activity.
        {
            let user_message = reply.user_message;
            let user_snippet = user_message.snippet(self.snippet_chars);
            let user_stamp = user_message.timestamp;
            let mut state = self.state.lock();
            match state.store.replace_optimistic(&temp_id, user_message) {
                Ok(()) => {
                    if delivered {
                        state.directory.touch(&session_id, user_stamp, user_snippet);
                    }
                }
                Err(e) => {
                    tracing::debug!(error = %e, "placeholder already gone, skipping swap");
                }
            }
        }
        let _ = self.event_tx.send(EngineEvent::MessagesChanged {
            session_id: session_id.clone(),
        });
        if delivered {
            let _ = self.event_tx.send(EngineEvent::SessionsChanged);
        }

        self.release();
        Ok(())
    }

    /// Enter edit mode for a user-authored message. Rejected while a reply
    /// stream is in progress, for unknown ids, and for non-user messages.
    pub fn begin_edit(&self, message_id: &MessageId) {
        let mut state = self.state.lock();
        if state.busy {
            tracing::debug!(message_id = %message_id, "edit rejected: reply in progress");
            return;
        }
        match state.store.get(message_id) {
            Some(msg) if msg.role == Role::User => {
                state.editing = Some(message_id.clone());
            }
            Some(_) => {
                tracing::debug!(message_id = %message_id, "edit rejected: not a user message");
            }
            None => {
                tracing::debug!(message_id = %message_id, "edit rejected: unknown message");
            }
        }
    }

    /// Leave edit mode without saving
    pub fn cancel_edit(&self) {
        self.state.lock().editing = None;
    }

    /// Save the open edit through the collaborator.
    ///
    /// Dropped with no state change if a reply stream started in the
    /// meantime. Updates content and timestamp only; historical edits do not
    /// change the session's activity ordering.
    pub async fn save_edit(&self, new_content: &str) {
        let message_id = {
            let state = self.state.lock();
            if state.busy {
                tracing::debug!("edit save dropped: reply in progress");
                return;
            }
            let Some(id) = state.editing.clone() else {
                tracing::debug!("edit save dropped: no edit in progress");
                return;
            };
            id
        };

        let updated = match self.channel.edit(&message_id, new_content).await {
            Ok(updated) => updated,
            Err(e) => {
                tracing::debug!(message_id = %message_id, error = %e, "edit save was a no-op");
                self.state.lock().editing = None;
                return;
            }
        };

        let session_id = updated.session_id.clone();
        {
            let mut state = self.state.lock();
            let result = state.store.mutate(&message_id, |msg| {
                msg.content = updated.content.clone();
                msg.timestamp = updated.timestamp;
            });
            if let Err(e) = result {
                tracing::debug!(message_id = %message_id, error = %e, "edited message vanished");
            }
            state.editing = None;
        }
        let _ = self
            .event_tx
            .send(EngineEvent::MessagesChanged { session_id });
    }

    /// Resend a prior message as a single-shot acknowledgment.
    ///
    /// Holds the single-flight lock while the acknowledgment is produced; the
    /// reply is appended whole rather than streamed.
    pub async fn resend(&self, message_id: &MessageId) -> Result<()> {
        {
            let mut state = self.state.lock();
            if state.busy {
                tracing::debug!(message_id = %message_id, "resend rejected: reply in progress");
                return Ok(());
            }
            if state.active_session.is_none() {
                tracing::debug!("resend rejected: no active session");
                return Ok(());
            }
            state.busy = true;
        }
        let _ = self.event_tx.send(EngineEvent::BusyChanged { busy: true });

        match self.channel.resend(message_id).await {
            Ok(message) => {
                let session_id = message.session_id.clone();
                let snippet = message.snippet(self.snippet_chars);
                let stamp = message.timestamp;
                let result = {
                    let mut state = self.state.lock();
                    let result = state.store.append(message);
                    if result.is_ok() {
                        state.directory.touch(&session_id, stamp, snippet);
                    }
                    result
                };
                let _ = self
                    .event_tx
                    .send(EngineEvent::MessagesChanged { session_id });
                let _ = self.event_tx.send(EngineEvent::SessionsChanged);
                self.release();
                result
            }
            Err(Error::NotFound(id)) => {
                tracing::debug!(message_id = %id, "resend was a no-op: unknown message");
                self.release();
                Ok(())
            }
            Err(e) => {
                tracing::warn!(message_id = %message_id, error = %e, "resend failed");
                let _ = self.event_tx.send(EngineEvent::EngineError {
                    message: e.to_string(),
                });
                self.release();
                Ok(())
            }
        }
    }

    // ---- Private helpers ----

    /// Mark the placeholder failed and release the lock. No directory touch.
    fn settle_failed_send(&self, session_id: &SessionId, temp_id: &MessageId, error: &Error) {
        tracing::warn!(session_id = %session_id, error = %error, "send failed at the channel");
        let result = self.state.lock().store.mutate(temp_id, |msg| {
            msg.status = MessageStatus::Error;
            msg.content = format!("{}\n[send failed: {error}]", msg.content);
            msg.timestamp = now_millis();
        });
        if let Err(e) = result {
            tracing::debug!(error = %e, "failed placeholder vanished before settling");
        }
        let _ = self.event_tx.send(EngineEvent::MessagesChanged {
            session_id: session_id.clone(),
        });
        let _ = self.event_tx.send(EngineEvent::EngineError {
            message: error.to_string(),
        });
        self.release();
    }

    /// Release the single-flight lock
    fn release(&self) {
        self.state.lock().busy = false;
        let _ = self.event_tx.send(EngineEvent::BusyChanged { busy: false });
    }
}
