//! Message store: per-session ordered message history

use std::collections::HashMap;

use colloquy_chat::{Message, MessageId, SessionId};

use crate::error::{Error, Result};

/// Holds, per session, the ordered list of messages exchanged.
///
/// Insertion order coincides with conversation order. Mutated exclusively by
/// the conversation engine; readers get snapshots.
#[derive(Debug, Default)]
pub struct MessageStore {
    messages: HashMap<SessionId, Vec<Message>>,
}

impl MessageStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages for a session in conversation order; empty for an unknown
    /// session, never an error.
    pub fn list_for(&self, session_id: &SessionId) -> &[Message] {
        self.messages
            .get(session_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Whether any messages are held for this session
    pub fn has_session(&self, session_id: &SessionId) -> bool {
        self.messages.contains_key(session_id)
    }

    /// Seed a session's history wholesale, e.g. from a collaborator load
    pub fn seed(&mut self, session_id: SessionId, messages: Vec<Message>) {
        self.messages.insert(session_id, messages);
    }

    /// Append a new message to its session.
    ///
    /// Fails with `DuplicateId` if the id already exists in that session.
    pub fn append(&mut self, message: Message) -> Result<()> {
        let list = self.messages.entry(message.session_id.clone()).or_default();
        if list.iter().any(|m| m.id == message.id) {
            return Err(Error::DuplicateId(message.id));
        }
        list.push(message);
        Ok(())
    }

    /// Apply an in-place change to an existing message, wherever it lives.
    ///
    /// Fails with `NotFound` if no message with this id exists in the store.
    pub fn mutate(
        &mut self,
        message_id: &MessageId,
        updater: impl FnOnce(&mut Message),
    ) -> Result<()> {
        let found = self
            .messages
            .values_mut()
            .flat_map(|list| list.iter_mut())
            .find(|m| &m.id == message_id);
        match found {
            Some(msg) => {
                updater(msg);
                Ok(())
            }
            None => Err(Error::NotFound(message_id.clone())),
        }
    }

    /// Atomically swap an optimistic placeholder for the confirmed message,
    /// keeping its position in the sequence.
    ///
    /// Fails with `NotFound` if the placeholder is absent (e.g. already
    /// replaced).
    pub fn replace_optimistic(&mut self, temp_id: &MessageId, final_message: Message) -> Result<()> {
        let slot = self
            .messages
            .values_mut()
            .flat_map(|list| list.iter_mut())
            .find(|m| &m.id == temp_id);
        match slot {
            Some(msg) => {
                *msg = final_message;
                Ok(())
            }
            None => Err(Error::NotFound(temp_id.clone())),
        }
    }

    /// Insert the message if its id is new to the session, otherwise replace
    /// the stored copy in place. Used for streaming folds: insert on the
    /// first chunk, update thereafter.
    pub fn upsert(&mut self, message: Message) {
        let list = self.messages.entry(message.session_id.clone()).or_default();
        match list.iter_mut().find(|m| m.id == message.id) {
            Some(slot) => *slot = message,
            None => list.push(message),
        }
    }

    /// Look up a message anywhere in the store
    pub fn get(&self, message_id: &MessageId) -> Option<&Message> {
        self.messages
            .values()
            .flat_map(|list| list.iter())
            .find(|m| &m.id == message_id)
    }
}
