//! colloquy-engine: Streaming conversation orchestration
//!
//! This crate holds the session directory, the per-session message store, and
//! the conversation engine that drives them in response to user intents while
//! a reply streams in chunk by chunk.

pub mod channel;
pub mod directory;
pub mod engine;
pub mod error;
pub mod events;
pub mod store;

pub use channel::{ReplyChannel, SendReply};
pub use directory::ChatDirectory;
pub use engine::ConversationEngine;
pub use error::{Error, Result};
pub use events::EngineEvent;
pub use store::MessageStore;
