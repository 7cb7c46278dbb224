//! colloquy-chat: Core chat data model and reply-stream assembly
//!
//! This crate defines the session/message/chunk types shared across the
//! workspace and the assembler that folds an ordered chunk sequence into a
//! single coherent message.

pub mod chunk;
pub mod stream;
pub mod types;

pub use chunk::Chunk;
pub use stream::{ChunkStream, Fold, StreamAssembler};
pub use types::{FormPayload, Message, MessageId, MessageStatus, Role, Session, SessionId};
