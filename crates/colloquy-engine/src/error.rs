//! Error types for colloquy-engine

use colloquy_chat::MessageId;
use thiserror::Error;

/// Result type alias using the engine Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during engine operations.
///
/// Validation failures (empty content, no active session, lock held) are not
/// errors: those intents are silent no-ops by design.
#[derive(Error, Debug)]
pub enum Error {
    /// A message id was appended twice to the same session (programmer error)
    #[error("duplicate message id: {0}")]
    DuplicateId(MessageId),

    /// An edit/resend/replace target does not exist
    #[error("message not found: {0}")]
    NotFound(MessageId),

    /// The reply channel failed
    #[error("reply channel failure: {0}")]
    Channel(String),
}
