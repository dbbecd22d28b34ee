//! Outbox error types.

use crate::MessageId;
use thiserror::Error;

/// Outbox error type.
#[derive(Error, Debug)]
pub enum OutboxError {
    /// The channel refused the bundle; recovered by queueing it.
    #[error("Channel unavailable for message {0}")]
    ChannelUnavailable(MessageId),

    /// An acknowledgement referenced a message that is not awaiting one.
    #[error("Unknown correlation for message {0}")]
    UnknownCorrelation(MessageId),

    /// Every `u32` message id has been handed out.
    #[error("Message id space exhausted")]
    IdSpaceExhausted,

    /// The bundle could not be encoded into the wire document.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// An inbound acknowledgement was missing fields or had the wrong shape.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using OutboxError.
pub type OutboxResult<T> = Result<T, OutboxError>;
