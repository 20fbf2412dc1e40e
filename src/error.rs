use std::fmt;

use crate::broker::BrokerError;

/// Failure while encoding or decoding an envelope on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    Encode(String),
    Decode(String),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::Encode(message) => write!(f, "envelope encode failed: {}", message),
            CodecError::Decode(message) => write!(f, "envelope decode failed: {}", message),
        }
    }
}

impl std::error::Error for CodecError {}

/// Errors surfaced to callers at subscribe time or send time.
///
/// Steady-state per-message failures (decode, handler, ack) are never
/// represented here; the delivery loop absorbs and logs them so one
/// bad message cannot halt the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessagingError {
    /// `subscribe` was called with an empty subscriber id.
    EmptySubscriberId,
    /// `subscribe` was called with no channels.
    NoChannels,
    /// The broker refused an open, send, or close.
    Broker(BrokerError),
    /// The envelope could not be encoded for sending.
    Codec(CodecError),
}

impl fmt::Display for MessagingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessagingError::EmptySubscriberId => write!(f, "subscriber id must not be empty"),
            MessagingError::NoChannels => write!(f, "subscription needs at least one channel"),
            MessagingError::Broker(err) => write!(f, "broker error: {}", err),
            MessagingError::Codec(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for MessagingError {}

impl From<BrokerError> for MessagingError {
    fn from(err: BrokerError) -> Self {
        MessagingError::Broker(err)
    }
}

impl From<CodecError> for MessagingError {
    fn from(err: CodecError) -> Self {
        MessagingError::Codec(err)
    }
}
