//! JSON wire codec for [`Envelope`].
//!
//! The broker carries opaque bytes; this codec is the single place
//! those bytes take shape. It must round-trip id, headers, and payload
//! exactly, so both functions go through the same serde derivation on
//! `Envelope` and nothing else.

use crate::error::CodecError;
use crate::message::Envelope;

/// Encode an envelope to its JSON wire form.
pub fn encode(envelope: &Envelope) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(envelope).map_err(|e| CodecError::Encode(e.to_string()))
}

/// Decode an envelope from its JSON wire form.
pub fn decode(bytes: &[u8]) -> Result<Envelope, CodecError> {
    serde_json::from_slice(bytes).map_err(|e| CodecError::Decode(e.to_string()))
}
