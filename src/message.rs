//! The message envelope carried over the broker.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Well-known header names.
///
/// Producers stamp `DESTINATION`, `PARTITION_KEY` and `DATE` on every
/// send; `CORRELATION_ID` and `REPLY_TO` are conventions for
/// request/reply flows built on top of this crate.
pub mod headers {
    pub const CORRELATION_ID: &str = "correlation_id";
    pub const REPLY_TO: &str = "reply_to";
    pub const DESTINATION: &str = "destination";
    pub const PARTITION_KEY: &str = "partition_key";
    pub const DATE: &str = "date";
}

/// The wire unit: a unique id, string headers, and an opaque payload.
///
/// `id` is the dedup key: globally unique per logical message instance
/// and stable across broker retries and redelivery. Producers assign it
/// (or leave it empty and let [`MessageProducer`](crate::MessageProducer)
/// assign one).
///
/// ## Example
///
/// ```
/// use consumed_rust::Envelope;
///
/// let envelope = Envelope::with_string_payload("msg-1", r#"{"order":"o-42"}"#)
///     .with_header("correlation_id", "req-7");
///
/// assert_eq!(envelope.id, "msg-1");
/// assert_eq!(envelope.payload_str(), Some(r#"{"order":"o-42"}"#));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Unique identifier for this message instance.
    pub id: String,
    /// String headers (correlation/reply-to metadata and the like).
    pub headers: HashMap<String, String>,
    /// Opaque payload bytes, typically JSON text.
    pub payload: Vec<u8>,
}

impl Envelope {
    /// Create an envelope with the given id and payload bytes.
    pub fn new(id: impl Into<String>, payload: Vec<u8>) -> Self {
        Envelope {
            id: id.into(),
            headers: HashMap::new(),
            payload,
        }
    }

    /// Create an envelope with a string payload.
    pub fn with_string_payload(id: impl Into<String>, payload: impl Into<String>) -> Self {
        Envelope::new(id, payload.into().into_bytes())
    }

    /// Create an envelope with a JSON-serialized payload.
    pub fn encode_payload<T: Serialize>(
        id: impl Into<String>,
        payload: &T,
    ) -> Result<Self, serde_json::Error> {
        let bytes = serde_json::to_vec(payload)?;
        Ok(Envelope::new(id, bytes))
    }

    /// Decode the payload as JSON.
    pub fn decode_payload<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.payload)
    }

    /// Add a header to the envelope.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Get a header value.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }

    /// Get the payload as a string (if valid UTF-8).
    pub fn payload_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }
}
