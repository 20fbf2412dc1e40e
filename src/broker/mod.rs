//! The broker client capability.
//!
//! Everything this crate needs from a transport: open a consumer on a
//! destination, receive with a bounded wait, acknowledge, send, close.
//! Connection management, wire protocol, and topology belong to the
//! implementation behind the trait; destination names are opaque
//! strings built by [`Destination`](crate::Destination).

mod in_memory;

pub use in_memory::InMemoryBroker;

use std::fmt;
use std::time::Duration;

use crate::channel::Destination;

/// A message as delivered by the broker, before decoding.
#[derive(Clone, Debug)]
pub struct RawMessage {
    /// Broker-assigned delivery id; the acknowledgment token.
    pub delivery_id: u64,
    /// The destination this message was received from.
    pub destination: String,
    /// Partition/group key the producer sent with, if any.
    pub key: Option<String>,
    /// Encoded envelope bytes.
    pub body: Vec<u8>,
}

/// Opaque token for one open broker consumer.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ConsumerHandle {
    pub(crate) id: u64,
    pub(crate) destination: Destination,
}

impl ConsumerHandle {
    /// The destination this consumer is attached to.
    pub fn destination(&self) -> &Destination {
        &self.destination
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerError {
    /// The destination does not exist or cannot be opened.
    UnknownDestination(String),
    /// The consumer handle was already closed.
    ConsumerClosed(u64),
    /// The broker itself has shut down.
    Disconnected,
}

impl fmt::Display for BrokerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrokerError::UnknownDestination(name) => {
                write!(f, "unknown destination: {}", name)
            }
            BrokerError::ConsumerClosed(id) => write!(f, "consumer {} is closed", id),
            BrokerError::Disconnected => write!(f, "broker is disconnected"),
        }
    }
}

impl std::error::Error for BrokerError {}

/// The transport surface this crate consumes.
///
/// Implementations must be safe for concurrent use: every delivery
/// loop calls `receive` and `acknowledge` from its own thread, and
/// producers call `send` from caller threads.
pub trait BrokerClient: Send + Sync {
    /// Open a consumer on a destination.
    fn open_consumer(&self, destination: &Destination) -> Result<ConsumerHandle, BrokerError>;

    /// Receive the next message for this consumer, waiting at most
    /// `timeout`. `Ok(None)` means the wait elapsed with nothing to
    /// deliver.
    fn receive(
        &self,
        handle: &ConsumerHandle,
        timeout: Duration,
    ) -> Result<Option<RawMessage>, BrokerError>;

    /// Mark a received message as consumed.
    fn acknowledge(&self, message: &RawMessage) -> Result<(), BrokerError>;

    /// Send bytes to a destination. `key` groups messages for ordering
    /// where the transport supports it.
    fn send(
        &self,
        destination: &Destination,
        key: Option<&str>,
        body: &[u8],
    ) -> Result<(), BrokerError>;

    /// Close a consumer. Closing an already-closed handle is an error.
    fn close_consumer(&self, handle: &ConsumerHandle) -> Result<(), BrokerError>;
}
