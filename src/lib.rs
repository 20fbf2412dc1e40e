//! Transactional messaging for Rust.
//!
//! Services publish domain events and commands as [`Envelope`]s over
//! an at-least-once broker and consume them effectively-once: every
//! delivered message passes through a transactional boundary combining
//! duplicate suppression, application handling, and acknowledgment.
//!
//! ```text
//! MessageProducer ──send──► broker destination
//!                               │ at-least-once delivery
//!                               ▼
//! MessageConsumer ── delivery loop per destination ──► tx {
//!     duplicate? ── yes ─► skip handler
//!                └─ no ──► handler(envelope)
//!     acknowledge (always, exactly once per attempt)
//! }
//! ```
//!
//! The broker, the dedup store, and the transaction manager are
//! capabilities behind traits ([`BrokerClient`],
//! [`DuplicateMessageDetector`], [`TransactionScope`]); in-memory
//! implementations of each ship with the crate.

mod broker;
mod channel;
pub mod codec;
mod consumer;
mod dedup;
mod error;
mod interceptor;
mod message;
mod producer;
mod transaction;

pub use broker::{BrokerClient, BrokerError, ConsumerHandle, InMemoryBroker, RawMessage};
pub use channel::{Channel, ChannelKind, Destination};
pub use consumer::{
    HandlerError, HandlerFailurePolicy, MessageConsumer, MessageHandler, Subscription,
};
pub use dedup::{
    DuplicateMessageDetector, InMemoryDuplicateMessageDetector, NoopDuplicateMessageDetector,
};
pub use error::{CodecError, MessagingError};
pub use interceptor::MessageInterceptor;
pub use message::{headers, Envelope};
pub use producer::MessageProducer;
pub use transaction::{NoopTransactionScope, TransactionScope};
