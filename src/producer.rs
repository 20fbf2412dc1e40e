//! Publishing envelopes to resolved destinations.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use uuid::Uuid;

use crate::broker::BrokerClient;
use crate::channel::Destination;
use crate::codec;
use crate::error::MessagingError;
use crate::interceptor::MessageInterceptor;
use crate::message::{headers, Envelope};

/// Sends envelopes to already-resolved destinations.
///
/// Thin by design: one encode, one network send, no buffering or
/// batching. Callers resolve the destination themselves (see
/// [`Destination::for_producer`]); in an outbox deployment the CDC
/// relay holds this producer and drains the outbox table through it.
///
/// ## Example
///
/// ```
/// use std::sync::Arc;
/// use consumed_rust::{Channel, Destination, Envelope, InMemoryBroker, MessageProducer};
///
/// let broker = Arc::new(InMemoryBroker::new());
/// let producer = MessageProducer::new(broker);
///
/// let orders = Channel::point_to_point("orders");
/// producer
///     .send(
///         &Destination::for_producer(&orders),
///         Some("customer-1"),
///         Envelope::with_string_payload("m-1", r#"{"total":12}"#),
///     )
///     .unwrap();
/// ```
pub struct MessageProducer<B: BrokerClient> {
    broker: Arc<B>,
    interceptors: Vec<Arc<dyn MessageInterceptor>>,
}

impl<B: BrokerClient> MessageProducer<B> {
    pub fn new(broker: Arc<B>) -> Self {
        MessageProducer {
            broker,
            interceptors: Vec::new(),
        }
    }

    /// Add an interceptor observing the send path.
    pub fn with_interceptor(mut self, interceptor: Arc<dyn MessageInterceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Send one envelope to a destination. `key` groups messages for
    /// ordering where the transport supports it.
    ///
    /// An empty envelope id is replaced with a fresh unique one; the
    /// destination, key, and send time are stamped into the headers.
    pub fn send(
        &self,
        destination: &Destination,
        key: Option<&str>,
        mut envelope: Envelope,
    ) -> Result<(), MessagingError> {
        if envelope.id.is_empty() {
            envelope.id = Uuid::new_v4().to_string();
        }
        envelope
            .headers
            .insert(headers::DESTINATION.to_string(), destination.to_string());
        if let Some(key) = key {
            envelope
                .headers
                .insert(headers::PARTITION_KEY.to_string(), key.to_string());
        }
        envelope
            .headers
            .insert(headers::DATE.to_string(), now_millis().to_string());

        for interceptor in &self.interceptors {
            interceptor.pre_send(&mut envelope);
        }

        let body = codec::encode(&envelope)?;
        self.broker.send(destination, key, &body)?;
        tracing::trace!(
            destination = %destination,
            message_id = %envelope.id,
            "sent message"
        );

        for interceptor in &self.interceptors {
            interceptor.post_send(&envelope);
        }
        Ok(())
    }
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}
