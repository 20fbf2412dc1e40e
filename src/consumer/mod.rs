//! The consumption engine.
//!
//! Maps logical channels to broker destinations, runs one delivery
//! loop per subscribed destination, wraps every delivered message in
//! the transactional dedup-then-handle-then-acknowledge protocol, and
//! shuts everything down without losing or double-processing in-flight
//! messages.
//!
//! ```text
//! subscribe(subscriber_id, channels, handler)
//!        │ resolve each channel ──► Destination
//!        │ open one broker consumer per destination
//!        ▼
//! ┌──────────────────────── Subscription ─────────────────────────┐
//! │  loop per destination        loop per destination             │
//! │  poll(100ms) ─► decode ─► tx { dedup? ─► handler } ─► ack     │
//! └──────────────── shared stop flag, joined on close ────────────┘
//! ```

mod delivery;
mod subscription;

pub use subscription::Subscription;

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use std::thread;

use crate::broker::{BrokerClient, ConsumerHandle};
use crate::channel::{Channel, Destination};
use crate::dedup::{DuplicateMessageDetector, NoopDuplicateMessageDetector};
use crate::error::MessagingError;
use crate::interceptor::MessageInterceptor;
use crate::message::Envelope;
use crate::transaction::{NoopTransactionScope, TransactionScope};

use delivery::DeliveryLoop;

/// Error raised by an application handler.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Application callback invoked once per non-duplicate delivery.
///
/// Implemented for any matching closure:
///
/// ```
/// use consumed_rust::{Envelope, HandlerError};
///
/// let handler = |envelope: &Envelope| -> Result<(), HandlerError> {
///     println!("got {}", envelope.id);
///     Ok(())
/// };
/// # let _ = handler;
/// ```
pub trait MessageHandler: Send + Sync {
    fn handle(&self, envelope: &Envelope) -> Result<(), HandlerError>;
}

impl<F> MessageHandler for F
where
    F: Fn(&Envelope) -> Result<(), HandlerError> + Send + Sync,
{
    fn handle(&self, envelope: &Envelope) -> Result<(), HandlerError> {
        self(envelope)
    }
}

/// What a delivery loop does when a handler returns an error.
///
/// The message is acknowledged in either case; acknowledgment is
/// unconditional, once per delivery attempt.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HandlerFailurePolicy {
    /// Log the error and keep consuming. The default: broker-level
    /// redelivery of a failing message would retry without backoff, so
    /// callers needing retry implement it inside the handler.
    #[default]
    ContinueOnError,
    /// Log the error, acknowledge the failing message, then stop this
    /// subscription's loops.
    StopSubscription,
}

/// The consumption engine. Owns every live [`Subscription`] created
/// through it.
///
/// ## Example
///
/// ```
/// use std::sync::Arc;
/// use consumed_rust::{Channel, Envelope, HandlerError, InMemoryBroker, MessageConsumer};
///
/// let broker = Arc::new(InMemoryBroker::new());
/// let consumer = MessageConsumer::new(Arc::clone(&broker));
///
/// let orders = [Channel::point_to_point("orders")];
/// let subscription = consumer
///     .subscribe("billing", &orders, |e: &Envelope| -> Result<(), HandlerError> {
///         println!("order event {}", e.id);
///         Ok(())
///     })
///     .unwrap();
///
/// subscription.close();
/// consumer.shutdown();
/// ```
pub struct MessageConsumer<B: BrokerClient + 'static> {
    broker: Arc<B>,
    detector: Arc<dyn DuplicateMessageDetector>,
    transactions: Arc<dyn TransactionScope>,
    interceptors: Vec<Arc<dyn MessageInterceptor>>,
    policy: HandlerFailurePolicy,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl<B: BrokerClient + 'static> MessageConsumer<B> {
    /// Engine with the no-op detector and transaction scope.
    pub fn new(broker: Arc<B>) -> Self {
        MessageConsumer {
            broker,
            detector: Arc::new(NoopDuplicateMessageDetector),
            transactions: Arc::new(NoopTransactionScope),
            interceptors: Vec::new(),
            policy: HandlerFailurePolicy::default(),
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    /// Use a duplicate message detector (typically backed by the same
    /// store the handlers write to).
    pub fn with_detector(mut self, detector: Arc<dyn DuplicateMessageDetector>) -> Self {
        self.detector = detector;
        self
    }

    /// Use a transaction scope wrapping each per-message protocol run.
    pub fn with_transaction_scope(mut self, transactions: Arc<dyn TransactionScope>) -> Self {
        self.transactions = transactions;
        self
    }

    /// Set the handler failure policy for subscriptions created after
    /// this call.
    pub fn with_policy(mut self, policy: HandlerFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Add an interceptor observing the handle path.
    pub fn with_interceptor(mut self, interceptor: Arc<dyn MessageInterceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Register `handler` under `subscriber_id` for every channel in
    /// `channels`.
    ///
    /// Opens one broker consumer per distinct resolved destination and
    /// starts one delivery loop per consumer. If any open fails, the
    /// consumers already opened by this call are closed, no loops are
    /// started, and the error is returned.
    pub fn subscribe<H>(
        &self,
        subscriber_id: &str,
        channels: &[Channel],
        handler: H,
    ) -> Result<Subscription, MessagingError>
    where
        H: MessageHandler + 'static,
    {
        if subscriber_id.is_empty() {
            return Err(MessagingError::EmptySubscriberId);
        }
        if channels.is_empty() {
            return Err(MessagingError::NoChannels);
        }

        let mut destinations: Vec<Destination> = Vec::new();
        for channel in channels {
            let destination = Destination::for_consumer(channel, subscriber_id);
            if !destinations.contains(&destination) {
                destinations.push(destination);
            }
        }

        let mut consumers: Vec<ConsumerHandle> = Vec::new();
        for destination in &destinations {
            match self.broker.open_consumer(destination) {
                Ok(handle) => consumers.push(handle),
                Err(err) => {
                    for opened in &consumers {
                        if let Err(close_err) = self.broker.close_consumer(opened) {
                            tracing::error!(
                                destination = %opened.destination(),
                                error = %close_err,
                                "failed to close consumer while unwinding subscribe"
                            );
                        }
                    }
                    return Err(err.into());
                }
            }
        }

        let stop = Arc::new(AtomicBool::new(false));
        let subscription = Subscription::new(subscriber_id.to_string(), Arc::clone(&stop));
        let handler: Arc<dyn MessageHandler> = Arc::new(handler);

        for consumer in consumers {
            let delivery = DeliveryLoop {
                broker: Arc::clone(&self.broker),
                detector: Arc::clone(&self.detector),
                transactions: Arc::clone(&self.transactions),
                interceptors: self.interceptors.clone(),
                policy: self.policy,
                subscriber_id: subscriber_id.to_string(),
                handler: Arc::clone(&handler),
                stop: Arc::clone(&stop),
                consumer,
            };
            subscription.attach_loop(thread::spawn(move || delivery.run()));
        }

        self.subscriptions.lock().unwrap().push(subscription.clone());
        Ok(subscription)
    }

    /// Close every live subscription and wait for all delivery loops
    /// to stop. Idempotent.
    pub fn shutdown(&self) {
        let subscriptions: Vec<Subscription> = {
            let mut live = self.subscriptions.lock().unwrap();
            live.drain(..).collect()
        };
        for subscription in subscriptions {
            subscription.close();
        }
    }
}
