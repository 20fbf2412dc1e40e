//! The per-destination delivery loop.
//!
//! One loop runs per (subscription × destination), on its own thread.
//! Loops never talk to each other; the only shared state is the stop
//! flag of their subscription and the duplicate message detector.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::broker::{BrokerClient, ConsumerHandle, RawMessage};
use crate::codec;
use crate::dedup::DuplicateMessageDetector;
use crate::interceptor::MessageInterceptor;
use crate::transaction::TransactionScope;

use super::{HandlerFailurePolicy, MessageHandler};

/// Bounded receive wait, so a stop signal is observed within one
/// interval.
pub(super) const POLL_TIMEOUT: Duration = Duration::from_millis(100);

pub(super) struct DeliveryLoop<B: BrokerClient> {
    pub broker: Arc<B>,
    pub detector: Arc<dyn DuplicateMessageDetector>,
    pub transactions: Arc<dyn TransactionScope>,
    pub interceptors: Vec<Arc<dyn MessageInterceptor>>,
    pub policy: HandlerFailurePolicy,
    pub subscriber_id: String,
    pub handler: Arc<dyn MessageHandler>,
    pub stop: Arc<AtomicBool>,
    pub consumer: ConsumerHandle,
}

impl<B: BrokerClient> DeliveryLoop<B> {
    /// RUNNING until the stop flag is raised; any in-flight message is
    /// finished, then the consumer is closed and the loop exits.
    pub fn run(self) {
        while !self.stop.load(Ordering::SeqCst) {
            match self.broker.receive(&self.consumer, POLL_TIMEOUT) {
                Ok(None) => continue,
                Ok(Some(raw)) => self.process(&raw),
                Err(err) => {
                    tracing::error!(
                        destination = %self.consumer.destination(),
                        error = %err,
                        "receive failed"
                    );
                    std::thread::sleep(POLL_TIMEOUT);
                }
            }
        }

        if let Err(err) = self.broker.close_consumer(&self.consumer) {
            tracing::error!(
                destination = %self.consumer.destination(),
                error = %err,
                "failed to close consumer"
            );
        }
    }

    /// The transactional delivery protocol: decode, dedup-check,
    /// handle, acknowledge. Acknowledgment happens exactly once per
    /// delivery attempt, whatever the outcome of the other steps.
    fn process(&self, raw: &RawMessage) {
        let envelope = match codec::decode(&raw.body) {
            Ok(envelope) => envelope,
            Err(err) => {
                // Poison-message policy: acknowledge undecodable bytes
                // rather than let the broker redeliver them forever.
                tracing::warn!(
                    destination = %raw.destination,
                    error = %err,
                    "acknowledging undecodable message"
                );
                self.acknowledge(raw);
                return;
            }
        };

        self.transactions.run_in_transaction(&mut || {
            if self
                .detector
                .is_duplicate(&self.subscriber_id, &envelope.id)
            {
                tracing::trace!(
                    subscriber_id = %self.subscriber_id,
                    message_id = %envelope.id,
                    "duplicate message"
                );
            } else {
                for interceptor in &self.interceptors {
                    interceptor.pre_handle(&self.subscriber_id, &envelope);
                }

                tracing::trace!(
                    subscriber_id = %self.subscriber_id,
                    message_id = %envelope.id,
                    "invoking handler"
                );
                if let Err(err) = self.handler.handle(&envelope) {
                    match self.policy {
                        HandlerFailurePolicy::ContinueOnError => {
                            tracing::warn!(
                                subscriber_id = %self.subscriber_id,
                                message_id = %envelope.id,
                                error = %err,
                                "handler failed; message acknowledged"
                            );
                        }
                        HandlerFailurePolicy::StopSubscription => {
                            tracing::error!(
                                subscriber_id = %self.subscriber_id,
                                message_id = %envelope.id,
                                error = %err,
                                "handler failed; stopping subscription"
                            );
                            self.stop.store(true, Ordering::SeqCst);
                        }
                    }
                }

                for interceptor in &self.interceptors {
                    interceptor.post_handle(&self.subscriber_id, &envelope);
                }
            }

            self.acknowledge(raw);
        });
    }

    /// Ack failure is transient: the broker will redeliver and the
    /// detector will suppress the second handling.
    fn acknowledge(&self, raw: &RawMessage) {
        if let Err(err) = self.broker.acknowledge(raw) {
            tracing::error!(
                destination = %raw.destination,
                delivery_id = raw.delivery_id,
                error = %err,
                "acknowledge failed"
            );
        }
    }
}
