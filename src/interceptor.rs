//! Interceptors observing the send and handle paths.

use crate::message::Envelope;

/// Hooks invoked around producing and handling a message.
///
/// All methods default to no-ops; implement the ones you need.
/// `pre_send` may mutate the envelope (e.g. stamping tracing headers)
/// before it is encoded.
pub trait MessageInterceptor: Send + Sync {
    /// Called before the envelope is encoded and sent.
    fn pre_send(&self, _envelope: &mut Envelope) {}

    /// Called after a successful broker send.
    fn post_send(&self, _envelope: &Envelope) {}

    /// Called before the subscriber's handler runs.
    fn pre_handle(&self, _subscriber_id: &str, _envelope: &Envelope) {}

    /// Called after the subscriber's handler returns, regardless of
    /// outcome.
    fn post_handle(&self, _subscriber_id: &str, _envelope: &Envelope) {}
}
