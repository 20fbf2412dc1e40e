//! A live subscription and its loop lifecycle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

/// Handle to one logical registration of a handler against a set of
/// channels. Owns one delivery loop per resolved destination.
///
/// Each subscription carries its own stop flag, so closing one
/// subscription never touches another's loops.
#[derive(Clone, Debug)]
pub struct Subscription {
    inner: Arc<SubscriptionInner>,
}

#[derive(Debug)]
pub(super) struct SubscriptionInner {
    subscriber_id: String,
    stop: Arc<AtomicBool>,
    loops: Mutex<Vec<JoinHandle<()>>>,
}

impl Subscription {
    pub(super) fn new(subscriber_id: String, stop: Arc<AtomicBool>) -> Self {
        Subscription {
            inner: Arc::new(SubscriptionInner {
                subscriber_id,
                stop,
                loops: Mutex::new(Vec::new()),
            }),
        }
    }

    pub(super) fn attach_loop(&self, handle: JoinHandle<()>) {
        self.inner.loops.lock().unwrap().push(handle);
    }

    /// The subscriber identity this subscription was created under.
    pub fn subscriber_id(&self) -> &str {
        &self.inner.subscriber_id
    }

    /// Whether `close` has completed (or the loops stopped themselves).
    pub fn is_closed(&self) -> bool {
        self.inner.stop.load(Ordering::SeqCst) && self.inner.loops.lock().unwrap().is_empty()
    }

    /// Stop this subscription's delivery loops and wait for them to
    /// exit. Any message mid-handler is finished first; no message is
    /// delivered after this returns. Idempotent.
    pub fn close(&self) {
        self.inner.stop.store(true, Ordering::SeqCst);

        let handles: Vec<JoinHandle<()>> = {
            let mut loops = self.inner.loops.lock().unwrap();
            loops.drain(..).collect()
        };

        for handle in handles {
            if handle.join().is_err() {
                tracing::error!(
                    subscriber_id = %self.inner.subscriber_id,
                    "delivery loop panicked"
                );
            }
        }
    }
}
