//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use consumed_rust::{Envelope, HandlerError};

/// Install a test subscriber honoring `RUST_LOG`. Safe to call from
/// every test; only the first call wins.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Poll `check` until it returns true or `timeout` elapses; panic with
/// `what` on timeout.
pub fn eventually(timeout: Duration, what: &str, check: impl Fn() -> bool) {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if check() {
            return;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    panic!("condition not met within {:?}: {}", timeout, what);
}

/// Convenience for the common 2-second wait.
pub fn eventually_default(what: &str, check: impl Fn() -> bool) {
    eventually(Duration::from_secs(2), what, check);
}

/// Collects envelopes delivered to a handler, in arrival order.
#[derive(Clone, Default)]
pub struct Delivered {
    inner: Arc<Mutex<Vec<Envelope>>>,
}

impl Delivered {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handler that records every envelope and succeeds.
    pub fn handler(
        &self,
    ) -> impl Fn(&Envelope) -> Result<(), HandlerError> + Send + Sync + 'static {
        let inner = Arc::clone(&self.inner);
        move |envelope: &Envelope| {
            inner.lock().unwrap().push(envelope.clone());
            Ok(())
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ids(&self) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.id.clone())
            .collect()
    }

    pub fn payloads(&self) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| e.payload_str().map(str::to_string))
            .collect()
    }
}
