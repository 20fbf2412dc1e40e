use std::collections::HashSet;
use std::sync::Mutex;

use super::DuplicateMessageDetector;

/// In-memory detector backed by a set of (subscriber, message id)
/// pairs. Append-only; entries never expire.
///
/// ## Example
///
/// ```
/// use consumed_rust::{DuplicateMessageDetector, InMemoryDuplicateMessageDetector};
///
/// let detector = InMemoryDuplicateMessageDetector::new();
/// assert!(!detector.is_duplicate("billing", "m5"));
/// assert!(detector.is_duplicate("billing", "m5"));
/// assert!(!detector.is_duplicate("audit", "m5"));
/// ```
#[derive(Debug, Default)]
pub struct InMemoryDuplicateMessageDetector {
    seen: Mutex<HashSet<(String, String)>>,
}

impl InMemoryDuplicateMessageDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-mark a pair as processed without consulting it.
    pub fn record(&self, subscriber_id: &str, message_id: &str) {
        self.seen
            .lock()
            .unwrap()
            .insert((subscriber_id.to_string(), message_id.to_string()));
    }

    /// Number of recorded pairs.
    pub fn len(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.lock().unwrap().is_empty()
    }
}

impl DuplicateMessageDetector for InMemoryDuplicateMessageDetector {
    fn is_duplicate(&self, subscriber_id: &str, message_id: &str) -> bool {
        let mut seen = self.seen.lock().unwrap();
        !seen.insert((subscriber_id.to_string(), message_id.to_string()))
    }
}
