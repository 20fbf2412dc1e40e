//! Duplicate message detection.
//!
//! The broker delivers at least once; this seam is what turns that
//! into effectively-once handling. A detector answers, atomically,
//! "has this (subscriber, message id) pair been processed before?" and
//! records the pair while answering, so the check and the marking
//! cannot diverge. The consumption engine runs the check inside the
//! same transaction scope as the handler, so in a persistent
//! deployment the dedup mark and the handler's side effects commit or
//! roll back together.

mod in_memory;
mod noop;

pub use in_memory::InMemoryDuplicateMessageDetector;
pub use noop::NoopDuplicateMessageDetector;

/// Records which (subscriber id, message id) pairs have been processed.
///
/// Must be safe for concurrent use by many delivery loops; duplicate
/// answers must be at least read-your-own-writes within a process.
/// Cross-process atomicity is the backing store's responsibility.
pub trait DuplicateMessageDetector: Send + Sync {
    /// Check and record in one step: returns `true` if the pair was
    /// already processed, and marks it processed otherwise.
    fn is_duplicate(&self, subscriber_id: &str, message_id: &str) -> bool;
}
