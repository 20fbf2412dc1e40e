use super::DuplicateMessageDetector;

/// Detector that never reports a duplicate.
///
/// The default when no persistent dedup store is configured, and a
/// valid strategy for transports with natural dedup (true
/// exactly-once destinations).
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopDuplicateMessageDetector;

impl DuplicateMessageDetector for NoopDuplicateMessageDetector {
    fn is_duplicate(&self, _subscriber_id: &str, _message_id: &str) -> bool {
        false
    }
}
