//! The scoped-transaction capability.
//!
//! The consumption engine wraps each delivered message (duplicate
//! check, handler, acknowledgment) in one transaction scope so that,
//! with a real implementation, the dedup mark and the handler's
//! database effects commit or roll back together. This crate does not
//! implement transaction semantics itself; it only threads the scope
//! around the per-message protocol.

/// Executes work inside one transaction boundary.
pub trait TransactionScope: Send + Sync {
    /// Run `work` within a transaction, committing when it returns.
    fn run_in_transaction(&self, work: &mut dyn FnMut());
}

/// Scope that runs the work directly, with no transaction. The
/// default.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopTransactionScope;

impl TransactionScope for NoopTransactionScope {
    fn run_in_transaction(&self, work: &mut dyn FnMut()) {
        work();
    }
}
