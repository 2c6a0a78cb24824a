//! Best-effort audit recording.

use std::sync::Arc;

use crate::store::{AuditRecord, Store};

/// Fire-and-forget wrapper around the store's audit append.
///
/// Failure here is logged and swallowed: audit completeness is secondary to
/// the availability of the primary operation, which has already committed by
/// the time `record` runs.
#[derive(Clone)]
pub struct AuditRecorder {
    store: Arc<dyn Store>,
}

impl AuditRecorder {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Append one audit record. Never fails the caller.
    pub async fn record(&self, record: AuditRecord) {
        let action = record.action.clone();
        if let Err(e) = self.store.append_audit(record).await {
            tracing::warn!(action = %action, error = %e, "audit append failed; continuing");
        }
    }
}
