// crates/sponsormatch-core/src/audit.rs
// ============================================================================
// Module: Audit-Trace Store
// Description: Opaque-id-keyed retrieval of the decision record for an
//   explain call.
// Purpose: Make every match decision explainable after the fact, bounded in
//   memory.
// Dependencies: sponsormatch-core::identifiers, sponsormatch-core::model
// ============================================================================

//! ## Overview
//! A bounded in-memory map from [`MatchId`] to [`AuditTrace`], capacity
//! 10,000, FIFO eviction. Writes occur at the end of a successful match, one
//! entry per returned candidate (all mapping to the same trace value by
//! independent copy). A missing id returns a well-known not-found result,
//! never an error.
//!
//! Invariants:
//! - After `N > capacity` successful inserts, the store holds at most
//!   `capacity` entries.
//! - Eviction order under concurrency need not be strict FIFO; the only
//!   invariant is "never exceed capacity by more than the number of
//!   in-flight inserts".

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::identifiers::MatchId;
use crate::model::AuditTrace;

/// Default capacity of the audit-trace store, per the component design.
pub const AUDIT_STORE_CAPACITY: usize = 10_000;

struct AuditTraceInner {
    entries: HashMap<MatchId, AuditTrace>,
    order: VecDeque<MatchId>,
    capacity: usize,
}

impl AuditTraceInner {
    fn insert(&mut self, match_id: MatchId, trace: AuditTrace) {
        if !self.entries.contains_key(&match_id) {
            self.order.push_back(match_id);
        }
        self.entries.insert(match_id, trace);
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }
}

/// Bounded, thread-safe audit-trace store.
pub struct AuditTraceStore {
    inner: Mutex<AuditTraceInner>,
}

impl AuditTraceStore {
    /// Creates an empty store with [`AUDIT_STORE_CAPACITY`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(AUDIT_STORE_CAPACITY)
    }

    /// Creates an empty store with a custom capacity (used in tests).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(AuditTraceInner {
                entries: HashMap::new(),
                order: VecDeque::new(),
                capacity,
            }),
        }
    }

    /// Stores `trace` under `match_id`, evicting the oldest entry if the
    /// store is at capacity.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned by a prior panic while held.
    pub fn insert(&self, match_id: MatchId, trace: AuditTrace) {
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.insert(match_id, trace);
    }

    /// Looks up the trace for `match_id`, if any.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned by a prior panic while held.
    #[must_use]
    pub fn get(&self, match_id: MatchId) -> Option<AuditTrace> {
        let inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.entries.get(&match_id).cloned()
    }

    /// Returns the current number of stored entries.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned by a prior panic while held.
    #[must_use]
    pub fn len(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.entries.len()
    }

    /// Returns true if the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for AuditTraceStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, reason = "Test-only lookups use expect for clarity.")]

    use super::*;
    use crate::identifiers::RequestId;
    use crate::model::MatchConstraints;
    use crate::model::PlacementContext;
    use std::collections::BTreeMap;

    fn trace(request_id: RequestId) -> AuditTrace {
        AuditTrace {
            request_id,
            placement: PlacementContext::default(),
            context_prefix: String::new(),
            constraints: MatchConstraints::default(),
            boost: BTreeMap::new(),
            decisions: vec![],
            source: None,
        }
    }

    #[test]
    fn stores_and_retrieves_a_trace() {
        let store = AuditTraceStore::new();
        let request_id = RequestId::generate();
        let match_id = MatchId::derive(request_id, &crate::identifiers::CreativeId::new("c1"));
        store.insert(match_id, trace(request_id));
        let fetched = store.get(match_id).expect("trace present");
        assert_eq!(fetched.request_id, request_id);
    }

    #[test]
    fn missing_id_returns_none_not_a_panic() {
        let store = AuditTraceStore::new();
        let match_id = MatchId::derive(RequestId::generate(), &crate::identifiers::CreativeId::new("c1"));
        assert!(store.get(match_id).is_none());
    }

    #[test]
    fn evicts_oldest_entries_beyond_capacity() {
        let store = AuditTraceStore::with_capacity(2);
        let ids: Vec<MatchId> = (0..3)
            .map(|i| {
                let request_id = RequestId::generate();
                let match_id =
                    MatchId::derive(request_id, &crate::identifiers::CreativeId::new(format!("c{i}")));
                store.insert(match_id, trace(request_id));
                match_id
            })
            .collect();
        assert_eq!(store.len(), 2);
        assert!(store.get(ids[0]).is_none());
        assert!(store.get(ids[2]).is_some());
    }
}
