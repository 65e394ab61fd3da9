// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Result collection for pending Find/Resolve operations.
//!
//! A [`FindAggregator`] accumulates matching endpoint records as they arrive
//! (possibly from multiple responders, possibly out of order) until the
//! operation finalizes. A [`ResolveSlot`] holds at most one record: the first
//! well-formed answer wins.
//!
//! Both expose the same completion discipline: `finalize` is idempotent
//! (first caller wins), `offer` after finalization is a silent no-op, and the
//! blocking `wait` path is an adapter over the same completion state the
//! progressive listener path uses. The final result is delivered exactly
//! once per observer regardless of which path finalizes.
//!
//! Records are retained in arrival order, not source sequence order:
//! responders' clocks are independent and not reconciled. Deduplication of
//! records is the caller's responsibility via the duplicate-message window,
//! not the aggregator's.

use crate::record::EndpointRecord;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::Duration;

/// How a Find operation reports matches to its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionMode {
    /// Deliver the full record set once, at finalization.
    Batch,
    /// Notify the listener per record as it arrives, plus a final
    /// notification with the accumulated set.
    Progressive,
}

/// Terminal status of a Find/Resolve operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A responder asserted completeness, the max-results bound was reached,
    /// or (Resolve) the first answer arrived.
    Completed,
    /// The collection window elapsed. Expected steady-state behavior on an
    /// unreliable transport; an empty result is not a fault.
    DeadlineElapsed,
    /// The caller cancelled the operation.
    Cancelled,
    /// The operation failed (client shutdown or transport-reported failure).
    Failed(String),
}

/// Final result of a Find operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindResult {
    /// Matching records in arrival order. On `Outcome::Cancelled` this holds
    /// the records collected up to the cancellation.
    pub records: Vec<EndpointRecord>,
    /// How the operation ended.
    pub outcome: Outcome,
}

/// Final result of a Resolve operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveResult {
    /// The winning record, if any answer arrived before finalization.
    /// Always `None` on `Outcome::Cancelled`.
    pub record: Option<EndpointRecord>,
    /// How the operation ended.
    pub outcome: Outcome,
}

/// Progressive-mode notifications for a Find operation.
///
/// Called from transport receive threads; implementations must be
/// `Send + Sync`, must not block, and must not call back into the handle's
/// `wait` from inside a notification.
pub trait FindListener: Send + Sync {
    /// One new matching record arrived. `total` is the running count
    /// including this record.
    fn on_endpoint_found(&self, record: &EndpointRecord, total: usize);

    /// The operation finalized; `result` carries the accumulated set.
    fn on_completed(&self, result: &FindResult) {
        let _ = result;
    }
}

struct AggregatorState {
    collected: Vec<EndpointRecord>,
    outcome: Option<Outcome>,
}

/// Per-Find accumulator with progressive or batch delivery.
pub struct FindAggregator {
    mode: CollectionMode,
    listener: Option<Arc<dyn FindListener>>,
    state: Mutex<AggregatorState>,
    done: Condvar,
}

impl FindAggregator {
    /// Create an aggregator. Progressive mode without a listener degrades to
    /// batch-style silence but still collects.
    pub fn new(mode: CollectionMode, listener: Option<Arc<dyn FindListener>>) -> Self {
        Self {
            mode,
            listener,
            state: Mutex::new(AggregatorState {
                collected: Vec::new(),
                outcome: None,
            }),
            done: Condvar::new(),
        }
    }

    /// Append a record if the operation has not finalized.
    ///
    /// Returns the running count after the append, or `None` if the record
    /// was dropped because the operation already finalized. In progressive
    /// mode the listener is notified before the per-operation lock is
    /// released, so notifications arrive in collection order.
    pub fn offer(&self, record: EndpointRecord) -> Option<usize> {
        let mut state = self.state.lock();
        if state.outcome.is_some() {
            return None;
        }
        state.collected.push(record);
        let total = state.collected.len();
        if self.mode == CollectionMode::Progressive {
            if let Some(listener) = &self.listener {
                listener.on_endpoint_found(&state.collected[total - 1], total);
            }
        }
        Some(total)
    }

    /// Finalize with the given outcome. Idempotent: only the first call has
    /// effect and returns `true`; the listener's final notification fires at
    /// most once.
    pub fn finalize(&self, outcome: Outcome) -> bool {
        let result = {
            let mut state = self.state.lock();
            if state.outcome.is_some() {
                return false;
            }
            state.outcome = Some(outcome.clone());
            FindResult {
                records: state.collected.clone(),
                outcome,
            }
        };
        self.done.notify_all();
        if let Some(listener) = &self.listener {
            listener.on_completed(&result);
        }
        true
    }

    /// Block until the operation finalizes and return the result.
    ///
    /// This is a wait on the same completion state the listener path sets;
    /// there is no separate synchronous code path.
    pub fn wait(&self) -> FindResult {
        let mut state = self.state.lock();
        while state.outcome.is_none() {
            self.done.wait(&mut state);
        }
        FindResult {
            records: state.collected.clone(),
            // Loop above guarantees presence.
            outcome: state.outcome.clone().unwrap_or(Outcome::Cancelled),
        }
    }

    /// Like [`wait`](Self::wait) but bounded; `None` on timeout.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<FindResult> {
        let mut state = self.state.lock();
        if state.outcome.is_none() {
            self.done.wait_for(&mut state, timeout);
        }
        state.outcome.clone().map(|outcome| FindResult {
            records: state.collected.clone(),
            outcome,
        })
    }

    /// True once the operation has finalized.
    pub fn is_finalized(&self) -> bool {
        self.state.lock().outcome.is_some()
    }
}

struct SlotState {
    record: Option<EndpointRecord>,
    outcome: Option<Outcome>,
}

/// Single-record slot for a pending Resolve: the first write wins.
pub struct ResolveSlot {
    state: Mutex<SlotState>,
    done: Condvar,
}

impl ResolveSlot {
    /// Empty slot.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SlotState {
                record: None,
                outcome: None,
            }),
            done: Condvar::new(),
        }
    }

    /// Write the record if the slot is empty and the operation is still
    /// pending. Returns `true` only for the winning write.
    pub fn offer(&self, record: EndpointRecord) -> bool {
        let mut state = self.state.lock();
        if state.outcome.is_some() || state.record.is_some() {
            return false;
        }
        state.record = Some(record);
        true
    }

    /// Finalize with the given outcome. Idempotent; `true` only for the
    /// first call. A cancelled Resolve discards any record already written.
    pub fn finalize(&self, outcome: Outcome) -> bool {
        {
            let mut state = self.state.lock();
            if state.outcome.is_some() {
                return false;
            }
            if outcome == Outcome::Cancelled {
                state.record = None;
            }
            state.outcome = Some(outcome);
        }
        self.done.notify_all();
        true
    }

    /// Block until the operation finalizes and return the result.
    pub fn wait(&self) -> ResolveResult {
        let mut state = self.state.lock();
        while state.outcome.is_none() {
            self.done.wait(&mut state);
        }
        ResolveResult {
            record: state.record.clone(),
            outcome: state.outcome.clone().unwrap_or(Outcome::Cancelled),
        }
    }

    /// True once the operation has finalized.
    pub fn is_finalized(&self) -> bool {
        self.state.lock().outcome.is_some()
    }
}

impl Default for ResolveSlot {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex as PlMutex;
    use std::thread;

    fn record(address: &str) -> EndpointRecord {
        EndpointRecord::builder(address).build().expect("valid record")
    }

    #[derive(Default)]
    struct RecordingListener {
        events: PlMutex<Vec<(String, usize)>>,
        completions: PlMutex<Vec<FindResult>>,
    }

    impl FindListener for RecordingListener {
        fn on_endpoint_found(&self, record: &EndpointRecord, total: usize) {
            self.events.lock().push((record.address().to_owned(), total));
        }
        fn on_completed(&self, result: &FindResult) {
            self.completions.lock().push(result.clone());
        }
    }

    #[test]
    fn test_batch_mode_collects_silently() {
        let listener = Arc::new(RecordingListener::default());
        let aggregator = FindAggregator::new(CollectionMode::Batch, Some(listener.clone()));

        assert_eq!(aggregator.offer(record("urn:uuid:a")), Some(1));
        assert_eq!(aggregator.offer(record("urn:uuid:b")), Some(2));
        assert!(listener.events.lock().is_empty(), "batch mode stays silent");

        aggregator.finalize(Outcome::DeadlineElapsed);
        let completions = listener.completions.lock();
        assert_eq!(completions.len(), 1);
        assert_eq!(completions[0].records.len(), 2);
        assert_eq!(completions[0].outcome, Outcome::DeadlineElapsed);
    }

    #[test]
    fn test_progressive_mode_notifies_in_arrival_order() {
        let listener = Arc::new(RecordingListener::default());
        let aggregator = FindAggregator::new(CollectionMode::Progressive, Some(listener.clone()));

        aggregator.offer(record("urn:uuid:a"));
        aggregator.offer(record("urn:uuid:b"));
        aggregator.offer(record("urn:uuid:c"));
        aggregator.finalize(Outcome::Completed);

        let events = listener.events.lock();
        assert_eq!(
            *events,
            vec![
                ("urn:uuid:a".to_owned(), 1),
                ("urn:uuid:b".to_owned(), 2),
                ("urn:uuid:c".to_owned(), 3),
            ]
        );
        let completions = listener.completions.lock();
        assert_eq!(completions.len(), 1);
        assert_eq!(completions[0].records.len(), 3);
    }

    #[test]
    fn test_finalize_is_idempotent() {
        let aggregator = FindAggregator::new(CollectionMode::Batch, None);
        assert!(aggregator.finalize(Outcome::Completed));
        assert!(!aggregator.finalize(Outcome::Cancelled));
        assert_eq!(aggregator.wait().outcome, Outcome::Completed);
    }

    #[test]
    fn test_offer_after_finalize_is_dropped() {
        let aggregator = FindAggregator::new(CollectionMode::Batch, None);
        aggregator.offer(record("urn:uuid:a"));
        aggregator.finalize(Outcome::DeadlineElapsed);
        assert_eq!(aggregator.offer(record("urn:uuid:late")), None);
        assert_eq!(aggregator.wait().records.len(), 1);
    }

    #[test]
    fn test_cancelled_find_retains_partial_records() {
        let aggregator = FindAggregator::new(CollectionMode::Batch, None);
        aggregator.offer(record("urn:uuid:a"));
        aggregator.finalize(Outcome::Cancelled);
        let result = aggregator.wait();
        assert_eq!(result.outcome, Outcome::Cancelled);
        assert_eq!(result.records.len(), 1, "partial set stays visible");
    }

    #[test]
    fn test_wait_blocks_until_finalize() {
        let aggregator = Arc::new(FindAggregator::new(CollectionMode::Batch, None));
        let a = Arc::clone(&aggregator);
        let waiter = thread::spawn(move || a.wait());

        thread::sleep(Duration::from_millis(20));
        aggregator.offer(record("urn:uuid:a"));
        aggregator.finalize(Outcome::Completed);

        let result = waiter.join().expect("waiter panicked");
        assert_eq!(result.outcome, Outcome::Completed);
        assert_eq!(result.records.len(), 1);
    }

    #[test]
    fn test_wait_timeout_on_pending_operation() {
        let aggregator = FindAggregator::new(CollectionMode::Batch, None);
        assert!(aggregator.wait_timeout(Duration::from_millis(10)).is_none());
        aggregator.finalize(Outcome::Completed);
        assert!(aggregator.wait_timeout(Duration::from_millis(10)).is_some());
    }

    #[test]
    fn test_resolve_slot_first_write_wins() {
        let slot = ResolveSlot::new();
        assert!(slot.offer(record("urn:uuid:first")));
        assert!(!slot.offer(record("urn:uuid:second")));
        slot.finalize(Outcome::Completed);
        let result = slot.wait();
        assert_eq!(result.outcome, Outcome::Completed);
        assert_eq!(
            result.record.expect("winning record").address(),
            "urn:uuid:first"
        );
    }

    #[test]
    fn test_resolve_slot_cancel_discards_record() {
        let slot = ResolveSlot::new();
        assert!(slot.offer(record("urn:uuid:first")));
        slot.finalize(Outcome::Cancelled);
        let result = slot.wait();
        assert_eq!(result.outcome, Outcome::Cancelled);
        assert!(result.record.is_none(), "cancelled resolve discards the record");
    }

    #[test]
    fn test_resolve_slot_deadline_without_answer() {
        let slot = ResolveSlot::new();
        slot.finalize(Outcome::DeadlineElapsed);
        let result = slot.wait();
        assert_eq!(result.outcome, Outcome::DeadlineElapsed);
        assert!(result.record.is_none());
    }
}
