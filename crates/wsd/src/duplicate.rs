// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Duplicate-message suppression over an unreliable transport.
//!
//! Multicast discovery traffic is retransmitted and re-delivered as a matter
//! of course; receivers must be able to ignore a message they have already
//! processed. The filter keeps a capacity-bounded window of recently seen
//! message identifiers with insertion-ordered eviction: membership is exact
//! for the last `capacity` insertions, older identifiers may read as fresh
//! again. That false-negative is the accepted bounded-memory tradeoff, not a
//! correctness bug.
//!
//! One filter instance is shared (`Arc`) across all concurrent receive paths
//! of a service instance.

use crate::error::{Error, Result};
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;

/// Bounded window of recently seen message identifiers.
///
/// `is_duplicate` is a single atomic check-and-insert: concurrent callers
/// never lose or double-count an insertion. Membership probes never promote
/// an entry, so the eviction order is the insertion order.
pub struct DuplicateFilter {
    window: Mutex<LruCache<String, ()>>,
}

impl DuplicateFilter {
    /// Create a filter holding at most `capacity` identifiers.
    ///
    /// # Errors
    /// `Error::InvalidHistoryLength` if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        let capacity = NonZeroUsize::new(capacity).ok_or(Error::InvalidHistoryLength)?;
        Ok(Self {
            window: Mutex::new(LruCache::new(capacity)),
        })
    }

    /// Check-and-insert in one critical section.
    ///
    /// Returns `false` and records the identifier on first sighting; returns
    /// `true` without side effect if the identifier is already in the window.
    pub fn is_duplicate(&self, id: &str) -> bool {
        let mut window = self.window.lock();
        if window.contains(id) {
            return true;
        }
        // Inserting beyond capacity evicts the oldest insertion.
        window.put(id.to_owned(), ());
        false
    }

    /// Number of identifiers currently held.
    pub fn len(&self) -> usize {
        self.window.lock().len()
    }

    /// True if no identifier has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.window.lock().is_empty()
    }
}
