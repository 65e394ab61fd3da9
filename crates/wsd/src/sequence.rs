// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! AppSequence stamping for outbound protocol messages.
//!
//! Every multicast or unicast discovery message carries an
//! `(instance_id, sequence_id, message_number)` tuple. Receivers use the
//! tuple as a logical clock: for a fixed `(instance_id, sequence_id)` pair
//! the message numbers are strictly increasing in emission order, though an
//! unreliable transport may deliver them out of order or with gaps.
//!
//! One generator is created per service or client endpoint and lives for the
//! endpoint's lifetime. It is never reset.

use crate::error::{Error, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Upper bound (exclusive) for instance ids: the wire field is unsigned 32-bit.
const INSTANCE_ID_LIMIT: u64 = 1 << 32;

/// The ordering tuple stamped on every outbound protocol message.
///
/// Round-trips bit-exact with any compliant peer: `instance_id` fits in
/// 32 bits, `sequence_id` is a URI or absent, `message_number` is unsigned
/// and monotonically increasing per sender.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AppSequence {
    /// Identifies one process lifetime of the sender.
    pub instance_id: u64,
    /// Optionally distinguishes logical senders sharing an instance id.
    pub sequence_id: Option<String>,
    /// Increments once per message emitted by this sender.
    pub message_number: u64,
}

impl AppSequence {
    /// Key used by the duplicate-message window for messages that carry no
    /// separate message id (probe/resolve matches). The tuple uniquely
    /// identifies one emission by one sender.
    pub fn dedup_key(&self) -> String {
        format!(
            "{}:{}:{}",
            self.instance_id,
            self.sequence_id.as_deref().unwrap_or(""),
            self.message_number
        )
    }
}

/// Thread-safe per-sender message sequence generator.
///
/// `next()` is a single atomic increment: concurrent callers observe
/// pairwise distinct, increasing message numbers. No I/O, no blocking.
///
/// # Example
///
/// ```
/// use wsd::SequenceGenerator;
///
/// let generator = SequenceGenerator::new();
/// let first = generator.next();
/// let second = generator.next();
/// assert_eq!(first.message_number, 1);
/// assert_eq!(second.message_number, 2);
/// ```
#[derive(Debug)]
pub struct SequenceGenerator {
    instance_id: u64,
    sequence_id: Option<String>,
    counter: AtomicU64,
}

impl SequenceGenerator {
    /// Create a generator whose instance id is derived from coarse wall-clock
    /// seconds, so instances created in different process lifetimes almost
    /// never collide.
    pub fn new() -> Self {
        let epoch_secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        Self {
            // Seconds since 1970 stay below 2^32 until 2106.
            instance_id: epoch_secs & (INSTANCE_ID_LIMIT - 1),
            sequence_id: None,
            counter: AtomicU64::new(0),
        }
    }

    /// Create a generator with an explicit instance id and optional sequence id.
    ///
    /// # Errors
    /// `Error::InstanceIdOutOfRange` if `instance_id` does not fit the
    /// unsigned 32-bit wire field.
    pub fn with_instance_id(instance_id: u64, sequence_id: Option<String>) -> Result<Self> {
        if instance_id >= INSTANCE_ID_LIMIT {
            return Err(Error::InstanceIdOutOfRange(instance_id));
        }
        Ok(Self {
            instance_id,
            sequence_id,
            counter: AtomicU64::new(0),
        })
    }

    /// Stamp the next outbound message.
    ///
    /// Pre-increment semantics: the first call returns message number 1.
    /// Numbers are never reused for the lifetime of the generator.
    pub fn next(&self) -> AppSequence {
        let message_number = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        AppSequence {
            instance_id: self.instance_id,
            sequence_id: self.sequence_id.clone(),
            message_number,
        }
    }

    /// Instance id stamped on every message from this generator.
    pub fn instance_id(&self) -> u64 {
        self.instance_id
    }
}

impl Default for SequenceGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Mint a fresh `urn:uuid:` message id.
///
/// Used as both the message id of outbound requests and the correlation id
/// that responders echo back in `RelatesTo`.
pub fn new_message_id() -> String {
    format!("urn:uuid:{}", uuid::Uuid::new_v4())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_first_message_number_is_one() {
        let generator = SequenceGenerator::new();
        assert_eq!(generator.next().message_number, 1);
        assert_eq!(generator.next().message_number, 2);
        assert_eq!(generator.next().message_number, 3);
    }

    #[test]
    fn test_instance_id_fits_wire_field() {
        let generator = SequenceGenerator::new();
        assert!(generator.instance_id() < INSTANCE_ID_LIMIT);
    }

    #[test]
    fn test_explicit_instance_id_bounds() {
        assert!(SequenceGenerator::with_instance_id(0, None).is_ok());
        assert!(SequenceGenerator::with_instance_id(INSTANCE_ID_LIMIT - 1, None).is_ok());
        let err = SequenceGenerator::with_instance_id(INSTANCE_ID_LIMIT, None).unwrap_err();
        assert_eq!(err, Error::InstanceIdOutOfRange(INSTANCE_ID_LIMIT));
    }

    #[test]
    fn test_sequence_id_carried_on_every_stamp() {
        let generator =
            SequenceGenerator::with_instance_id(7, Some("urn:example:sender-a".into()))
                .expect("valid instance id");
        let seq = generator.next();
        assert_eq!(seq.instance_id, 7);
        assert_eq!(seq.sequence_id.as_deref(), Some("urn:example:sender-a"));
    }

    #[test]
    fn test_dedup_key_distinct_per_message() {
        let generator = SequenceGenerator::with_instance_id(42, None).expect("valid instance id");
        let a = generator.next();
        let b = generator.next();
        assert_ne!(a.dedup_key(), b.dedup_key());
        assert_eq!(a.dedup_key(), "42::1");
    }

    #[test]
    fn test_concurrent_next_no_duplicates() {
        let generator = Arc::new(SequenceGenerator::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let g = Arc::clone(&generator);
            handles.push(thread::spawn(move || {
                let mut numbers = Vec::with_capacity(1000);
                let mut last = 0u64;
                for _ in 0..1000 {
                    let n = g.next().message_number;
                    // Per-thread view must be increasing.
                    assert!(n > last);
                    last = n;
                    numbers.push(n);
                }
                numbers
            }));
        }

        let mut all: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().expect("thread panicked"))
            .collect();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), 8 * 1000, "message numbers must be pairwise distinct");
    }

    #[test]
    fn test_message_id_is_uuid_urn() {
        let id = new_message_id();
        assert!(id.starts_with("urn:uuid:"));
        assert_ne!(id, new_message_id());
    }

}
