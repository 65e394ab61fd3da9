// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Runtime configuration for discovery clients and responders.
//!
//! Configuration is an explicitly constructed, explicitly owned object passed
//! to whoever needs it. There are no ambient globals.

use crate::error::{Error, Result};
use std::time::Duration;

/// Default capacity of the duplicate-message window.
pub const DEFAULT_DUPLICATE_HISTORY_LENGTH: usize = 4096;

/// Default collection window for a Find operation (WS-Discovery client default).
pub const DEFAULT_FIND_DURATION: Duration = Duration::from_secs(20);

/// Default collection window for a Resolve operation.
pub const DEFAULT_RESOLVE_DURATION: Duration = Duration::from_secs(4);

/// Discovery runtime knobs.
///
/// # Example
///
/// ```
/// use wsd::DiscoveryConfig;
///
/// let config = DiscoveryConfig::default().with_history_length(1024);
/// config.validate().expect("valid config");
/// ```
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Capacity of the duplicate-message window. Identifiers older than the
    /// last `duplicate_message_history_length` insertions may be treated as
    /// fresh again; bounded memory is the accepted tradeoff.
    pub duplicate_message_history_length: usize,
    /// Collection window applied to Find operations that do not carry an
    /// explicit duration.
    pub default_find_duration: Duration,
    /// Collection window applied to Resolve operations that do not carry an
    /// explicit duration.
    pub default_resolve_duration: Duration,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            duplicate_message_history_length: DEFAULT_DUPLICATE_HISTORY_LENGTH,
            default_find_duration: DEFAULT_FIND_DURATION,
            default_resolve_duration: DEFAULT_RESOLVE_DURATION,
        }
    }
}

impl DiscoveryConfig {
    /// Set the duplicate-message window capacity.
    #[must_use]
    pub fn with_history_length(mut self, length: usize) -> Self {
        self.duplicate_message_history_length = length;
        self
    }

    /// Set the default Find collection window.
    #[must_use]
    pub fn with_find_duration(mut self, duration: Duration) -> Self {
        self.default_find_duration = duration;
        self
    }

    /// Set the default Resolve collection window.
    #[must_use]
    pub fn with_resolve_duration(mut self, duration: Duration) -> Self {
        self.default_resolve_duration = duration;
        self
    }

    /// Check invariants.
    ///
    /// # Errors
    /// `Error::InvalidHistoryLength` if the duplicate window capacity is zero.
    pub fn validate(&self) -> Result<()> {
        if self.duplicate_message_history_length == 0 {
            return Err(Error::InvalidHistoryLength);
        }
        Ok(())
    }
}
