// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for the discovery core.
//!
//! Argument errors (bad scope, bad instance id, unknown match rule) surface
//! synchronously to the caller that supplied the input. Transport failures
//! surface as `SendFailed`; retry policy belongs to the transport, not here.
//! Duplicate suppression and deadline expiry are not errors at all: they are
//! silent drops and normal completions respectively.

use std::fmt;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by discovery operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Scope URI is relative, empty, or otherwise not an absolute URI.
    InvalidScope(String),
    /// Endpoint record failed construction-time validation.
    InvalidRecord(String),
    /// Instance id does not fit the unsigned 32-bit wire field.
    InstanceIdOutOfRange(u64),
    /// Match-by URI or custom rule token names no known algorithm.
    UnknownMatchRule(String),
    /// `duplicate_message_history_length` must be positive.
    InvalidHistoryLength,
    /// The injected transport failed to send an outbound message.
    SendFailed(String),
    /// The client has been shut down; no new operations are accepted.
    Shutdown,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidScope(uri) => write!(f, "Invalid scope URI (must be absolute): {}", uri),
            Error::InvalidRecord(reason) => write!(f, "Invalid endpoint record: {}", reason),
            Error::InstanceIdOutOfRange(id) => {
                write!(f, "Instance id {} out of range (must fit in 32 bits)", id)
            }
            Error::UnknownMatchRule(rule) => write!(f, "Unknown scope match rule: {}", rule),
            Error::InvalidHistoryLength => {
                write!(f, "duplicate_message_history_length must be positive")
            }
            Error::SendFailed(reason) => write!(f, "Send failed: {}", reason),
            Error::Shutdown => write!(f, "Discovery client is shut down"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_variants() {
        assert_eq!(
            format!("{}", Error::InvalidScope("foo/bar".into())),
            "Invalid scope URI (must be absolute): foo/bar"
        );
        assert_eq!(
            format!("{}", Error::InstanceIdOutOfRange(1 << 32)),
            "Instance id 4294967296 out of range (must fit in 32 bits)"
        );
        assert_eq!(
            format!("{}", Error::UnknownMatchRule("x-custom".into())),
            "Unknown scope match rule: x-custom"
        );
        assert_eq!(format!("{}", Error::Shutdown), "Discovery client is shut down");
    }

    #[test]
    fn test_error_is_std_error() {
        fn takes_std_error(_e: &dyn std::error::Error) {}
        takes_std_error(&Error::InvalidHistoryLength);
    }
}
