// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Find and Resolve request criteria.

use crate::scope::MatchRule;
use std::time::Duration;

/// Criteria for a Find (Probe) operation: which endpoints to look for and
/// how long to collect answers.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use wsd::FindCriteria;
///
/// let criteria = FindCriteria::new()
///     .with_type("tns:PrinterService")
///     .with_scope("http://example.org/floor1")
///     .with_duration(Duration::from_secs(5))
///     .with_max_results(3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FindCriteria {
    /// Contract types the endpoint must implement; empty matches all.
    pub types: Vec<String>,
    /// Scope URIs to match under `match_rule`; empty matches all.
    pub scopes: Vec<String>,
    /// Scope comparison algorithm.
    pub match_rule: MatchRule,
    /// Collection window; `None` falls back to the configured default.
    pub duration: Option<Duration>,
    /// Stop collecting once this many records arrived; `None` is unbounded.
    pub max_results: Option<usize>,
}

impl FindCriteria {
    /// Criteria matching every endpoint, with configured defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require a contract type.
    #[must_use]
    pub fn with_type(mut self, contract_type: impl Into<String>) -> Self {
        self.types.push(contract_type.into());
        self
    }

    /// Add a scope to match.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scopes.push(scope.into());
        self
    }

    /// Select the scope comparison algorithm.
    #[must_use]
    pub fn with_match_rule(mut self, rule: MatchRule) -> Self {
        self.match_rule = rule;
        self
    }

    /// Override the collection window.
    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Complete early once `max` records arrived.
    #[must_use]
    pub fn with_max_results(mut self, max: usize) -> Self {
        self.max_results = Some(max);
        self
    }
}

/// Criteria for a Resolve operation: one specific endpoint identity.
#[derive(Debug, Clone)]
pub struct ResolveCriteria {
    /// Endpoint identity address to resolve.
    pub address: String,
    /// Collection window; `None` falls back to the configured default.
    pub duration: Option<Duration>,
}

impl ResolveCriteria {
    /// Resolve the endpoint with the given identity address.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            duration: None,
        }
    }

    /// Override the collection window.
    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_criteria_defaults() {
        let criteria = FindCriteria::new();
        assert!(criteria.types.is_empty());
        assert!(criteria.scopes.is_empty());
        assert_eq!(criteria.match_rule, MatchRule::Rfc3986);
        assert!(criteria.duration.is_none());
        assert!(criteria.max_results.is_none());
    }

    #[test]
    fn test_find_criteria_builders() {
        let criteria = FindCriteria::new()
            .with_type("tns:A")
            .with_scope("http://example.org/a")
            .with_match_rule(MatchRule::Exact)
            .with_duration(Duration::from_secs(2))
            .with_max_results(5);
        assert_eq!(criteria.types, ["tns:A"]);
        assert_eq!(criteria.scopes, ["http://example.org/a"]);
        assert_eq!(criteria.match_rule, MatchRule::Exact);
        assert_eq!(criteria.duration, Some(Duration::from_secs(2)));
        assert_eq!(criteria.max_results, Some(5));
    }

    #[test]
    fn test_resolve_criteria() {
        let criteria = ResolveCriteria::new("urn:uuid:abc").with_duration(Duration::from_secs(1));
        assert_eq!(criteria.address, "urn:uuid:abc");
        assert_eq!(criteria.duration, Some(Duration::from_secs(1)));
    }
}
