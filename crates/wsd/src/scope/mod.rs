// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Compiled scope matching.
//!
//! A Find/Resolve request names a matching rule and a list of scope URIs.
//! The rule and scopes compile once into a [`ScopeMatcher`], which is then
//! evaluated against every candidate endpoint's scope set. Compilation fails
//! fast on relative scopes and unknown rules; evaluation is infallible.
//!
//! A request with an empty scope list matches every endpoint.

pub(crate) mod ldap;
pub(crate) mod uri;

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Match-by URI selecting RFC 3986 prefix comparison (the protocol default).
pub const MATCH_BY_PREFIX: &str = "http://docs.oasis-open.org/ws-dd/ns/discovery/2009/01/rfc3986";
/// Match-by URI selecting character-for-character comparison.
pub const MATCH_BY_EXACT: &str = "http://docs.oasis-open.org/ws-dd/ns/discovery/2009/01/strcmp0";
/// Match-by URI selecting LDAP DN comparison.
pub const MATCH_BY_LDAP: &str = "http://docs.oasis-open.org/ws-dd/ns/discovery/2009/01/ldap";
/// Match-by URI selecting canonical UUID comparison.
pub const MATCH_BY_UUID: &str = "http://docs.oasis-open.org/ws-dd/ns/discovery/2009/01/uuid";

/// Scope comparison algorithm for a Find/Resolve request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchRule {
    /// Character-for-character equality.
    Exact,
    /// Normalized URI prefix comparison (scheme, authority, path segments).
    Rfc3986,
    /// LDAP DN equal-or-descendant comparison.
    Ldap,
    /// Canonical UUID equality.
    Uuid,
    /// Externally supplied comparison identified by an opaque token.
    Custom(String),
}

impl MatchRule {
    /// Map a declared match-by URI to a rule.
    ///
    /// URIs outside the four standard ones are treated as custom-rule tokens;
    /// they resolve (or fail) at compile time against the registry.
    pub fn from_match_by(uri: &str) -> Self {
        match uri {
            MATCH_BY_PREFIX => MatchRule::Rfc3986,
            MATCH_BY_EXACT => MatchRule::Exact,
            MATCH_BY_LDAP => MatchRule::Ldap,
            MATCH_BY_UUID => MatchRule::Uuid,
            other => MatchRule::Custom(other.to_owned()),
        }
    }
}

impl Default for MatchRule {
    fn default() -> Self {
        MatchRule::Rfc3986
    }
}

impl fmt::Display for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchRule::Exact => f.write_str("strcmp0"),
            MatchRule::Rfc3986 => f.write_str("rfc3986"),
            MatchRule::Ldap => f.write_str("ldap"),
            MatchRule::Uuid => f.write_str("uuid"),
            MatchRule::Custom(token) => write!(f, "custom({})", token),
        }
    }
}

/// Comparison function for a custom match rule: `(criteria_scope,
/// candidate_scope) -> matches`.
pub type CustomScopeMatcher = Arc<dyn Fn(&str, &str) -> bool + Send + Sync>;

/// Registry of custom scope comparison functions keyed by opaque token.
#[derive(Clone, Default)]
pub struct CustomRuleRegistry {
    rules: HashMap<String, CustomScopeMatcher>,
}

impl CustomRuleRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a comparator under `token`, replacing any previous one.
    pub fn register<F>(&mut self, token: impl Into<String>, matcher: F)
    where
        F: Fn(&str, &str) -> bool + Send + Sync + 'static,
    {
        self.rules.insert(token.into(), Arc::new(matcher));
    }

    fn resolve(&self, token: &str) -> Option<CustomScopeMatcher> {
        self.rules.get(token).cloned()
    }
}

impl fmt::Debug for CustomRuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomRuleRegistry")
            .field("tokens", &self.rules.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Compiled scope criteria: rule plus validated scope list.
///
/// Compile once per request, evaluate against every candidate.
///
/// # Example
///
/// ```
/// use wsd::{CustomRuleRegistry, MatchRule, ScopeMatcher};
///
/// let matcher = ScopeMatcher::compile(
///     &["http://example.org/a".to_owned()],
///     MatchRule::Rfc3986,
///     &CustomRuleRegistry::new(),
/// )
/// .expect("valid criteria");
///
/// assert!(matcher.matches(&["http://example.org/a/b".to_owned()]));
/// assert!(!matcher.matches(&["http://example.org/ab".to_owned()]));
/// ```
#[derive(Clone)]
pub struct ScopeMatcher {
    rule: MatchRule,
    scopes: Vec<String>,
    custom: Option<CustomScopeMatcher>,
}

impl ScopeMatcher {
    /// Compile criteria scopes under a rule.
    ///
    /// # Errors
    /// - `Error::InvalidScope` if any scope is not an absolute URI.
    /// - `Error::UnknownMatchRule` if a custom token is not registered.
    pub fn compile(
        scopes: &[String],
        rule: MatchRule,
        registry: &CustomRuleRegistry,
    ) -> Result<Self> {
        for scope in scopes {
            if !uri::is_absolute_uri(scope) {
                return Err(Error::InvalidScope(scope.clone()));
            }
        }
        let custom = match &rule {
            MatchRule::Custom(token) => Some(
                registry
                    .resolve(token)
                    .ok_or_else(|| Error::UnknownMatchRule(token.clone()))?,
            ),
            _ => None,
        };
        Ok(Self {
            rule,
            scopes: scopes.to_vec(),
            custom,
        })
    }

    /// The rule this matcher was compiled with.
    pub fn rule(&self) -> &MatchRule {
        &self.rule
    }

    /// Evaluate the compiled criteria against a candidate scope set.
    ///
    /// Empty criteria match everything; otherwise the candidate matches when
    /// any criteria scope is satisfied by any candidate scope under the rule.
    pub fn matches(&self, candidate_scopes: &[String]) -> bool {
        if self.scopes.is_empty() {
            return true;
        }
        self.scopes.iter().any(|criteria| {
            candidate_scopes
                .iter()
                .any(|candidate| self.compare(criteria, candidate))
        })
    }

    fn compare(&self, criteria: &str, candidate: &str) -> bool {
        match &self.rule {
            MatchRule::Exact => criteria == candidate,
            MatchRule::Rfc3986 => uri::prefix_match(criteria, candidate),
            MatchRule::Ldap => ldap::dn_match(criteria, candidate),
            MatchRule::Uuid => uri::uuid_match(criteria, candidate),
            // Resolved at compile time; absent only for non-custom rules.
            MatchRule::Custom(_) => self
                .custom
                .as_ref()
                .is_some_and(|matcher| matcher(criteria, candidate)),
        }
    }
}

impl fmt::Debug for ScopeMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeMatcher")
            .field("rule", &self.rule)
            .field("scopes", &self.scopes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(scopes: &[&str]) -> Vec<String> {
        scopes.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn test_match_by_uri_mapping() {
        assert_eq!(MatchRule::from_match_by(MATCH_BY_PREFIX), MatchRule::Rfc3986);
        assert_eq!(MatchRule::from_match_by(MATCH_BY_EXACT), MatchRule::Exact);
        assert_eq!(MatchRule::from_match_by(MATCH_BY_LDAP), MatchRule::Ldap);
        assert_eq!(MatchRule::from_match_by(MATCH_BY_UUID), MatchRule::Uuid);
        assert_eq!(
            MatchRule::from_match_by("urn:example:custom-rule"),
            MatchRule::Custom("urn:example:custom-rule".into())
        );
    }

    #[test]
    fn test_relative_scope_fails_compilation() {
        let err = ScopeMatcher::compile(
            &owned(&["not-absolute/scope"]),
            MatchRule::Exact,
            &CustomRuleRegistry::new(),
        )
        .unwrap_err();
        assert_eq!(err, Error::InvalidScope("not-absolute/scope".into()));
    }

    #[test]
    fn test_unknown_custom_token_fails_compilation() {
        let err = ScopeMatcher::compile(
            &owned(&["http://example.org/a"]),
            MatchRule::Custom("urn:example:nobody-registered-this".into()),
            &CustomRuleRegistry::new(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnknownMatchRule(_)));
    }

    #[test]
    fn test_empty_criteria_match_everything() {
        let matcher = ScopeMatcher::compile(&[], MatchRule::Rfc3986, &CustomRuleRegistry::new())
            .expect("empty criteria are valid");
        assert!(matcher.matches(&owned(&["http://example.org/whatever"])));
        assert!(matcher.matches(&[]));
    }

    #[test]
    fn test_exact_rule() {
        let matcher = ScopeMatcher::compile(
            &owned(&["http://example.org/a"]),
            MatchRule::Exact,
            &CustomRuleRegistry::new(),
        )
        .expect("valid criteria");
        assert!(matcher.matches(&owned(&["http://example.org/a"])));
        assert!(!matcher.matches(&owned(&["http://example.org/a/b"])));
        assert!(!matcher.matches(&owned(&["HTTP://example.org/a"])));
    }

    #[test]
    fn test_prefix_rule() {
        let matcher = ScopeMatcher::compile(
            &owned(&["http://example.org/a"]),
            MatchRule::Rfc3986,
            &CustomRuleRegistry::new(),
        )
        .expect("valid criteria");
        assert!(matcher.matches(&owned(&["http://example.org/a/b"])));
        assert!(!matcher.matches(&owned(&["http://example.org/ab"])));
    }

    #[test]
    fn test_ldap_rule() {
        let matcher = ScopeMatcher::compile(
            &owned(&["ldap:///ou=eng,o=example"]),
            MatchRule::Ldap,
            &CustomRuleRegistry::new(),
        )
        .expect("valid criteria");
        assert!(matcher.matches(&owned(&["ldap:///cn=p1,ou=eng,o=example"])));
        assert!(!matcher.matches(&owned(&["ldap:///cn=p1,ou=sales,o=example"])));
    }

    #[test]
    fn test_uuid_rule() {
        let matcher = ScopeMatcher::compile(
            &owned(&["urn:uuid:550e8400-e29b-41d4-a716-446655440000"]),
            MatchRule::Uuid,
            &CustomRuleRegistry::new(),
        )
        .expect("valid criteria");
        assert!(matcher.matches(&owned(&["urn:uuid:550E8400-E29B-41D4-A716-446655440000"])));
        assert!(!matcher.matches(&owned(&["urn:uuid:550e8400-e29b-41d4-a716-446655440001"])));
    }

    #[test]
    fn test_custom_rule_delegates() {
        let mut registry = CustomRuleRegistry::new();
        registry.register("urn:example:suffix", |criteria: &str, candidate: &str| {
            candidate.ends_with(criteria.rsplit('/').next().unwrap_or(criteria))
        });
        let matcher = ScopeMatcher::compile(
            &owned(&["http://example.org/tail"]),
            MatchRule::Custom("urn:example:suffix".into()),
            &registry,
        )
        .expect("registered token compiles");
        assert!(matcher.matches(&owned(&["http://other.org/some/tail"])));
        assert!(!matcher.matches(&owned(&["http://other.org/some/head"])));
    }

    #[test]
    fn test_any_criteria_scope_suffices() {
        let matcher = ScopeMatcher::compile(
            &owned(&["http://example.org/a", "http://example.org/b"]),
            MatchRule::Exact,
            &CustomRuleRegistry::new(),
        )
        .expect("valid criteria");
        assert!(matcher.matches(&owned(&["http://example.org/b"])));
        assert!(!matcher.matches(&owned(&["http://example.org/c"])));
    }
}
