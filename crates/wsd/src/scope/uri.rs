// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! URI splitting and comparison helpers for scope matching.
//!
//! Scope matching needs scheme/authority/path decomposition and segment-wise
//! prefix comparison only; query and fragment never participate.

/// Check that a string is an absolute URI: `scheme ":" ...` with a scheme of
/// `ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )`.
pub(crate) fn is_absolute_uri(s: &str) -> bool {
    let Some(colon) = s.find(':') else {
        return false;
    };
    let scheme = &s[..colon];
    let mut chars = scheme.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.')
}

/// Decomposed URI: scheme, optional authority, path (query/fragment dropped).
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct UriParts<'a> {
    pub scheme: &'a str,
    pub authority: &'a str,
    pub path: &'a str,
}

/// Split an absolute URI into scheme / authority / path.
///
/// Returns `None` for strings that are not absolute URIs. Query (`?...`) and
/// fragment (`#...`) are stripped from the path.
pub(crate) fn split_uri(s: &str) -> Option<UriParts<'_>> {
    if !is_absolute_uri(s) {
        return None;
    }
    let colon = s.find(':')?;
    let scheme = &s[..colon];
    let rest = &s[colon + 1..];

    let (authority, path_and_more) = if let Some(after) = rest.strip_prefix("//") {
        match after.find('/') {
            Some(slash) => (&after[..slash], &after[slash..]),
            None => (after, ""),
        }
    } else {
        ("", rest)
    };

    let path = path_and_more
        .split(['?', '#'])
        .next()
        .unwrap_or(path_and_more);

    Some(UriParts {
        scheme,
        authority,
        path,
    })
}

/// Non-empty path segments of a URI path.
fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// RFC 3986 prefix match between a criteria scope and a candidate scope.
///
/// Scheme and authority compare case-insensitively; the criteria path
/// segments must be a segment-wise prefix of the candidate path segments
/// (case-sensitive). Query and fragment are ignored on both sides.
///
/// `http://example.org/a` matches candidate `http://example.org/a/b` but not
/// `http://example.org/ab`.
pub(crate) fn prefix_match(criteria: &str, candidate: &str) -> bool {
    let (Some(crit), Some(cand)) = (split_uri(criteria), split_uri(candidate)) else {
        return false;
    };
    if !crit.scheme.eq_ignore_ascii_case(cand.scheme)
        || !crit.authority.eq_ignore_ascii_case(cand.authority)
    {
        return false;
    }

    let mut cand_segments = segments(cand.path);
    for crit_segment in segments(crit.path) {
        match cand_segments.next() {
            Some(cand_segment) if cand_segment == crit_segment => {}
            _ => return false,
        }
    }
    true
}

/// Exact UUID comparison after canonicalization.
///
/// Both sides are reduced to canonical UUID form (`urn:uuid:` / `uuid:`
/// prefixes stripped, case folded); strings that do not parse as UUIDs never
/// match.
pub(crate) fn uuid_match(criteria: &str, candidate: &str) -> bool {
    match (parse_uuid(criteria), parse_uuid(candidate)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn parse_uuid(s: &str) -> Option<uuid::Uuid> {
    let trimmed = s.trim();
    let bare = strip_prefix_ignore_case(trimmed, "urn:uuid:")
        .or_else(|| strip_prefix_ignore_case(trimmed, "uuid:"))
        .unwrap_or(trimmed);
    uuid::Uuid::parse_str(bare).ok()
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}
