// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! LDAP distinguished-name scope matching.
//!
//! Criteria scopes under the LDAP rule carry DNs, usually wrapped as
//! `ldap:///ou=engineering,o=example`. A candidate matches when its DN is
//! equal to, or a descendant of, a criteria DN: the criteria RDN sequence
//! must be a suffix of the candidate RDN sequence.

/// Equal-or-descendant DN comparison.
pub(crate) fn dn_match(criteria: &str, candidate: &str) -> bool {
    let (Some(crit), Some(cand)) = (parse_dn(criteria), parse_dn(candidate)) else {
        return false;
    };
    if crit.len() > cand.len() {
        return false;
    }
    // RDNs are ordered most-specific first; ancestry is a suffix relation.
    cand[cand.len() - crit.len()..] == crit[..]
}

/// Parse a DN out of a scope string into normalized RDNs.
///
/// Accepts an optional `ldap:///` (or `ldap://host/`) wrapper. RDNs are
/// split on unescaped commas, whitespace-trimmed, and case-folded; `\,`
/// escapes a literal comma inside an RDN value. Empty RDNs make the DN
/// unparseable.
fn parse_dn(scope: &str) -> Option<Vec<String>> {
    let dn = strip_ldap_wrapper(scope.trim());
    if dn.is_empty() {
        return None;
    }

    let mut rdns = Vec::new();
    let mut current = String::new();
    let mut chars = dn.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                // Keep the escaped character literally.
                current.push(chars.next()?);
            }
            ',' => {
                push_rdn(&mut rdns, &current)?;
                current.clear();
            }
            _ => current.push(c),
        }
    }
    push_rdn(&mut rdns, &current)?;
    Some(rdns)
}

fn push_rdn(rdns: &mut Vec<String>, raw: &str) -> Option<()> {
    let rdn = raw.trim();
    if rdn.is_empty() || !rdn.contains('=') {
        return None;
    }
    rdns.push(rdn.to_ascii_lowercase());
    Some(())
}

/// Strip an `ldap://.../` URI wrapper, leaving the bare DN.
fn strip_ldap_wrapper(scope: &str) -> &str {
    let Some(rest) = scope
        .strip_prefix("ldap://")
        .or_else(|| scope.strip_prefix("LDAP://"))
    else {
        return scope;
    };
    // `ldap:///dn` has an empty host; `ldap://host/dn` names one.
    match rest.find('/') {
        Some(slash) => &rest[slash + 1..],
        None => rest,
    }
}
