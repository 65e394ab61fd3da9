// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Advertised/discovered endpoint records.
//!
//! A record is validated once at construction and immutable afterwards.
//! Ownership transfers to whichever collection holds it (a responder's
//! published set, a Find result, a Hello announcement).

use crate::error::{Error, Result};
use crate::scope::uri;

/// One advertised endpoint: stable identity address, implemented contract
/// types, scope tags, transport addresses, and a metadata version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointRecord {
    address: String,
    types: Vec<String>,
    scopes: Vec<String>,
    xaddrs: Vec<String>,
    metadata_version: u64,
}

impl EndpointRecord {
    /// Start building a record for the given endpoint identity address.
    pub fn builder(address: impl Into<String>) -> RecordBuilder {
        RecordBuilder {
            address: address.into(),
            types: Vec::new(),
            scopes: Vec::new(),
            xaddrs: Vec::new(),
            metadata_version: 1,
        }
    }

    /// Stable endpoint identity (usually a `urn:uuid:` address).
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Contract-type identifiers implemented by the endpoint.
    pub fn types(&self) -> &[String] {
        &self.types
    }

    /// Scope URIs the endpoint is tagged with. All absolute.
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// Transport addresses the endpoint is reachable at.
    pub fn xaddrs(&self) -> &[String] {
        &self.xaddrs
    }

    /// Version of the endpoint's metadata; bumped when metadata changes.
    pub fn metadata_version(&self) -> u64 {
        self.metadata_version
    }
}

/// Builder for [`EndpointRecord`]. Validation happens once in [`build`],
/// not on every mutation.
///
/// [`build`]: RecordBuilder::build
///
/// # Example
///
/// ```
/// use wsd::EndpointRecord;
///
/// let record = EndpointRecord::builder("urn:uuid:9b0e4f3a-0000-4000-8000-000000000001")
///     .types(["tns:PrinterService"])
///     .scopes(["ldap:///ou=engineering,o=example"])
///     .xaddrs(["http://192.168.1.20:5357/print"])
///     .build()
///     .expect("valid record");
/// assert_eq!(record.metadata_version(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    address: String,
    types: Vec<String>,
    scopes: Vec<String>,
    xaddrs: Vec<String>,
    metadata_version: u64,
}

impl RecordBuilder {
    /// Add contract-type identifiers.
    #[must_use]
    pub fn types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types.extend(types.into_iter().map(Into::into));
        self
    }

    /// Add scope URIs. Checked for absoluteness at [`build`](Self::build).
    #[must_use]
    pub fn scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes.extend(scopes.into_iter().map(Into::into));
        self
    }

    /// Add transport addresses.
    #[must_use]
    pub fn xaddrs<I, S>(mut self, xaddrs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.xaddrs.extend(xaddrs.into_iter().map(Into::into));
        self
    }

    /// Set the metadata version (defaults to 1).
    #[must_use]
    pub fn metadata_version(mut self, version: u64) -> Self {
        self.metadata_version = version;
        self
    }

    /// Validate and construct the immutable record.
    ///
    /// # Errors
    /// - `Error::InvalidRecord` if the address is empty.
    /// - `Error::InvalidScope` if any scope is not an absolute URI.
    pub fn build(self) -> Result<EndpointRecord> {
        if self.address.trim().is_empty() {
            return Err(Error::InvalidRecord("address must not be empty".into()));
        }
        for scope in &self.scopes {
            if !uri::is_absolute_uri(scope) {
                return Err(Error::InvalidScope(scope.clone()));
            }
        }
        Ok(EndpointRecord {
            address: self.address,
            types: self.types,
            scopes: self.scopes,
            xaddrs: self.xaddrs,
            metadata_version: self.metadata_version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_record() {
        let record = EndpointRecord::builder("urn:uuid:abc").build().expect("valid record");
        assert_eq!(record.address(), "urn:uuid:abc");
        assert!(record.types().is_empty());
        assert!(record.scopes().is_empty());
        assert_eq!(record.metadata_version(), 1);
    }

    #[test]
    fn test_empty_address_rejected() {
        let err = EndpointRecord::builder("  ").build().unwrap_err();
        assert!(matches!(err, Error::InvalidRecord(_)));
    }

    #[test]
    fn test_relative_scope_rejected() {
        let err = EndpointRecord::builder("urn:uuid:abc")
            .scopes(["relative/scope"])
            .build()
            .unwrap_err();
        assert_eq!(err, Error::InvalidScope("relative/scope".into()));
    }

    #[test]
    fn test_absolute_scopes_accepted() {
        let record = EndpointRecord::builder("urn:uuid:abc")
            .scopes(["http://example.org/a", "ldap:///ou=x,o=y"])
            .build()
            .expect("valid record");
        assert_eq!(record.scopes().len(), 2);
    }

    #[test]
    fn test_builder_accumulates() {
        let record = EndpointRecord::builder("urn:uuid:abc")
            .types(["a:One"])
            .types(["b:Two"])
            .xaddrs(["http://10.0.0.1:5357/x"])
            .metadata_version(9)
            .build()
            .expect("valid record");
        assert_eq!(record.types(), ["a:One", "b:Two"]);
        assert_eq!(record.xaddrs().len(), 1);
        assert_eq!(record.metadata_version(), 9);
    }
}
