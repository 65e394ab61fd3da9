// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Service-side request handling.
//!
//! A [`DiscoveryResponder`] owns the set of published endpoint records for
//! one service instance. Incoming Probe requests are deduplicated, matched
//! against the published set (contract types plus compiled scope criteria)
//! and answered with the matching records; Resolve requests answer the one
//! record whose identity address matches. Per WS-Discovery custom, a request
//! that matches nothing is not answered at all.
//!
//! Replies are stamped by the responder's own sequence generator.
//! Publishing and unpublishing announce Hello/Bye through an
//! [`AnnouncementClient`].

use crate::announcement::AnnouncementClient;
use crate::config::DiscoveryConfig;
use crate::criteria::FindCriteria;
use crate::duplicate::DuplicateFilter;
use crate::error::Result;
use crate::record::EndpointRecord;
use crate::scope::{CustomRuleRegistry, ScopeMatcher};
use crate::sequence::{AppSequence, SequenceGenerator};
use crate::transport::DiscoveryTransport;
use parking_lot::RwLock;
use std::sync::Arc;

/// Service-side discovery request handler.
pub struct DiscoveryResponder {
    transport: Arc<dyn DiscoveryTransport>,
    sequencer: SequenceGenerator,
    duplicates: Arc<DuplicateFilter>,
    custom_rules: CustomRuleRegistry,
    announcer: AnnouncementClient,
    published: RwLock<Vec<EndpointRecord>>,
}

impl DiscoveryResponder {
    /// Create a responder over the given transport.
    ///
    /// # Errors
    /// `Error::InvalidHistoryLength` if the configured duplicate window
    /// capacity is zero.
    pub fn new(transport: Arc<dyn DiscoveryTransport>, config: &DiscoveryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            transport: Arc::clone(&transport),
            sequencer: SequenceGenerator::new(),
            duplicates: Arc::new(DuplicateFilter::new(
                config.duplicate_message_history_length,
            )?),
            custom_rules: CustomRuleRegistry::new(),
            announcer: AnnouncementClient::new(transport),
            published: RwLock::new(Vec::new()),
        })
    }

    /// Register a custom scope comparison rule for incoming probes.
    #[must_use]
    pub fn with_custom_rule<F>(mut self, token: impl Into<String>, matcher: F) -> Self
    where
        F: Fn(&str, &str) -> bool + Send + Sync + 'static,
    {
        self.custom_rules.register(token, matcher);
        self
    }

    /// Publish a record and announce it online.
    ///
    /// # Errors
    /// `Error::SendFailed` if the Hello announcement cannot be sent; the
    /// record stays published either way.
    pub fn publish(&self, record: EndpointRecord) -> Result<()> {
        self.published.write().push(record.clone());
        self.announcer.announce_online(&record)
    }

    /// Unpublish the record with the given identity address and announce it
    /// offline. Returns `Ok(false)` if no such record was published.
    pub fn unpublish(&self, address: &str) -> Result<bool> {
        let removed = {
            let mut published = self.published.write();
            match published.iter().position(|r| r.address() == address) {
                Some(index) => Some(published.remove(index)),
                None => None,
            }
        };
        match removed {
            Some(record) => {
                self.announcer.announce_offline(&record)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Snapshot of the currently published records.
    pub fn published(&self) -> Vec<EndpointRecord> {
        self.published.read().clone()
    }

    /// Handle a decoded Probe request.
    ///
    /// Duplicate message ids are dropped; malformed criteria (invalid scope,
    /// unknown match rule) drop the request the same way a non-match would,
    /// since the requester is remote and gets no fault channel. Matching
    /// records are answered via `send_probe_matches` with `relates_to` set
    /// to the probe's message id.
    ///
    /// # Errors
    /// `Error::SendFailed` if the reply cannot be sent.
    pub fn probe_received(
        &self,
        message_id: &str,
        _sequence: &AppSequence,
        criteria: &FindCriteria,
    ) -> Result<()> {
        if self.duplicates.is_duplicate(message_id) {
            log::debug!("[responder] duplicate probe {} dropped", message_id);
            return Ok(());
        }
        let matcher = match ScopeMatcher::compile(
            &criteria.scopes,
            criteria.match_rule.clone(),
            &self.custom_rules,
        ) {
            Ok(matcher) => matcher,
            Err(err) => {
                log::debug!("[responder] unmatchable probe {} dropped: {}", message_id, err);
                return Ok(());
            }
        };

        let matches: Vec<EndpointRecord> = self
            .published
            .read()
            .iter()
            .filter(|record| {
                types_match(&criteria.types, record.types()) && matcher.matches(record.scopes())
            })
            .cloned()
            .collect();

        if matches.is_empty() {
            return Ok(());
        }
        let sequence = self.sequencer.next();
        log::debug!(
            "[responder] answering probe {} with {} record(s)",
            message_id,
            matches.len()
        );
        self.transport
            .send_probe_matches(message_id, &sequence, &matches)
    }

    /// Handle a decoded Resolve request for one endpoint identity.
    ///
    /// # Errors
    /// `Error::SendFailed` if the reply cannot be sent.
    pub fn resolve_received(
        &self,
        message_id: &str,
        _sequence: &AppSequence,
        address: &str,
    ) -> Result<()> {
        if self.duplicates.is_duplicate(message_id) {
            log::debug!("[responder] duplicate resolve {} dropped", message_id);
            return Ok(());
        }
        let found = self
            .published
            .read()
            .iter()
            .find(|record| record.address() == address)
            .cloned();
        let Some(record) = found else {
            return Ok(());
        };
        let sequence = self.sequencer.next();
        log::debug!("[responder] answering resolve {} for {}", message_id, address);
        self.transport
            .send_resolve_match(message_id, &sequence, &record)
    }
}

/// Every requested contract type must be offered; an empty request matches
/// all endpoints.
fn types_match(requested: &[String], offered: &[String]) -> bool {
    requested.iter().all(|t| offered.contains(t))
}
