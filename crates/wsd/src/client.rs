// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Find/Resolve request orchestration.
//!
//! [`DiscoveryClient`] issues Probe and Resolve requests, routes incoming
//! match messages back to the pending operation by correlation id, enforces
//! per-operation deadlines, and delivers each operation's final result
//! exactly once.
//!
//! Per operation the state machine is Issued -> Collecting -> Finalizing ->
//! Done. Independent operations never contend: routing goes through a
//! sharded concurrent map and each operation carries its own lock. The
//! blocking [`FindHandle::wait`] path is an adapter over the same completion
//! state the progressive listener path uses.

use crate::aggregator::{
    CollectionMode, FindAggregator, FindListener, FindResult, Outcome, ResolveResult, ResolveSlot,
};
use crate::config::DiscoveryConfig;
use crate::criteria::{FindCriteria, ResolveCriteria};
use crate::duplicate::DuplicateFilter;
use crate::error::{Error, Result};
use crate::proxy::{ProxyGate, Redirect};
use crate::record::EndpointRecord;
use crate::scope::{CustomRuleRegistry, ScopeMatcher};
use crate::sequence::{new_message_id, AppSequence, SequenceGenerator};
use crate::timer::DeadlineTimer;
use crate::transport::DiscoveryTransport;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

/// One pending operation slot, keyed by correlation id.
#[derive(Clone)]
enum PendingOp {
    Find {
        aggregator: Arc<FindAggregator>,
        max_results: usize,
    },
    Resolve {
        slot: Arc<ResolveSlot>,
        address: String,
    },
}

struct ClientShared {
    transport: Arc<dyn DiscoveryTransport>,
    gate: Option<Arc<dyn ProxyGate>>,
    sequencer: SequenceGenerator,
    duplicates: Arc<DuplicateFilter>,
    custom_rules: CustomRuleRegistry,
    config: DiscoveryConfig,
    pending: DashMap<String, PendingOp>,
    timer: DeadlineTimer,
    shutdown: AtomicBool,
}

impl ClientShared {
    fn ensure_running(&self) -> Result<()> {
        if self.shutdown.load(Ordering::Relaxed) {
            return Err(Error::Shutdown);
        }
        Ok(())
    }

    /// Move an operation out of the pending set and finalize it. Returns
    /// false if the correlation id is unknown (already finalized or never
    /// issued), which makes deadline/cancel races no-ops.
    fn finalize_op(&self, correlation_id: &str, outcome: Outcome) -> bool {
        let Some((_, op)) = self.pending.remove(correlation_id) else {
            return false;
        };
        self.timer.disarm(correlation_id);
        log::debug!("[client] finalizing {} ({:?})", correlation_id, outcome);
        match op {
            PendingOp::Find { aggregator, .. } => aggregator.finalize(outcome),
            PendingOp::Resolve { slot, .. } => slot.finalize(outcome),
        }
    }

    fn deadline_fired(&self, correlation_id: &str) {
        self.finalize_op(correlation_id, Outcome::DeadlineElapsed);
    }

    /// Evaluate the proxy gate, degrading to "no redirect" on failure.
    fn redirect_for_find(&self, criteria: &FindCriteria) -> Redirect {
        match &self.gate {
            Some(gate) => match gate.evaluate_find(criteria) {
                Ok(redirect) => redirect,
                Err(err) => {
                    log::warn!("[client] proxy gate failed, multicasting: {}", err);
                    Redirect::none()
                }
            },
            None => Redirect::none(),
        }
    }

    fn redirect_for_resolve(&self, criteria: &ResolveCriteria) -> Redirect {
        match &self.gate {
            Some(gate) => match gate.evaluate_resolve(criteria) {
                Ok(redirect) => redirect,
                Err(err) => {
                    log::warn!("[client] proxy gate failed, multicasting: {}", err);
                    Redirect::none()
                }
            },
            None => Redirect::none(),
        }
    }
}

/// Asynchronous Find/Resolve orchestration engine.
///
/// Construct via [`DiscoveryClient::builder`]. The transport collaborator
/// delivers decoded response messages through
/// [`probe_matches_received`](Self::probe_matches_received) and
/// [`resolve_match_received`](Self::resolve_match_received).
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use wsd::{DiscoveryClient, DiscoveryTransport, FindCriteria};
///
/// fn run(transport: Arc<dyn DiscoveryTransport>) -> wsd::Result<()> {
///     let client = DiscoveryClient::builder(transport).build()?;
///     let handle = client.find(
///         FindCriteria::new()
///             .with_type("tns:PrinterService")
///             .with_duration(Duration::from_secs(5)),
///     )?;
///     let result = handle.wait();
///     println!("found {} endpoints", result.records.len());
///     Ok(())
/// }
/// ```
pub struct DiscoveryClient {
    shared: Arc<ClientShared>,
}

impl DiscoveryClient {
    /// Start building a client over the given transport.
    pub fn builder(transport: Arc<dyn DiscoveryTransport>) -> DiscoveryClientBuilder {
        DiscoveryClientBuilder {
            transport,
            config: DiscoveryConfig::default(),
            gate: None,
            custom_rules: CustomRuleRegistry::new(),
            sequencer: None,
        }
    }

    /// Issue a Find and collect matches in batch mode: the result set is
    /// delivered once, at finalization.
    ///
    /// # Errors
    /// Argument errors (invalid scope, unknown match rule) and transport
    /// send failures surface here synchronously.
    pub fn find(&self, criteria: FindCriteria) -> Result<FindHandle> {
        self.start_find(criteria, CollectionMode::Batch, None)
    }

    /// Issue a Find in progressive mode: `listener` is notified per record
    /// in arrival order, then once more with the accumulated set.
    pub fn find_progressive(
        &self,
        criteria: FindCriteria,
        listener: Arc<dyn FindListener>,
    ) -> Result<FindHandle> {
        self.start_find(criteria, CollectionMode::Progressive, Some(listener))
    }

    fn start_find(
        &self,
        criteria: FindCriteria,
        mode: CollectionMode,
        listener: Option<Arc<dyn FindListener>>,
    ) -> Result<FindHandle> {
        let shared = &self.shared;
        shared.ensure_running()?;

        // Fail fast on bad criteria; responders compile their own matcher.
        ScopeMatcher::compile(&criteria.scopes, criteria.match_rule.clone(), &shared.custom_rules)?;

        let correlation_id = new_message_id();
        let sequence = shared.sequencer.next();
        let duration = criteria
            .duration
            .unwrap_or(shared.config.default_find_duration);
        let max_results = criteria.max_results.unwrap_or(usize::MAX);

        let aggregator = Arc::new(FindAggregator::new(mode, listener));
        shared.pending.insert(
            correlation_id.clone(),
            PendingOp::Find {
                aggregator: Arc::clone(&aggregator),
                max_results,
            },
        );
        shared.timer.arm(&correlation_id, Instant::now() + duration);

        if let Err(err) = self.dispatch_probe(&correlation_id, &sequence, &criteria) {
            shared.pending.remove(&correlation_id);
            shared.timer.disarm(&correlation_id);
            return Err(err);
        }
        log::debug!(
            "[client] probe issued (id={}, types={}, scopes={}, window={:?})",
            correlation_id,
            criteria.types.len(),
            criteria.scopes.len(),
            duration
        );

        Ok(FindHandle {
            shared: Arc::clone(shared),
            correlation_id,
            aggregator,
        })
    }

    fn dispatch_probe(
        &self,
        message_id: &str,
        sequence: &AppSequence,
        criteria: &FindCriteria,
    ) -> Result<()> {
        let redirect = self.shared.redirect_for_find(criteria);
        for target in &redirect.unicast_targets {
            self.shared
                .transport
                .send_probe_to(target, message_id, sequence, criteria)?;
        }
        if !redirect.suppress_multicast {
            self.shared.transport.send_probe(message_id, sequence, criteria)?;
        }
        Ok(())
    }

    /// Issue a Resolve for one endpoint identity. The first well-formed,
    /// non-duplicate answer wins and finalizes the operation immediately.
    pub fn resolve(&self, criteria: ResolveCriteria) -> Result<ResolveHandle> {
        let shared = &self.shared;
        shared.ensure_running()?;

        if criteria.address.trim().is_empty() {
            return Err(Error::InvalidRecord(
                "resolve address must not be empty".into(),
            ));
        }

        let correlation_id = new_message_id();
        let sequence = shared.sequencer.next();
        let duration = criteria
            .duration
            .unwrap_or(shared.config.default_resolve_duration);

        let slot = Arc::new(ResolveSlot::new());
        shared.pending.insert(
            correlation_id.clone(),
            PendingOp::Resolve {
                slot: Arc::clone(&slot),
                address: criteria.address.clone(),
            },
        );
        shared.timer.arm(&correlation_id, Instant::now() + duration);

        if let Err(err) = self.dispatch_resolve(&correlation_id, &sequence, &criteria) {
            shared.pending.remove(&correlation_id);
            shared.timer.disarm(&correlation_id);
            return Err(err);
        }
        log::debug!(
            "[client] resolve issued (id={}, address={})",
            correlation_id,
            criteria.address
        );

        Ok(ResolveHandle {
            shared: Arc::clone(shared),
            correlation_id,
            slot,
        })
    }

    fn dispatch_resolve(
        &self,
        message_id: &str,
        sequence: &AppSequence,
        criteria: &ResolveCriteria,
    ) -> Result<()> {
        let redirect = self.shared.redirect_for_resolve(criteria);
        for target in &redirect.unicast_targets {
            self.shared
                .transport
                .send_resolve_to(target, message_id, sequence, criteria)?;
        }
        if !redirect.suppress_multicast {
            self.shared
                .transport
                .send_resolve(message_id, sequence, criteria)?;
        }
        Ok(())
    }

    /// Route a decoded ProbeMatches message to its pending Find.
    ///
    /// Re-delivered messages (same sender sequence) and unknown or already
    /// finalized correlation ids are dropped silently. `is_final` is the
    /// responder's assertion that no further matches follow; it finalizes
    /// the operation early with [`Outcome::Completed`].
    pub fn probe_matches_received(
        &self,
        relates_to: &str,
        sequence: &AppSequence,
        records: Vec<EndpointRecord>,
        is_final: bool,
    ) {
        let shared = &self.shared;
        if shared.duplicates.is_duplicate(&sequence.dedup_key()) {
            log::debug!("[client] duplicate probe-matches dropped (seq={})", sequence.dedup_key());
            return;
        }
        // Clone the slot out so no map shard lock is held during offers.
        let Some(op) = shared.pending.get(relates_to).map(|e| e.value().clone()) else {
            log::debug!("[client] probe-matches for unknown id {} dropped", relates_to);
            return;
        };
        let PendingOp::Find {
            aggregator,
            max_results,
        } = op
        else {
            log::debug!("[client] probe-matches for non-find id {} dropped", relates_to);
            return;
        };

        let mut complete = is_final;
        for record in records {
            match aggregator.offer(record) {
                Some(count) if count >= max_results => {
                    complete = true;
                    break;
                }
                Some(_) => {}
                // Finalized while we were routing; late records drop.
                None => return,
            }
        }
        if complete {
            shared.finalize_op(relates_to, Outcome::Completed);
        }
    }

    /// Route a decoded ResolveMatches message to its pending Resolve.
    ///
    /// The first answer whose record address matches the requested identity
    /// wins; everything after that is dropped.
    pub fn resolve_match_received(
        &self,
        relates_to: &str,
        sequence: &AppSequence,
        record: EndpointRecord,
    ) {
        let shared = &self.shared;
        if shared.duplicates.is_duplicate(&sequence.dedup_key()) {
            log::debug!("[client] duplicate resolve-match dropped (seq={})", sequence.dedup_key());
            return;
        }
        let Some(op) = shared.pending.get(relates_to).map(|e| e.value().clone()) else {
            log::debug!("[client] resolve-match for unknown id {} dropped", relates_to);
            return;
        };
        let PendingOp::Resolve { slot, address } = op else {
            log::debug!("[client] resolve-match for non-resolve id {} dropped", relates_to);
            return;
        };
        if record.address() != address {
            log::debug!(
                "[client] resolve-match address {} does not match requested {}, dropped",
                record.address(),
                address
            );
            return;
        }
        if slot.offer(record) {
            shared.finalize_op(relates_to, Outcome::Completed);
        }
    }

    /// The duplicate-message window shared by this client's receive paths.
    /// Hand it to an [`AnnouncementSink`](crate::AnnouncementSink) to share
    /// one window per service instance.
    pub fn duplicate_filter(&self) -> Arc<DuplicateFilter> {
        Arc::clone(&self.shared.duplicates)
    }

    /// Number of operations currently pending.
    pub fn pending_operations(&self) -> usize {
        self.shared.pending.len()
    }

    /// Cancel all pending operations and refuse new ones. Idempotent.
    pub fn shutdown(&self) {
        if self.shared.shutdown.swap(true, Ordering::Relaxed) {
            return;
        }
        let ids: Vec<String> = self.shared.pending.iter().map(|e| e.key().clone()).collect();
        for id in ids {
            self.shared.finalize_op(&id, Outcome::Cancelled);
        }
        log::debug!("[client] shut down");
    }
}

impl Drop for DiscoveryClient {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Builder for [`DiscoveryClient`].
pub struct DiscoveryClientBuilder {
    transport: Arc<dyn DiscoveryTransport>,
    config: DiscoveryConfig,
    gate: Option<Arc<dyn ProxyGate>>,
    custom_rules: CustomRuleRegistry,
    sequencer: Option<SequenceGenerator>,
}

impl DiscoveryClientBuilder {
    /// Use a non-default configuration.
    #[must_use]
    pub fn config(mut self, config: DiscoveryConfig) -> Self {
        self.config = config;
        self
    }

    /// Install a managed-proxy redirect gate.
    #[must_use]
    pub fn proxy_gate(mut self, gate: Arc<dyn ProxyGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Register a custom scope comparison rule.
    #[must_use]
    pub fn custom_rule<F>(mut self, token: impl Into<String>, matcher: F) -> Self
    where
        F: Fn(&str, &str) -> bool + Send + Sync + 'static,
    {
        self.custom_rules.register(token, matcher);
        self
    }

    /// Use an explicitly constructed sequence generator instead of the
    /// wall-clock default.
    #[must_use]
    pub fn sequence_generator(mut self, sequencer: SequenceGenerator) -> Self {
        self.sequencer = Some(sequencer);
        self
    }

    /// Validate the configuration and start the client.
    ///
    /// # Errors
    /// `Error::InvalidHistoryLength` if the duplicate window capacity is zero.
    pub fn build(self) -> Result<DiscoveryClient> {
        self.config.validate()?;
        let duplicates = Arc::new(DuplicateFilter::new(
            self.config.duplicate_message_history_length,
        )?);
        let sequencer = self.sequencer.unwrap_or_default();
        let transport = self.transport;
        let gate = self.gate;
        let custom_rules = self.custom_rules;
        let config = self.config;

        let shared = Arc::new_cyclic(|weak: &Weak<ClientShared>| {
            let timer_ref = weak.clone();
            ClientShared {
                transport,
                gate,
                sequencer,
                duplicates,
                custom_rules,
                config,
                pending: DashMap::new(),
                timer: DeadlineTimer::spawn(move |id| {
                    if let Some(shared) = timer_ref.upgrade() {
                        shared.deadline_fired(&id);
                    }
                }),
                shutdown: AtomicBool::new(false),
            }
        });

        Ok(DiscoveryClient { shared })
    }
}

/// Handle to a pending (or finished) Find operation.
pub struct FindHandle {
    shared: Arc<ClientShared>,
    correlation_id: String,
    aggregator: Arc<FindAggregator>,
}

impl std::fmt::Debug for FindHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FindHandle")
            .field("correlation_id", &self.correlation_id)
            .finish_non_exhaustive()
    }
}

impl FindHandle {
    /// Block until the operation is done and return the result. Safe to
    /// call from multiple threads; each caller sees the same result.
    pub fn wait(&self) -> FindResult {
        self.aggregator.wait()
    }

    /// Bounded wait; `None` if the operation is still collecting.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<FindResult> {
        self.aggregator.wait_timeout(timeout)
    }

    /// Cancel the operation. Records collected so far stay visible in the
    /// result with [`Outcome::Cancelled`]. A no-op once the operation is
    /// done.
    pub fn cancel(&self) {
        self.shared.finalize_op(&self.correlation_id, Outcome::Cancelled);
    }

    /// Correlation id stamped on the outbound probe.
    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    /// True once the operation reached its terminal state.
    pub fn is_done(&self) -> bool {
        self.aggregator.is_finalized()
    }
}

/// Handle to a pending (or finished) Resolve operation.
pub struct ResolveHandle {
    shared: Arc<ClientShared>,
    correlation_id: String,
    slot: Arc<ResolveSlot>,
}

impl ResolveHandle {
    /// Block until the operation is done and return the result.
    pub fn wait(&self) -> ResolveResult {
        self.slot.wait()
    }

    /// Cancel the operation. A cancelled Resolve discards any record
    /// already received. A no-op once the operation is done.
    pub fn cancel(&self) {
        self.shared.finalize_op(&self.correlation_id, Outcome::Cancelled);
    }

    /// Correlation id stamped on the outbound resolve.
    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    /// True once the operation reached its terminal state.
    pub fn is_done(&self) -> bool {
        self.slot.is_finalized()
    }
}
