// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Injected transport boundary.
//!
//! The core never owns sockets or parses wire bytes. A transport collaborator
//! implements this trait (UDP multicast plus SOAP/XML framing in a real
//! deployment, an in-memory bus in tests) and calls back into
//! [`DiscoveryClient`](crate::DiscoveryClient),
//! [`DiscoveryResponder`](crate::DiscoveryResponder) or
//! [`AnnouncementSink`](crate::AnnouncementSink) with decoded messages.
//!
//! Every send takes the already-stamped [`AppSequence`]. The core does not
//! retry failed sends; retry policy, if any, belongs to the transport.

use crate::criteria::{FindCriteria, ResolveCriteria};
use crate::error::Result;
use crate::record::EndpointRecord;
use crate::sequence::AppSequence;

/// Outbound message sink implemented by the transport layer.
///
/// The `*_to` variants carry a unicast target (a proxy endpoint address
/// supplied by the redirect gate); the default implementations fall back to
/// the multicast send so transports without unicast support keep working.
pub trait DiscoveryTransport: Send + Sync {
    /// Multicast a Probe.
    fn send_probe(
        &self,
        message_id: &str,
        sequence: &AppSequence,
        criteria: &FindCriteria,
    ) -> Result<()>;

    /// Unicast a Probe to a specific endpoint.
    fn send_probe_to(
        &self,
        target: &str,
        message_id: &str,
        sequence: &AppSequence,
        criteria: &FindCriteria,
    ) -> Result<()> {
        let _ = target;
        self.send_probe(message_id, sequence, criteria)
    }

    /// Multicast a Resolve.
    fn send_resolve(
        &self,
        message_id: &str,
        sequence: &AppSequence,
        criteria: &ResolveCriteria,
    ) -> Result<()>;

    /// Unicast a Resolve to a specific endpoint.
    fn send_resolve_to(
        &self,
        target: &str,
        message_id: &str,
        sequence: &AppSequence,
        criteria: &ResolveCriteria,
    ) -> Result<()> {
        let _ = target;
        self.send_resolve(message_id, sequence, criteria)
    }

    /// Answer a Probe with the matching records. `relates_to` is the probe's
    /// message id.
    fn send_probe_matches(
        &self,
        relates_to: &str,
        sequence: &AppSequence,
        records: &[EndpointRecord],
    ) -> Result<()>;

    /// Answer a Resolve with the matching record.
    fn send_resolve_match(
        &self,
        relates_to: &str,
        sequence: &AppSequence,
        record: &EndpointRecord,
    ) -> Result<()>;

    /// Announce an endpoint coming online.
    fn send_hello(
        &self,
        message_id: &str,
        sequence: &AppSequence,
        record: &EndpointRecord,
    ) -> Result<()>;

    /// Announce an endpoint going offline.
    fn send_bye(
        &self,
        message_id: &str,
        sequence: &AppSequence,
        record: &EndpointRecord,
    ) -> Result<()>;
}
