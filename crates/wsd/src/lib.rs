// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # WSD - WS-Discovery correlation and orchestration core
//!
//! The protocol-independent heart of a WS-Discovery style stack: per-sender
//! AppSequence stamping, duplicate-message suppression, asynchronous
//! Find/Resolve orchestration over bounded collection windows, and compiled
//! scope matching. Wire serialization (SOAP/XML) and socket handling are
//! injected collaborators behind the [`DiscoveryTransport`] trait.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use wsd::{DiscoveryClient, DiscoveryTransport, FindCriteria, Result};
//!
//! fn main() -> Result<()> {
//!     let transport: Arc<dyn DiscoveryTransport> = make_transport();
//!     let client = DiscoveryClient::builder(transport).build()?;
//!
//!     // Probe for printers, collect answers for the default window
//!     let handle = client.find(FindCriteria::new().with_type("tns:PrinterService"))?;
//!     for record in handle.wait().records {
//!         println!("{} at {:?}", record.address(), record.xaddrs());
//!     }
//!     Ok(())
//! }
//! # fn make_transport() -> Arc<dyn DiscoveryTransport> { unimplemented!() }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +--------------------------------------------------------------------+
//! |                        Application Layer                           |
//! |   DiscoveryClient (find/resolve) | DiscoveryResponder (publish)    |
//! +--------------------------------------------------------------------+
//! |                        Correlation Core                            |
//! |   SequenceGenerator | DuplicateFilter | FindAggregator | Timer     |
//! |   ScopeMatcher (strcmp0 / rfc3986 / ldap / uuid / custom)          |
//! +--------------------------------------------------------------------+
//! |                  Injected Collaborators (not here)                 |
//! |   DiscoveryTransport: UDP multicast/unicast + SOAP/XML framing     |
//! |   ProxyGate: managed-proxy redirect authority                      |
//! +--------------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`DiscoveryClient`] | Issues Probe/Resolve, routes answers by correlation id |
//! | [`DiscoveryResponder`] | Publishes records, answers probes and resolves |
//! | [`FindCriteria`] | Types, scopes, match rule and window of a Find |
//! | [`ScopeMatcher`] | Compiled scope criteria, evaluated per candidate |
//! | [`SequenceGenerator`] | Stamps the AppSequence ordering tuple |
//! | [`DuplicateFilter`] | Bounded window over seen message identifiers |
//!
//! ## See Also
//!
//! - [WS-Discovery 1.1](https://docs.oasis-open.org/ws-dd/discovery/1.1/os/wsdd-discovery-1.1-spec-os.html)

/// Result accumulation for pending operations (progressive and batch).
pub mod aggregator;
/// Hello/Bye announcement send and receive paths.
pub mod announcement;
/// Find/Resolve orchestration engine.
pub mod client;
/// Runtime configuration knobs.
pub mod config;
/// Find and Resolve request criteria.
pub mod criteria;
/// Duplicate-message suppression window.
pub mod duplicate;
/// Error taxonomy.
pub mod error;
/// Managed-proxy redirect gate contract.
pub mod proxy;
/// Endpoint record data model.
pub mod record;
/// Service-side probe/resolve handling.
pub mod responder;
/// Compiled scope matching rules.
pub mod scope;
/// AppSequence stamping.
pub mod sequence;
/// Injected transport boundary.
pub mod transport;

mod timer;

pub use aggregator::{
    CollectionMode, FindAggregator, FindListener, FindResult, Outcome, ResolveResult, ResolveSlot,
};
pub use announcement::{AnnouncementClient, AnnouncementListener, AnnouncementSink};
pub use client::{DiscoveryClient, DiscoveryClientBuilder, FindHandle, ResolveHandle};
pub use config::{
    DiscoveryConfig, DEFAULT_DUPLICATE_HISTORY_LENGTH, DEFAULT_FIND_DURATION,
    DEFAULT_RESOLVE_DURATION,
};
pub use criteria::{FindCriteria, ResolveCriteria};
pub use duplicate::DuplicateFilter;
pub use error::{Error, Result};
pub use proxy::{ProxyGate, Redirect};
pub use record::{EndpointRecord, RecordBuilder};
pub use responder::DiscoveryResponder;
pub use scope::{
    CustomRuleRegistry, CustomScopeMatcher, MatchRule, ScopeMatcher, MATCH_BY_EXACT,
    MATCH_BY_LDAP, MATCH_BY_PREFIX, MATCH_BY_UUID,
};
pub use sequence::{new_message_id, AppSequence, SequenceGenerator};
pub use transport::DiscoveryTransport;
