// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Managed-proxy redirect gate.
//!
//! Before broadcasting a Find/Resolve the client asks an optional external
//! authority whether the request should go to a managed proxy instead of (or
//! in addition to) multicast. The gate is purely advisory and owns no state:
//! a failing gate degrades to "do not redirect" and never blocks protocol
//! correctness, only traffic optimization.

use crate::criteria::{FindCriteria, ResolveCriteria};
use crate::error::Result;

/// Redirect decision returned by a [`ProxyGate`].
#[derive(Debug, Clone, Default)]
pub struct Redirect {
    /// Skip the multicast send entirely.
    pub suppress_multicast: bool,
    /// Proxy endpoints to unicast the request to.
    pub unicast_targets: Vec<String>,
}

impl Redirect {
    /// No redirection: multicast as usual.
    pub fn none() -> Self {
        Self::default()
    }

    /// Send only to the given proxy endpoints, suppressing multicast.
    pub fn unicast_only<I, S>(targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            suppress_multicast: true,
            unicast_targets: targets.into_iter().map(Into::into).collect(),
        }
    }
}

/// External authority deciding whether requests go through a managed proxy.
pub trait ProxyGate: Send + Sync {
    /// Decide for a Find request.
    ///
    /// # Errors
    /// Errors are logged by the caller and degrade to [`Redirect::none`].
    fn evaluate_find(&self, criteria: &FindCriteria) -> Result<Redirect>;

    /// Decide for a Resolve request. Defaults to no redirection.
    fn evaluate_resolve(&self, criteria: &ResolveCriteria) -> Result<Redirect> {
        let _ = criteria;
        Ok(Redirect::none())
    }
}
