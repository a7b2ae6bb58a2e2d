//! Request sequencing
//!
//! Clients that refetch a view (for example the catalog listing as filters change) may have
//! several requests in flight for the same view. Only the most recently started request's
//! result is applied; results from superseded requests are discarded rather than queued.

use std::sync::atomic::{AtomicU64, Ordering};

/// Issues tickets for requests against a single view.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: AtomicU64,
}

/// Identifies one started request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestTicket(u64);

impl RequestSequencer {
    /// Create a sequencer with no requests started.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request, superseding every earlier one.
    pub fn begin(&self) -> RequestTicket {
        RequestTicket(self.latest.fetch_add(1, Ordering::AcqRel).wrapping_add(1))
    }

    /// Check whether `ticket` belongs to the most recently started request.
    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        self.latest.load(Ordering::Acquire) == ticket.0
    }

    /// Pass `value` through when `ticket` is still current, otherwise drop it.
    pub fn accept<T>(&self, ticket: RequestTicket, value: T) -> Option<T> {
        self.is_current(ticket).then_some(value)
    }
}
