//! Single-flight download tracking keyed by requester.

use dashmap::DashSet;
use std::fmt;
use std::sync::Arc;

/// Identity of whoever asked for a download (a chat id, a username).
///
/// Integers and strings with the same text are the same requester.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequesterId(String);

impl RequesterId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequesterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RequesterId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for RequesterId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<&RequesterId> for RequesterId {
    fn from(id: &RequesterId) -> Self {
        id.clone()
    }
}

impl From<i64> for RequesterId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl From<u64> for RequesterId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<i32> for RequesterId {
    fn from(id: i32) -> Self {
        Self(id.to_string())
    }
}

/// Set of requesters with a download in flight.
///
/// Cheap to clone; clones share the same set. Operations on different
/// requesters never contend on a common lock.
#[derive(Debug, Clone, Default)]
pub struct DownloadTracker {
    active: Arc<DashSet<RequesterId>>,
}

impl DownloadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `requester` currently has a download in flight.
    pub fn is_busy(&self, requester: &RequesterId) -> bool {
        self.active.contains(requester)
    }

    /// Marks `requester` busy, or returns `None` if it already is.
    ///
    /// The check and the insert are one atomic step. The returned guard
    /// releases the requester when dropped, on every exit path.
    pub fn try_acquire(&self, requester: impl Into<RequesterId>) -> Option<InFlightGuard> {
        let requester = requester.into();
        if !self.active.insert(requester.clone()) {
            log::debug!("Requester {} already has a download in flight", requester);
            return None;
        }
        log::debug!("Requester {} marked busy ({} in flight)", requester, self.active.len());
        Some(InFlightGuard {
            tracker: self.clone(),
            requester,
        })
    }

    /// Clears the busy mark for `requester`. Returns whether it was set.
    ///
    /// Normally invoked by [`InFlightGuard`]'s drop; calling it for an idle
    /// requester is harmless.
    pub fn release(&self, requester: &RequesterId) -> bool {
        let removed = self.active.remove(requester).is_some();
        if removed {
            log::debug!("Requester {} released", requester);
        } else {
            log::warn!("Tried to release requester {} which was not busy", requester);
        }
        removed
    }

    /// Number of requesters with a download in flight.
    pub fn active_count(&self) -> usize {
        self.active.len()
    }
}

/// Busy mark for one requester; released on drop.
#[derive(Debug)]
#[must_use = "dropping the guard immediately releases the requester"]
pub struct InFlightGuard {
    tracker: DownloadTracker,
    requester: RequesterId,
}

impl InFlightGuard {
    pub fn requester(&self) -> &RequesterId {
        &self.requester
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.tracker.release(&self.requester);
    }
}
