//! Status Tracker: the shared request-id → lifecycle-status mapping.

use common::{RequestId, RequestStatus};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::warn;

/// Shared mapping written by the orchestrator and polled by callers.
///
/// Writes for a request are strictly monotonic in the lifecycle order; a
/// write that would move backwards (or out of a terminal state) is ignored.
#[derive(Default)]
pub struct StatusTracker {
    statuses: DashMap<RequestId, RequestStatus>,
}

impl StatusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, request_id: RequestId, status: RequestStatus) {
        match self.statuses.entry(request_id) {
            Entry::Vacant(entry) => {
                entry.insert(status);
            }
            Entry::Occupied(mut entry) => {
                let current = *entry.get();
                if current.can_transition(status) {
                    entry.insert(status);
                } else {
                    warn!(
                        "Ignoring out-of-order status write for {}: {:?} -> {:?}",
                        request_id, current, status
                    );
                }
            }
        }
    }

    pub fn get(&self, request_id: &RequestId) -> Option<RequestStatus> {
        self.statuses.get(request_id).map(|entry| *entry.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::RequestStatus::*;

    #[test]
    fn forward_writes_are_applied() {
        let tracker = StatusTracker::new();
        let id = RequestId::new();

        tracker.set(id, RequestReceived);
        tracker.set(id, GenerationStarted);
        tracker.set(id, GenerationFinished);
        tracker.set(id, Success);
        assert_eq!(tracker.get(&id), Some(Success));
    }

    #[test]
    fn backward_writes_are_ignored() {
        let tracker = StatusTracker::new();
        let id = RequestId::new();

        tracker.set(id, RequestReceived);
        tracker.set(id, GenerationFinished);
        tracker.set(id, GenerationStarted);
        assert_eq!(tracker.get(&id), Some(GenerationFinished));
    }

    #[test]
    fn terminal_states_are_sticky() {
        let tracker = StatusTracker::new();
        let id = RequestId::new();

        tracker.set(id, RequestReceived);
        tracker.set(id, Failed);
        tracker.set(id, Success);
        assert_eq!(tracker.get(&id), Some(Failed));
    }

    #[test]
    fn unknown_request_is_none() {
        let tracker = StatusTracker::new();
        assert_eq!(tracker.get(&RequestId::new()), None);
    }
}
