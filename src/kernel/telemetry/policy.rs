use std::collections::BTreeSet;

use crate::kernel::config::DEFAULT_UNTRACKED_REQUEST_TYPES;
use crate::kernel::envelope::RequestEnvelope;

/// Decides which requests may reach the analytics provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingPolicy {
    untracked: BTreeSet<String>,
}

impl Default for TrackingPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_UNTRACKED_REQUEST_TYPES.iter().map(|s| s.to_string()))
    }
}

impl TrackingPolicy {
    pub fn new<I: IntoIterator<Item = String>>(untracked: I) -> Self {
        Self {
            untracked: untracked.into_iter().collect(),
        }
    }

    pub fn untracked(&self) -> &BTreeSet<String> {
        &self.untracked
    }

    /// A request is trackable when it carries a session and a resolvable user,
    /// and its kind is not in the exclusion set.
    pub fn trackable(&self, envelope: &RequestEnvelope) -> bool {
        envelope.has_session()
            && envelope.user_id().is_some()
            && !self.untracked.contains(envelope.request_type())
    }
}
