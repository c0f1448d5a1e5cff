use std::collections::VecDeque;

use super::recorder::{DispatchKind, DispatchOutcome, DispatchRecord};
use crate::services::analytics::FailureKind;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetrySnapshot {
    pub incoming: DispatchStats,
    pub outgoing: DispatchStats,
    pub custom: DispatchStats,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchStats {
    pub sent: u64,
    pub skipped: u64,
    pub failed: u64,
    pub not_authorized: u64,
    pub transport_errors: u64,
    pub api_errors: u64,
}

impl DispatchStats {
    pub fn total(&self) -> u64 {
        self.sent + self.skipped + self.failed
    }
}

impl TelemetrySnapshot {
    pub fn total_sent(&self) -> u64 {
        self.incoming.sent + self.outgoing.sent + self.custom.sent
    }

    pub fn total_failed(&self) -> u64 {
        self.incoming.failed + self.outgoing.failed + self.custom.failed
    }
}

pub fn compute_snapshot(records: &VecDeque<DispatchRecord>) -> TelemetrySnapshot {
    let mut snap = TelemetrySnapshot::default();

    for record in records {
        let stats = match record.kind {
            DispatchKind::Incoming => &mut snap.incoming,
            DispatchKind::Outgoing => &mut snap.outgoing,
            DispatchKind::Custom => &mut snap.custom,
        };

        match record.outcome {
            DispatchOutcome::Sent => stats.sent += 1,
            DispatchOutcome::Skipped => stats.skipped += 1,
            DispatchOutcome::Failed(kind) => {
                stats.failed += 1;
                match kind {
                    FailureKind::NotAuthorized => stats.not_authorized += 1,
                    FailureKind::Transport => stats.transport_errors += 1,
                    FailureKind::Api => stats.api_errors += 1,
                    FailureKind::NotSent => {}
                }
            }
        }
    }

    snap
}
