use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use super::metrics::{compute_snapshot, TelemetrySnapshot};
use crate::services::analytics::{AnalyticsError, FailureKind};

const MAX_RECORDS: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchKind {
    Incoming,
    Outgoing,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Sent,
    /// Gated before any call was made (untrackable, opted out, disabled).
    Skipped,
    Failed(FailureKind),
}

impl DispatchOutcome {
    pub fn from_result<T>(result: &Result<T, AnalyticsError>) -> Self {
        match result {
            Ok(_) => DispatchOutcome::Sent,
            Err(AnalyticsError::NotSent) => DispatchOutcome::Skipped,
            Err(e) => DispatchOutcome::Failed(e.kind()),
        }
    }
}

/// One dispatch attempt. Identifiers and outcome only, never content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRecord {
    pub kind: DispatchKind,
    pub correlation_id: Option<String>,
    pub outcome: DispatchOutcome,
}

#[derive(Debug)]
pub struct TelemetryRecorder {
    buffer: VecDeque<DispatchRecord>,
}

impl Default for TelemetryRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryRecorder {
    pub fn new() -> Self {
        Self {
            buffer: VecDeque::with_capacity(64),
        }
    }

    pub fn record(&mut self, record: DispatchRecord) {
        if self.buffer.len() >= MAX_RECORDS {
            self.buffer.pop_front();
        }
        self.buffer.push_back(record);
    }

    pub fn records(&self) -> impl Iterator<Item = &DispatchRecord> {
        self.buffer.iter()
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        compute_snapshot(&self.buffer)
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

/// Where every detached dispatch reports. Logs failures and keeps the record.
#[derive(Debug, Clone, Default)]
pub struct TelemetrySink {
    recorder: Arc<Mutex<TelemetryRecorder>>,
}

impl TelemetrySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn consume(&self, record: DispatchRecord) {
        match record.outcome {
            DispatchOutcome::Sent => {
                debug!(kind = ?record.kind, correlation = ?record.correlation_id, "tracking sent");
            }
            DispatchOutcome::Skipped => {
                debug!(kind = ?record.kind, correlation = ?record.correlation_id, "tracking skipped");
            }
            DispatchOutcome::Failed(failure) => {
                warn!(kind = ?record.kind, correlation = ?record.correlation_id, failure = ?failure, "tracking failed");
            }
        }

        if let Ok(mut recorder) = self.recorder.lock() {
            recorder.record(record);
        }
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        self.recorder
            .lock()
            .map(|r| r.snapshot())
            .unwrap_or_default()
    }

    pub fn records(&self) -> Vec<DispatchRecord> {
        self.recorder
            .lock()
            .map(|r| r.records().cloned().collect())
            .unwrap_or_default()
    }
}
