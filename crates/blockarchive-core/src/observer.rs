//! Per-record outcome reporting.
//!
//! Observers run inside the host's critical section, right after the append.
//! They must be cheap and must not block.

use serde::Serialize;

use crate::schema::SchemaVersion;
use crate::types::ChainRole;

/// What happened to one block in the archiver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordReport {
    pub schema_version: SchemaVersion,
    pub role: ChainRole,
    pub observed_at_ms: u64,
    /// Number of alternate chains in the snapshot.
    pub alt_chains: u64,
    /// The codec failed and `{}` was archived instead.
    pub payload_fallback: bool,
    /// Alt-chain enumeration failed and an empty snapshot was archived.
    pub snapshot_fallback: bool,
    /// The line reached the destination.
    pub appended: bool,
    /// Size of the encoded line in bytes.
    pub line_bytes: usize,
}

/// Hook for metrics and health signals.
pub trait ArchiveObserver: Send + Sync {
    fn on_record(&self, report: &RecordReport);
}

/// Running totals kept by the archiver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ArchiveStats {
    pub records_attempted: u64,
    pub records_appended: u64,
    pub append_failures: u64,
    pub payload_fallbacks: u64,
    pub snapshot_fallbacks: u64,
}

impl ArchiveStats {
    pub fn record(&mut self, report: &RecordReport) {
        self.records_attempted += 1;
        if report.appended {
            self.records_appended += 1;
        } else {
            self.append_failures += 1;
        }
        if report.payload_fallback {
            self.payload_fallbacks += 1;
        }
        if report.snapshot_fallback {
            self.snapshot_fallbacks += 1;
        }
    }

    /// Returns `true` if no append has failed so far.
    pub fn is_healthy(&self) -> bool {
        self.append_failures == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(appended: bool, payload_fallback: bool) -> RecordReport {
        RecordReport {
            schema_version: SchemaVersion::V7,
            role: ChainRole::Main,
            observed_at_ms: 0,
            alt_chains: 0,
            payload_fallback,
            snapshot_fallback: false,
            appended,
            line_bytes: 20,
        }
    }

    #[test]
    fn stats_accumulate() {
        let mut stats = ArchiveStats::default();
        stats.record(&report(true, false));
        stats.record(&report(true, true));
        assert!(stats.is_healthy());
        stats.record(&report(false, false));
        assert_eq!(stats.records_attempted, 3);
        assert_eq!(stats.records_appended, 2);
        assert_eq!(stats.append_failures, 1);
        assert_eq!(stats.payload_fallbacks, 1);
        assert!(!stats.is_healthy());
    }
}
