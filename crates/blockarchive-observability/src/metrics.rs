//! Archive metrics definitions.
//!
//! `ArchiveMetrics` plugs into the archiver as an
//! [`ArchiveObserver`](blockarchive_core::ArchiveObserver); append failures
//! surface here as the operator-visible health signal.

use blockarchive_core::{ArchiveObserver, ChainRole, RecordReport};
use opentelemetry::{
    metrics::{Counter, Histogram, Meter},
    KeyValue,
};

/// OpenTelemetry instruments for the block archiver.
#[derive(Clone)]
pub struct ArchiveMetrics {
    pub records_attempted: Counter<u64>,
    pub records_appended: Counter<u64>,
    pub append_failures: Counter<u64>,
    pub payload_fallbacks: Counter<u64>,
    pub snapshot_fallbacks: Counter<u64>,
    pub alt_chains: Histogram<u64>,
}

impl ArchiveMetrics {
    pub fn new(meter: &Meter) -> Self {
        Self {
            records_attempted: meter
                .u64_counter("blockarchive.records_attempted")
                .with_description("Blocks handed to the archiver")
                .build(),
            records_appended: meter
                .u64_counter("blockarchive.records_appended")
                .with_description("Archive lines written to the destination")
                .build(),
            append_failures: meter
                .u64_counter("blockarchive.append_failures")
                .with_description("Archive lines dropped because the append failed")
                .build(),
            payload_fallbacks: meter
                .u64_counter("blockarchive.payload_fallbacks")
                .with_description("Records archived with an empty block payload")
                .build(),
            snapshot_fallbacks: meter
                .u64_counter("blockarchive.snapshot_fallbacks")
                .with_description("Records archived with an empty alt-chain snapshot after a lookup failure")
                .build(),
            alt_chains: meter
                .u64_histogram("blockarchive.alt_chains")
                .with_description("Alternate chains known when a block was archived")
                .build(),
        }
    }
}

fn role_label(role: ChainRole) -> &'static str {
    match role {
        ChainRole::Main => "main",
        ChainRole::Alternate => "alt",
    }
}

impl ArchiveObserver for ArchiveMetrics {
    fn on_record(&self, report: &RecordReport) {
        let attrs = [KeyValue::new("role", role_label(report.role))];
        self.records_attempted.add(1, &attrs);
        if report.appended {
            self.records_appended.add(1, &attrs);
        } else {
            self.append_failures.add(1, &attrs);
        }
        if report.payload_fallback {
            self.payload_fallbacks.add(1, &[]);
        }
        if report.snapshot_fallback {
            self.snapshot_fallbacks.add(1, &[]);
        }
        self.alt_chains.record(report.alt_chains, &[]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockarchive_core::SchemaVersion;

    #[test]
    fn records_without_a_provider() {
        // global meter is a no-op until a provider is installed
        let meter = opentelemetry::global::meter("blockarchive-test");
        let metrics = ArchiveMetrics::new(&meter);
        metrics.on_record(&RecordReport {
            schema_version: SchemaVersion::V7,
            role: ChainRole::Alternate,
            observed_at_ms: 1,
            alt_chains: 2,
            payload_fallback: true,
            snapshot_fallback: false,
            appended: false,
            line_bytes: 0,
        });
    }

    #[test]
    fn role_labels() {
        assert_eq!(role_label(ChainRole::Main), "main");
        assert_eq!(role_label(ChainRole::Alternate), "alt");
    }
}
