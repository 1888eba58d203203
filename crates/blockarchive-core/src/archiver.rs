//! The block-acceptance hook.
//!
//! [`BlockArchiver::on_block`] is called by the host once per block that
//! reaches its main chain or an alternate chain. It snapshots the alternate
//! chains, encodes one line, appends it, and returns. Nothing it does can
//! fail the host: every error is replaced by a sentinel, logged, and counted.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::codec::{encode_payload, BlockCodec};
use crate::config::ArchiveConfig;
use crate::encoder::RecordEncoder;
use crate::error::contain;
use crate::observer::{ArchiveObserver, ArchiveStats, RecordReport};
use crate::record::ArchiveRecord;
use crate::snapshot::{AltChainSource, SnapshotBuilder};
use crate::types::{ChainRole, SyncState};
use crate::writer::{ArchiveWriter, WriterState};

/// Source of node wall-clock time.
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;
}

/// [`Clock`] backed by the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
    }
}

/// Archives every block the host accepts.
///
/// The archiver takes no locks. The host must call it from inside its
/// chain-wide critical section: `&mut self` and the borrowed chain view
/// passed to [`on_block`](Self::on_block) stand for that exclusive access,
/// and line order in the destination is the order of those calls.
pub struct BlockArchiver<B: ?Sized, C> {
    config: ArchiveConfig,
    codec: C,
    snapshots: SnapshotBuilder,
    encoder: RecordEncoder,
    writer: ArchiveWriter,
    clock: Box<dyn Clock>,
    last_observed_ms: u64,
    observers: Vec<Arc<dyn ArchiveObserver>>,
    stats: ArchiveStats,
    _block: PhantomData<fn(&B)>,
}

impl<B: ?Sized, C: BlockCodec<B>> BlockArchiver<B, C> {
    /// Create an archiver and open its destination.
    ///
    /// An unusable destination is logged, not returned: the writer retries
    /// the open on the next append.
    pub fn new(config: ArchiveConfig, codec: C) -> Self {
        if let Err(e) = config.validate() {
            tracing::warn!(error = %e, "Archive configuration is invalid, records will be dropped");
        }
        let mut writer = ArchiveWriter::new(config.path.clone());
        match writer.open() {
            Ok(()) => tracing::info!(
                path = %config.path.display(),
                schema = %config.schema_version,
                "Block archive enabled"
            ),
            Err(e) => tracing::warn!(
                path = %config.path.display(),
                error = %e,
                "Block archive destination unavailable"
            ),
        }
        Self {
            config,
            codec,
            snapshots: SnapshotBuilder::new(),
            encoder: RecordEncoder::new(),
            writer,
            clock: Box::new(SystemClock),
            last_observed_ms: 0,
            observers: Vec::new(),
            stats: ArchiveStats::default(),
            _block: PhantomData,
        }
    }

    /// Replace the wall clock (tests, simulations).
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Register an observer notified after every record.
    pub fn add_observer(&mut self, observer: Arc<dyn ArchiveObserver>) {
        self.observers.push(observer);
    }

    pub fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    pub fn stats(&self) -> ArchiveStats {
        self.stats
    }

    pub fn writer_state(&self) -> WriterState {
        self.writer.state()
    }

    /// Record one accepted block.
    ///
    /// Precondition: the caller holds the host's chain-exclusive lock, and
    /// `chain` reads state protected by it. Exactly one line is attempted.
    /// The returned report is informational; ignoring it is fine.
    pub fn on_block(
        &mut self,
        chain: &dyn AltChainSource,
        block: &B,
        role: ChainRole,
        sync: SyncState,
    ) -> RecordReport {
        let snapshot = self.snapshots.build(chain);
        let snapshot_fallback = snapshot.degraded;
        let payload = encode_payload(&self.codec, block);
        let observed_at_ms = self.observe_now();

        let record = ArchiveRecord::new(
            self.config.schema_version,
            observed_at_ms,
            role,
            payload.json,
            snapshot.entries,
            sync,
        );
        let line = self.encoder.encode(&record);

        if self.config.console_summary {
            self.log_summary(block, &record, sync);
        }

        let appended = self.writer.append(&line);
        let report = RecordReport {
            schema_version: record.schema_version,
            role,
            observed_at_ms,
            alt_chains: record.alt_chain_snapshot.len() as u64,
            payload_fallback: payload.fallback,
            snapshot_fallback,
            appended,
            line_bytes: line.len(),
        };
        self.stats.record(&report);
        for observer in &self.observers {
            if let Err(e) = contain("observer", || {
                observer.on_record(&report);
                Ok(())
            }) {
                tracing::debug!(error = %e, "Archive observer failed");
            }
        }
        report
    }

    /// Release the destination handle. A later `on_block` reopens it.
    pub fn close(&mut self) {
        self.writer.close();
    }

    /// Wall-clock time, clamped so it never goes backwards between records.
    fn observe_now(&mut self) -> u64 {
        let now = self.clock.now_ms().max(self.last_observed_ms);
        self.last_observed_ms = now;
        now
    }

    fn log_summary(&self, block: &B, record: &ArchiveRecord, sync: SyncState) {
        let summary = contain("block codec", || Ok(self.codec.summary(block)))
            .ok()
            .flatten();
        tracing::info!(
            role = %record.chain_role,
            height = summary.map(|s| s.height),
            block_ts = summary.map(|s| s.timestamp),
            observed_at_ms = record.observed_at_ms,
            alt_chains = record.alt_chain_snapshot.len(),
            sync = if sync.is_synced { "FULL" } else { "SYNC" },
            current_height = sync.observed_height,
            target_height = sync.target_height,
            "Block archive"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    use crate::codec::JsonBlockCodec;
    use crate::error::ArchiveError;
    use crate::schema::SchemaVersion;
    use crate::snapshot::MemoryChainView;
    use crate::types::{AltChainTip, BlockHash};

    /// Clock replaying a fixed sequence of readings.
    struct ScriptedClock(Mutex<Vec<u64>>);

    impl ScriptedClock {
        fn new(mut readings: Vec<u64>) -> Self {
            readings.reverse();
            Self(Mutex::new(readings))
        }
    }

    impl Clock for ScriptedClock {
        fn now_ms(&self) -> u64 {
            self.0.lock().unwrap().pop().unwrap_or(0)
        }
    }

    struct Counter(AtomicU64);

    impl ArchiveObserver for Counter {
        fn on_record(&self, _report: &RecordReport) {
            self.0.fetch_add(1, Ordering::Relaxed);
        }
    }

    struct Exploding;

    impl ArchiveObserver for Exploding {
        fn on_record(&self, _report: &RecordReport) {
            panic!("observer bug");
        }
    }

    struct NoCodec;

    impl BlockCodec<u64> for NoCodec {
        fn encode_json(&self, _block: &u64) -> Result<String, ArchiveError> {
            Err(ArchiveError::Codec("unsupported block".into()))
        }
    }

    fn archiver_in(dir: &tempfile::TempDir) -> BlockArchiver<u64, JsonBlockCodec<u64>> {
        let config = ArchiveConfig::at(dir.path().join("archive.log")).console_summary(false);
        BlockArchiver::new(config, JsonBlockCodec::new())
    }

    fn read_lines(dir: &tempfile::TempDir) -> Vec<String> {
        std::fs::read_to_string(dir.path().join("archive.log"))
            .unwrap()
            .lines()
            .map(String::from)
            .collect()
    }

    #[test]
    fn one_line_per_call() {
        let dir = tempfile::tempdir().unwrap();
        let mut archiver = archiver_in(&dir);
        let chain = MemoryChainView::new(10);
        for height in 0..3u64 {
            let report = archiver.on_block(&chain, &height, ChainRole::Main, SyncState::default());
            assert!(report.appended);
        }
        let lines = read_lines(&dir);
        assert_eq!(lines.len(), 3);
        assert_eq!(archiver.stats().records_appended, 3);
        // block payload column shows call order
        let payloads: Vec<&str> = lines.iter().map(|l| l.split('\t').nth(3).unwrap()).collect();
        assert_eq!(payloads, vec!["0", "1", "2"]);
    }

    #[test]
    fn observed_time_never_goes_backwards() {
        let dir = tempfile::tempdir().unwrap();
        let mut archiver = archiver_in(&dir).with_clock(ScriptedClock::new(vec![1000, 900, 1200]));
        let chain = MemoryChainView::new(1);
        let times: Vec<u64> = (0..3u64)
            .map(|b| {
                archiver
                    .on_block(&chain, &b, ChainRole::Main, SyncState::default())
                    .observed_at_ms
            })
            .collect();
        assert_eq!(times, vec![1000, 1000, 1200]);
    }

    #[test]
    fn snapshot_is_taken_per_call() {
        let dir = tempfile::tempdir().unwrap();
        let mut archiver = archiver_in(&dir);
        let chain = MemoryChainView::new(99);
        let first = archiver.on_block(&chain, &1, ChainRole::Main, SyncState::default());
        chain.push_chain(AltChainTip {
            tip_height: 90,
            length: 5,
            cumulative_difficulty: 77,
            tip_hash: BlockHash::new([9; 32]),
        });
        let second = archiver.on_block(&chain, &2, ChainRole::Alternate, SyncState::default());
        assert_eq!(first.alt_chains, 0);
        assert_eq!(second.alt_chains, 1);

        let lines = read_lines(&dir);
        let fields: Vec<&str> = lines[1].split('\t').collect();
        assert_eq!(fields[2], "1");
        let alts: serde_json::Value = serde_json::from_str(fields[5]).unwrap();
        assert_eq!(alts[0]["deep"], 13);
    }

    #[test]
    fn codec_failure_archives_empty_object() {
        let dir = tempfile::tempdir().unwrap();
        let config = ArchiveConfig::at(dir.path().join("archive.log"));
        let mut archiver: BlockArchiver<u64, _> = BlockArchiver::new(config, NoCodec);
        let report = archiver.on_block(&MemoryChainView::new(5), &5, ChainRole::Main, SyncState::default());
        assert!(report.appended);
        assert!(report.payload_fallback);
        let lines = read_lines(&dir);
        assert_eq!(lines[0].split('\t').nth(3), Some("{}"));
        assert_eq!(archiver.stats().payload_fallbacks, 1);
    }

    #[test]
    fn write_failure_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        let config = ArchiveConfig::at(dir.path().join("nope").join("archive.log"));
        let mut archiver: BlockArchiver<u64, _> = BlockArchiver::new(config, JsonBlockCodec::new());
        assert_eq!(archiver.writer_state(), WriterState::Closed);
        let report = archiver.on_block(&MemoryChainView::new(5), &5, ChainRole::Main, SyncState::default());
        assert!(!report.appended);
        assert_eq!(archiver.stats().append_failures, 1);
        assert!(!archiver.stats().is_healthy());
    }

    #[test]
    fn observers_see_every_record_and_cannot_break_it() {
        let dir = tempfile::tempdir().unwrap();
        let mut archiver = archiver_in(&dir);
        let counter = Arc::new(Counter(AtomicU64::new(0)));
        archiver.add_observer(Arc::new(Exploding));
        archiver.add_observer(counter.clone());
        let chain = MemoryChainView::new(1);
        archiver.on_block(&chain, &1, ChainRole::Main, SyncState::default());
        archiver.on_block(&chain, &2, ChainRole::Main, SyncState::default());
        assert_eq!(counter.0.load(Ordering::Relaxed), 2);
        assert_eq!(read_lines(&dir).len(), 2);
    }

    #[test]
    fn observer_panic_is_isolated_per_observer() {
        let dir = tempfile::tempdir().unwrap();
        let mut archiver = archiver_in(&dir);
        let before = Arc::new(Counter(AtomicU64::new(0)));
        let after = Arc::new(Counter(AtomicU64::new(0)));
        archiver.add_observer(before.clone());
        archiver.add_observer(Arc::new(Exploding));
        archiver.add_observer(after.clone());
        let report = archiver.on_block(&MemoryChainView::new(1), &1, ChainRole::Main, SyncState::default());
        assert!(report.appended);
        assert_eq!(before.0.load(Ordering::Relaxed), 1);
        assert_eq!(after.0.load(Ordering::Relaxed), 1);
        assert_eq!(archiver.stats().records_appended, 1);
    }

    #[test]
    fn v6_layout_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = ArchiveConfig::at(dir.path().join("archive.log"))
            .schema_version(SchemaVersion::V6)
            .console_summary(false);
        let mut archiver: BlockArchiver<u64, _> = BlockArchiver::new(config, JsonBlockCodec::new());
        let report = archiver.on_block(
            &MemoryChainView::new(1),
            &1,
            ChainRole::Main,
            SyncState::from_heights(1, 2),
        );
        assert_eq!(report.schema_version, SchemaVersion::V6);
        assert_eq!(read_lines(&dir)[0].split('\t').count(), 5);
    }

    #[test]
    fn close_then_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let mut archiver = archiver_in(&dir);
        let chain = MemoryChainView::new(1);
        archiver.on_block(&chain, &1, ChainRole::Main, SyncState::default());
        archiver.close();
        assert_eq!(archiver.writer_state(), WriterState::Closed);
        archiver.on_block(&chain, &2, ChainRole::Main, SyncState::default());
        assert_eq!(read_lines(&dir).len(), 2);
    }
}
