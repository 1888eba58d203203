//! Alternate-chain snapshots.
//!
//! A snapshot is rebuilt from scratch for every record. The builder reads the
//! host's chain view under the lock the caller already holds and never takes
//! one of its own.

use std::sync::Mutex;

use crate::error::{contain, ArchiveError};
use crate::types::{AltChainEntry, AltChainTip};

/// Read-only view of the host's chain state.
///
/// Implemented by the host node. Calls happen while the host holds its
/// chain-wide exclusive lock, so implementations must not try to take it again.
pub trait AltChainSource {
    /// Height (index) of the current main-chain tip block.
    fn top_block_height(&self) -> Result<u64, ArchiveError>;

    /// Every alternate chain the host currently knows about.
    fn alternative_chains(&self) -> Result<Vec<AltChainTip>, ArchiveError>;
}

/// Point-in-time summary of all known alternate chains.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AltChainSnapshot {
    /// Main-chain height used as the reference for depth (`tip index + 1`).
    pub height_without_bootstrap: u64,
    /// One entry per alternate chain, in the order the host reported them.
    pub entries: Vec<AltChainEntry>,
    /// `true` when enumeration failed and the snapshot fell back to empty.
    pub degraded: bool,
}

impl AltChainSnapshot {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn degraded() -> Self {
        Self {
            height_without_bootstrap: 0,
            entries: Vec::new(),
            degraded: true,
        }
    }
}

/// Builds [`AltChainSnapshot`]s from an [`AltChainSource`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotBuilder;

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Take a snapshot. Never fails: any error from the source yields an
    /// empty, degraded snapshot.
    pub fn build(&self, source: &dyn AltChainSource) -> AltChainSnapshot {
        match contain("alt-chain source", || self.try_build(source)) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::debug!(error = %e, "Alt-chain enumeration failed, using empty snapshot");
                AltChainSnapshot::degraded()
            }
        }
    }

    fn try_build(&self, source: &dyn AltChainSource) -> Result<AltChainSnapshot, ArchiveError> {
        let height_without_bootstrap = source.top_block_height()?.saturating_add(1);
        let entries = source
            .alternative_chains()?
            .iter()
            .map(|tip| entry_for(tip, height_without_bootstrap))
            .collect();
        Ok(AltChainSnapshot {
            height_without_bootstrap,
            entries,
            degraded: false,
        })
    }
}

/// Summarize one fork relative to the main chain.
///
/// Saturates at zero on inconsistent host data (zero-length forks, forks
/// starting above the main-chain tip).
pub fn entry_for(tip: &AltChainTip, height_without_bootstrap: u64) -> AltChainEntry {
    let start_height = tip.tip_height.saturating_add(1).saturating_sub(tip.length);
    let depth = height_without_bootstrap
        .saturating_sub(start_height)
        .saturating_sub(1);
    AltChainEntry {
        length: tip.length,
        start_height,
        depth,
        cumulative_difficulty: tip.cumulative_difficulty,
        tip_hash: tip.tip_hash,
    }
}

// ─── In-memory chain view ─────────────────────────────────────────────────────

/// In-memory [`AltChainSource`] for tests and embedders without a chain DB.
#[derive(Debug, Default)]
pub struct MemoryChainView {
    inner: Mutex<ChainViewState>,
}

#[derive(Debug, Default)]
struct ChainViewState {
    top_height: u64,
    chains: Vec<AltChainTip>,
}

impl MemoryChainView {
    pub fn new(top_height: u64) -> Self {
        Self {
            inner: Mutex::new(ChainViewState {
                top_height,
                chains: Vec::new(),
            }),
        }
    }

    /// Set the main-chain tip height.
    pub fn set_top_height(&self, height: u64) {
        self.inner.lock().unwrap().top_height = height;
    }

    /// Register an alternate chain.
    pub fn push_chain(&self, tip: AltChainTip) {
        self.inner.lock().unwrap().chains.push(tip);
    }

    /// Forget all alternate chains (e.g. after a reset).
    pub fn clear_chains(&self) {
        self.inner.lock().unwrap().chains.clear();
    }
}

impl AltChainSource for MemoryChainView {
    fn top_block_height(&self) -> Result<u64, ArchiveError> {
        Ok(self.inner.lock().unwrap().top_height)
    }

    fn alternative_chains(&self) -> Result<Vec<AltChainTip>, ArchiveError> {
        Ok(self.inner.lock().unwrap().chains.clone())
    }
}
