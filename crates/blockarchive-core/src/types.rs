//! Shared types for the archival pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ArchiveError;

// ─── BlockHash ────────────────────────────────────────────────────────────────

/// A 32-byte block identifier.
///
/// Displayed and serialized as 64 lowercase hex characters without a `0x` prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BlockHash(pub [u8; 32]);

impl BlockHash {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for BlockHash {
    type Err = ArchiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|e| ArchiveError::Codec(format!("invalid block hash '{s}': {e}")))?;
        Ok(Self(bytes))
    }
}

impl Serialize for BlockHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BlockHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ─── ChainRole ────────────────────────────────────────────────────────────────

/// Whether a block extended the node's selected chain or a competing fork.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainRole {
    Main,
    Alternate,
}

impl ChainRole {
    /// Classify a block by comparing its parent with the current main-chain tail.
    pub fn classify(prev_hash: &BlockHash, tail_hash: &BlockHash) -> Self {
        if prev_hash == tail_hash {
            Self::Main
        } else {
            Self::Alternate
        }
    }

    /// The archive flag: `0` for main, `1` for alternate.
    pub fn flag(&self) -> u8 {
        match self {
            Self::Main => 0,
            Self::Alternate => 1,
        }
    }

    pub fn is_alternate(&self) -> bool {
        matches!(self, Self::Alternate)
    }
}

impl fmt::Display for ChainRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Main => write!(f, "MAIN"),
            Self::Alternate => write!(f, "ALT"),
        }
    }
}

// ─── SyncState ────────────────────────────────────────────────────────────────

/// The node's self-reported sync status at the moment a block was seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SyncState {
    /// `true` when `observed_height >= target_height`.
    pub is_synced: bool,
    /// The node's current chain height.
    pub observed_height: u64,
    /// The best height the node knows the network to be at.
    pub target_height: u64,
}

impl SyncState {
    /// Build a sync state from the host's `(current, target)` height pair.
    ///
    /// Genesis and chain resets pass `(0, 0)`, which counts as synced.
    pub fn from_heights(observed_height: u64, target_height: u64) -> Self {
        Self {
            is_synced: observed_height >= target_height,
            observed_height,
            target_height,
        }
    }
}

// ─── BlockSummary ─────────────────────────────────────────────────────────────

/// Header facts about a block, used only for the console summary line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSummary {
    /// Height claimed by the block (coinbase height).
    pub height: u64,
    /// Timestamp embedded in the block header (seconds since epoch).
    pub timestamp: u64,
}

// ─── Alternate chains ─────────────────────────────────────────────────────────

/// One alternate chain as reported by the host: its tip block and length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AltChainTip {
    /// Height of the fork's tip block.
    pub tip_height: u64,
    /// Number of blocks in the fork.
    pub length: u64,
    /// Cumulative difficulty at the fork's tip.
    pub cumulative_difficulty: u64,
    /// Hash of the fork's tip block.
    pub tip_hash: BlockHash,
}

/// Point-in-time summary of one alternate chain.
///
/// Serializes with the archive's short keys (`length, height, deep, diff, hash`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AltChainEntry {
    /// Number of blocks in the fork.
    pub length: u64,
    /// First height of the fork (`tip_height - length + 1`).
    #[serde(rename = "height")]
    pub start_height: u64,
    /// How deep the fork point is buried under the main chain.
    #[serde(rename = "deep")]
    pub depth: u64,
    #[serde(rename = "diff")]
    pub cumulative_difficulty: u64,
    #[serde(rename = "hash")]
    pub tip_hash: BlockHash,
}

// ─── Tests ────────────────────────────────────────────────────────────────────
