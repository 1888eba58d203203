//! Archive schema versions and their field layouts.
//!
//! Each version owns a fixed, ordered field list. Layouts are never edited
//! once shipped; a change in shape means a new version. Records of different
//! versions coexist in one destination, and readers dispatch on the leading
//! version field (v7 onward).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ArchiveError;

/// Field delimiter used between archive fields.
pub const FIELD_DELIMITER: char = '\t';

/// Line terminator of every archive record.
pub const LINE_TERMINATOR: char = '\n';

/// One column of an archive line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    SchemaVersion,
    ObservedAtMs,
    ChainRole,
    BlockPayload,
    AltCount,
    AltJson,
    Synced,
    ObservedHeight,
    TargetHeight,
}

impl Field {
    /// Column name, as printed by `blockarchive layout`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SchemaVersion => "schema_version",
            Self::ObservedAtMs => "observed_at_ms",
            Self::ChainRole => "chain_role_flag",
            Self::BlockPayload => "block_payload",
            Self::AltCount => "alt_count",
            Self::AltJson => "alt_json",
            Self::Synced => "synced_flag",
            Self::ObservedHeight => "observed_height",
            Self::TargetHeight => "target_height",
        }
    }
}

const V6_LAYOUT: &[Field] = &[
    Field::ObservedAtMs,
    Field::ChainRole,
    Field::BlockPayload,
    Field::AltCount,
    Field::AltJson,
];

const V7_LAYOUT: &[Field] = &[
    Field::SchemaVersion,
    Field::ObservedAtMs,
    Field::ChainRole,
    Field::BlockPayload,
    Field::AltCount,
    Field::AltJson,
    Field::Synced,
    Field::ObservedHeight,
    Field::TargetHeight,
];

/// Archive record generations this crate can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub enum SchemaVersion {
    /// Block and alt-chain snapshot, no version column.
    V6,
    /// Leading version column plus the node's sync state.
    V7,
}

impl SchemaVersion {
    /// The version written by default.
    pub const CURRENT: Self = Self::V7;

    /// Every supported version, oldest first.
    pub const ALL: [Self; 2] = [Self::V6, Self::V7];

    pub fn as_u64(&self) -> u64 {
        match self {
            Self::V6 => 6,
            Self::V7 => 7,
        }
    }

    pub fn from_u64(version: u64) -> Option<Self> {
        match version {
            6 => Some(Self::V6),
            7 => Some(Self::V7),
            _ => None,
        }
    }

    /// Ordered field list for this version.
    pub fn layout(&self) -> &'static [Field] {
        match self {
            Self::V6 => V6_LAYOUT,
            Self::V7 => V7_LAYOUT,
        }
    }

    /// Number of delimited fields in one line of this version.
    pub fn field_count(&self) -> usize {
        self.layout().len()
    }

    /// Returns `true` if records of this version carry the sync state.
    pub fn has_sync_state(&self) -> bool {
        self.layout().contains(&Field::Synced)
    }
}

impl Default for SchemaVersion {
    fn default() -> Self {
        Self::CURRENT
    }
}

impl TryFrom<u64> for SchemaVersion {
    type Error = ArchiveError;

    fn try_from(version: u64) -> Result<Self, Self::Error> {
        Self::from_u64(version).ok_or(ArchiveError::UnsupportedSchema { version })
    }
}

impl From<SchemaVersion> for u64 {
    fn from(version: SchemaVersion) -> Self {
        version.as_u64()
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.as_u64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn v7_extends_v6() {
        let v6 = SchemaVersion::V6.layout();
        let v7 = SchemaVersion::V7.layout();
        assert_eq!(v7[0], Field::SchemaVersion);
        // v6 columns appear in the same order right after the version column
        assert_eq!(&v7[1..=v6.len()], v6);
        assert_eq!(SchemaVersion::V7.field_count(), 9);
        assert_eq!(SchemaVersion::V6.field_count(), 5);
    }

    #[test]
    fn sync_state_only_from_v7() {
        assert!(!SchemaVersion::V6.has_sync_state());
        assert!(SchemaVersion::V7.has_sync_state());
    }

    #[test]
    fn version_numbers() {
        assert_eq!(SchemaVersion::try_from(7).unwrap(), SchemaVersion::V7);
        assert_eq!(SchemaVersion::from_u64(6), Some(SchemaVersion::V6));
        assert!(matches!(
            SchemaVersion::try_from(5),
            Err(ArchiveError::UnsupportedSchema { version: 5 })
        ));
        assert_eq!(SchemaVersion::default(), SchemaVersion::V7);
        assert_eq!(SchemaVersion::V6.to_string(), "v6");
    }

    #[test]
    fn serde_as_number() {
        assert_eq!(serde_json::to_string(&SchemaVersion::V7).unwrap(), "7");
        let v: SchemaVersion = serde_json::from_str("6").unwrap();
        assert_eq!(v, SchemaVersion::V6);
        assert!(serde_json::from_str::<SchemaVersion>("8").is_err());
    }
}
