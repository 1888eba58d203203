//! The archive record: everything one line says about one block.

use serde::Serialize;

use crate::schema::SchemaVersion;
use crate::types::{AltChainEntry, ChainRole, SyncState};

/// One observation of an accepted block. Built, encoded and dropped within
/// a single hook call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveRecord {
    pub schema_version: SchemaVersion,
    /// Node wall-clock time of the observation, in milliseconds.
    pub observed_at_ms: u64,
    pub chain_role: ChainRole,
    /// Block JSON from the host codec (or the empty-object sentinel).
    pub block_payload: String,
    pub alt_chain_snapshot: Vec<AltChainEntry>,
    /// Present only for versions whose layout carries it.
    pub sync_state: Option<SyncState>,
}

impl ArchiveRecord {
    pub fn new(
        schema_version: SchemaVersion,
        observed_at_ms: u64,
        chain_role: ChainRole,
        block_payload: impl Into<String>,
        alt_chain_snapshot: Vec<AltChainEntry>,
        sync_state: SyncState,
    ) -> Self {
        Self {
            schema_version,
            observed_at_ms,
            chain_role,
            block_payload: block_payload.into(),
            alt_chain_snapshot,
            sync_state: schema_version.has_sync_state().then_some(sync_state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn v6_drops_sync_state() {
        let sync = SyncState::from_heights(10, 20);
        let r = ArchiveRecord::new(SchemaVersion::V6, 1, ChainRole::Main, "{}", vec![], sync);
        assert!(r.sync_state.is_none());
        let r = ArchiveRecord::new(SchemaVersion::V7, 1, ChainRole::Main, "{}", vec![], sync);
        assert_eq!(r.sync_state, Some(sync));
    }
}
