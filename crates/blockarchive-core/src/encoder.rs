//! Record encoder — turns an [`ArchiveRecord`] into one archive line.
//!
//! Output is driven entirely by the record's [`SchemaVersion`] layout:
//!
//! ```text
//! v6:                 observed_at_ms  role  payload  alt_count  alt_json
//! v7: schema_version  observed_at_ms  role  payload  alt_count  alt_json  synced  observed_height  target_height
//! ```
//!
//! Encoding cannot fail. Every call produces exactly one newline-terminated
//! line.

use crate::record::ArchiveRecord;
use crate::schema::{Field, FIELD_DELIMITER, LINE_TERMINATOR};
use crate::types::AltChainEntry;

/// The `alt_count` / `alt_json` column pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AltColumns {
    pub count: u64,
    pub json: String,
}

impl AltColumns {
    /// Serialize a snapshot as a compact JSON array (`[]` when empty).
    ///
    /// If serialization fails both columns fall back to the empty snapshot so
    /// the count always matches the array.
    pub fn from_entries(entries: &[AltChainEntry]) -> Self {
        match serde_json::to_string(entries) {
            Ok(json) => Self {
                count: entries.len() as u64,
                json,
            },
            Err(e) => {
                tracing::debug!(error = %e, "Alt-chain snapshot not serializable, archiving []");
                Self::empty()
            }
        }
    }

    pub fn empty() -> Self {
        Self {
            count: 0,
            json: "[]".to_string(),
        }
    }
}

/// Stateless line encoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordEncoder;

impl RecordEncoder {
    pub fn new() -> Self {
        Self
    }

    /// Encode `record` using its own schema version's layout.
    pub fn encode(&self, record: &ArchiveRecord) -> String {
        let alt = AltColumns::from_entries(&record.alt_chain_snapshot);
        let sync = record.sync_state.unwrap_or_default();

        let mut line = String::with_capacity(record.block_payload.len() + alt.json.len() + 96);
        for (i, field) in record.schema_version.layout().iter().enumerate() {
            if i > 0 {
                line.push(FIELD_DELIMITER);
            }
            match field {
                Field::SchemaVersion => line.push_str(&record.schema_version.as_u64().to_string()),
                Field::ObservedAtMs => line.push_str(&record.observed_at_ms.to_string()),
                Field::ChainRole => line.push_str(&record.chain_role.flag().to_string()),
                Field::BlockPayload => line.push_str(&record.block_payload),
                Field::AltCount => line.push_str(&alt.count.to_string()),
                Field::AltJson => line.push_str(&alt.json),
                Field::Synced => line.push(if sync.is_synced { '1' } else { '0' }),
                Field::ObservedHeight => line.push_str(&sync.observed_height.to_string()),
                Field::TargetHeight => line.push_str(&sync.target_height.to_string()),
            }
        }
        line.push(LINE_TERMINATOR);
        line
    }
}
