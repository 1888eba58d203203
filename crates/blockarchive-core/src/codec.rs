//! Block payload codec seam.
//!
//! The archive treats the block as an opaque JSON blob produced by the
//! host's own serializer. Whatever the codec returns must parse as JSON and
//! is cleared of the field delimiter and line breaks before it may enter a
//! line.

use std::marker::PhantomData;

use serde::de::IgnoredAny;
use serde::Serialize;

use crate::error::{contain, ArchiveError};
use crate::schema::{FIELD_DELIMITER, LINE_TERMINATOR};
use crate::types::BlockSummary;

/// Payload written when a block cannot be serialized.
pub const EMPTY_PAYLOAD: &str = "{}";

/// Serializes host blocks into the archive's payload column.
pub trait BlockCodec<B: ?Sized>: Send + Sync {
    /// Serialize `block` as a single-line JSON document.
    fn encode_json(&self, block: &B) -> Result<String, ArchiveError>;

    /// Header facts for the console summary, when the codec knows them.
    fn summary(&self, _block: &B) -> Option<BlockSummary> {
        None
    }
}

/// [`BlockCodec`] for any block type implementing [`serde::Serialize`].
pub struct JsonBlockCodec<B: ?Sized> {
    _block: PhantomData<fn(&B)>,
}

impl<B: ?Sized> JsonBlockCodec<B> {
    pub fn new() -> Self {
        Self {
            _block: PhantomData,
        }
    }
}

impl<B: ?Sized> Default for JsonBlockCodec<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Serialize + ?Sized> BlockCodec<B> for JsonBlockCodec<B> {
    fn encode_json(&self, block: &B) -> Result<String, ArchiveError> {
        Ok(serde_json::to_string(block)?)
    }
}

/// Outcome of turning a block into the payload column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub json: String,
    /// `true` when [`EMPTY_PAYLOAD`] was substituted.
    pub fallback: bool,
}

impl Payload {
    fn fallback() -> Self {
        Self {
            json: EMPTY_PAYLOAD.to_string(),
            fallback: true,
        }
    }
}

/// Run the codec and make its output safe to embed in a line.
///
/// Never fails: codec errors, codec panics and unusable output all yield
/// [`EMPTY_PAYLOAD`].
pub fn encode_payload<B: ?Sized, C: BlockCodec<B> + ?Sized>(codec: &C, block: &B) -> Payload {
    let json = match contain("block codec", || codec.encode_json(block)) {
        Ok(json) => json,
        Err(e) => {
            tracing::debug!(error = %e, "Block codec failed, archiving empty payload");
            return Payload::fallback();
        }
    };
    match sanitize_payload(json) {
        Ok(json) => Payload {
            json,
            fallback: false,
        },
        Err(e) => {
            tracing::debug!(error = %e, "Block payload rejected, archiving empty payload");
            Payload::fallback()
        }
    }
}

/// Ensure a payload is JSON and contains no delimiter or line break.
///
/// Every payload is parsed once without being materialized. Valid JSON cannot
/// carry a raw tab or line break inside a string, so offending payloads are
/// compacted by dropping whitespace outside string literals. Key order and
/// number spelling are left as the codec wrote them.
pub fn sanitize_payload(json: String) -> Result<String, ArchiveError> {
    if json.is_empty() {
        return Err(ArchiveError::Codec("empty payload".into()));
    }
    serde_json::from_str::<IgnoredAny>(&json)?;
    if !needs_escaping(&json) {
        return Ok(json);
    }
    let compact = strip_whitespace(&json);
    debug_assert!(!needs_escaping(&compact));
    Ok(compact)
}

fn needs_escaping(s: &str) -> bool {
    s.contains(|c: char| matches!(c, FIELD_DELIMITER | LINE_TERMINATOR | '\r'))
}

fn strip_whitespace(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    let mut in_string = false;
    let mut escaped = false;
    for c in json.chars() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            out.push(c);
        } else if c == '"' {
            in_string = true;
            out.push(c);
        } else if !matches!(c, ' ' | '\t' | '\n' | '\r') {
            out.push(c);
        }
    }
    out
}
