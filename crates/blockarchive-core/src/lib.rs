//! blockarchive-core — best-effort block archival for blockchain nodes.
//!
//! # Architecture
//!
//! ```text
//! host add_block (holding chain lock)
//!     └── BlockArchiver::on_block
//!              ├── SnapshotBuilder  (alt-chain snapshot from AltChainSource)
//!              ├── BlockCodec       (block → JSON payload, `{}` on failure)
//!              ├── RecordEncoder    (versioned tab-separated line)
//!              ├── ArchiveWriter    (append-only destination)
//!              └── ArchiveObserver  (metrics / health)
//! ```
//!
//! Every step degrades to a sentinel instead of failing, so archiving can
//! never change the outcome of block acceptance.

pub mod archiver;
pub mod codec;
pub mod config;
pub mod encoder;
pub mod error;
pub mod observer;
pub mod record;
pub mod schema;
pub mod snapshot;
pub mod types;
pub mod writer;

pub use archiver::{BlockArchiver, Clock, SystemClock};
pub use codec::{BlockCodec, JsonBlockCodec, EMPTY_PAYLOAD};
pub use config::ArchiveConfig;
pub use encoder::RecordEncoder;
pub use error::ArchiveError;
pub use observer::{ArchiveObserver, ArchiveStats, RecordReport};
pub use record::ArchiveRecord;
pub use schema::{Field, SchemaVersion};
pub use snapshot::{AltChainSnapshot, AltChainSource, MemoryChainView, SnapshotBuilder};
pub use types::{AltChainEntry, AltChainTip, BlockHash, BlockSummary, ChainRole, SyncState};
pub use writer::{ArchiveWriter, WriterState};
