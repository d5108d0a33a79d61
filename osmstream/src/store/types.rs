//! Layout constants and shared types for the coordinate store.

use crate::coord::CoordError;
use thiserror::Error;

/// Size of the file header in bytes.
pub const HEADER_LEN: u64 = 40;

/// Version magic written at the start of every coordinate file.
pub const VERSION_MAGIC: &[u8; 8] = b"00000001";

/// Size of one coordinate record: id (8) + lon (4) + lat (4).
pub const RECORD_LEN: u64 = 16;

/// Size of one sparse-index entry: id (8) + file offset (8).
pub const SPARSE_ENTRY_LEN: u64 = 16;

/// Byte length of a record id.
pub const ID_LEN: u64 = 8;

/// Byte length of one encoded coordinate.
pub const COORD_LEN: u64 = 4;

/// One in-memory sparse-index entry.
///
/// `offset` is the absolute byte position of the captured record inside the
/// coordinate region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SparseEntry {
    pub id: i64,
    pub offset: u64,
}

/// Coordinate store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying storage read/write failure
    #[error("coordinate store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Coordinate outside its axis bound at write time
    #[error(transparent)]
    Range(#[from] CoordError),

    /// Non-ascending id at write time
    #[error("id {id} does not ascend past previously written id {last}")]
    IdOrder { id: i64, last: i64 },

    /// Header magic mismatch, truncated file, or corrupt sparse region
    #[error("coordinate file format error: {0}")]
    Format(String),

    /// Operation called in the wrong store lifecycle state
    #[error("invalid store state: {0}")]
    InvalidState(&'static str),
}
