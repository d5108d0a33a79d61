//! Coordinate store: sorted binary file of node positions.
//!
//! An OSM way references its nodes by id only. Resolving the position of
//! every reference against a database costs one round-trip per reference,
//! and the response-time curve degrades badly as the dataset grows past
//! RAM. This module replaces that with an append-only file of sorted
//! 16-byte records searched in two stages: an in-memory sparse index of
//! every Nth record id, then an on-disk binary search inside the bracketed
//! window.
//!
//! # Key components
//!
//! - [`CoordinateStore`] - owns the file handle and the sparse index
//! - [`Header`] - the fixed 40-byte file header
//! - [`SparseEntry`] - one `(id, file offset)` pair of the sparse index
//! - [`StoreError`] - validation, format and I/O failures

mod disk;
mod header;
mod types;

pub use disk::CoordinateStore;
pub use header::Header;
pub use types::{
    SparseEntry, StoreError, COORD_LEN, HEADER_LEN, ID_LEN, RECORD_LEN, SPARSE_ENTRY_LEN,
    VERSION_MAGIC,
};
