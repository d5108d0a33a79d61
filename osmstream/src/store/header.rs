//! Coordinate file header.
//!
//! Fixed 40-byte layout at file offset 0, all fields little-endian:
//!
//! ```text
//! 0..8    version magic, ASCII "00000001"
//! 8..16   total_records: u64
//! 16..24  block_size: u64 (sparse-index stride)
//! 24..32  total_sparse_entries: u64
//! 32..40  sparse_region_offset: u64
//! ```

use super::types::{StoreError, HEADER_LEN, VERSION_MAGIC};

/// Decoded header fields of a coordinate file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Number of 16-byte records in the coordinate region
    pub total_records: u64,
    /// Sparse-index stride N
    pub block_size: u64,
    /// Number of 16-byte entries in the sparse region
    pub total_sparse_entries: u64,
    /// Absolute byte offset of the sparse region
    pub sparse_region_offset: u64,
}

impl Header {
    /// Serializes the header into its on-disk form.
    pub fn encode(&self) -> [u8; HEADER_LEN as usize] {
        let mut bytes = [0u8; HEADER_LEN as usize];
        bytes[0..8].copy_from_slice(VERSION_MAGIC);
        bytes[8..16].copy_from_slice(&self.total_records.to_le_bytes());
        bytes[16..24].copy_from_slice(&self.block_size.to_le_bytes());
        bytes[24..32].copy_from_slice(&self.total_sparse_entries.to_le_bytes());
        bytes[32..40].copy_from_slice(&self.sparse_region_offset.to_le_bytes());
        bytes
    }

    /// Parses a header, verifying the version magic.
    pub fn decode(bytes: &[u8; HEADER_LEN as usize]) -> Result<Self, StoreError> {
        if &bytes[0..8] != VERSION_MAGIC {
            return Err(StoreError::Format(format!(
                "version magic mismatch: expected {:?}, found {:?}",
                VERSION_MAGIC,
                &bytes[0..8]
            )));
        }

        let mut field = [0u8; 8];
        let mut read_u64 = |range: std::ops::Range<usize>| {
            field.copy_from_slice(&bytes[range]);
            u64::from_le_bytes(field)
        };

        Ok(Header {
            total_records: read_u64(8..16),
            block_size: read_u64(16..24),
            total_sparse_entries: read_u64(24..32),
            sparse_region_offset: read_u64(32..40),
        })
    }
}
