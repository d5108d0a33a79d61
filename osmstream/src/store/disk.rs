//! Append-only coordinate file with a two-level binary search.
//!
//! The write path appends strictly ascending `(id, lon, lat)` records after
//! a reserved 40-byte header. `finalize` stamps the header, appends the
//! sparse-index region and loads it into memory, after which the store is
//! read-only. Lookups first binary-search the in-memory sparse index to
//! bracket a window of at most `block_size` records, then binary-search
//! that window directly on disk reading one 8-byte id per probe.
//!
//! With a planet-scale record count R and stride N the memory cost is
//! `(R / N) * 16` bytes and a lookup touches at most `log2(N)` disk reads,
//! which is what lets way assembly resolve billions of node references
//! without a database round-trip per reference.

use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::header::Header;
use super::types::{SparseEntry, StoreError, HEADER_LEN, ID_LEN, RECORD_LEN, SPARSE_ENTRY_LEN};
use crate::coord;

/// Coordinate-indexed binary store.
///
/// One instance owns the file handle and the in-memory sparse index. The
/// lifecycle is `create` → `write`* → `finalize` → `lookup`*, or
/// `open_for_query` → `lookup`* for an existing file. `resize_sparse`
/// regenerates the index of a finalized store with a different stride.
pub struct CoordinateStore {
    file: File,
    path: PathBuf,
    block_size: u64,
    total_records: u64,
    last_id: Option<i64>,
    /// Next record byte offset during the write phase
    write_pos: u64,
    sparse: Vec<SparseEntry>,
    finalized: bool,
}

impl CoordinateStore {
    /// Creates (or truncates) a coordinate file for writing.
    ///
    /// `block_size` is the sparse-index stride N: every Nth record id is
    /// captured in memory. Lower values trade memory for fewer disk probes
    /// per lookup.
    pub fn create(path: impl AsRef<Path>, block_size: u64) -> Result<Self, StoreError> {
        if block_size == 0 {
            return Err(StoreError::InvalidState("block_size must be at least 1"));
        }

        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;

        debug!(path = %path.display(), block_size, "created coordinate store");

        Ok(Self {
            file,
            path,
            block_size,
            total_records: 0,
            last_id: None,
            write_pos: HEADER_LEN,
            sparse: Vec::new(),
            finalized: false,
        })
    }

    /// Appends one coordinate record.
    ///
    /// Ids must be strictly ascending across the life of the store and the
    /// coordinates within ±180°/±90°. Nothing is written when validation
    /// fails.
    pub fn write(&mut self, id: i64, lon: f64, lat: f64) -> Result<(), StoreError> {
        if self.finalized {
            return Err(StoreError::InvalidState("write after finalize"));
        }
        if let Some(last) = self.last_id {
            if id <= last {
                return Err(StoreError::IdOrder { id, last });
            }
        }
        coord::check_longitude(lon)?;
        coord::check_latitude(lat)?;

        let lon = coord::round7(lon);
        let lat = coord::round7(lat);

        let mut record = [0u8; RECORD_LEN as usize];
        record[0..8].copy_from_slice(&id.to_le_bytes());
        record[8..12].copy_from_slice(&coord::encode(lon)?);
        record[12..16].copy_from_slice(&coord::encode(lat)?);

        self.file.write_all_at(&record, self.write_pos)?;
        self.write_pos += RECORD_LEN;
        self.total_records += 1;
        self.last_id = Some(id);
        Ok(())
    }

    /// Writes the header, appends the sparse-index region and loads it into
    /// memory.
    ///
    /// Must be called exactly once, after the last `write` and before the
    /// first `lookup`. The store is immutable afterwards.
    pub fn finalize(&mut self) -> Result<(), StoreError> {
        if self.finalized {
            return Err(StoreError::InvalidState("finalize called twice"));
        }

        let entries = build_sparse(&self.file, self.total_records, self.block_size)?;
        let sparse_region_offset = self.write_pos;

        let header = Header {
            total_records: self.total_records,
            block_size: self.block_size,
            total_sparse_entries: entries.len() as u64,
            sparse_region_offset,
        };
        self.file.write_all_at(&header.encode(), 0)?;
        write_sparse_region(&self.file, &entries, sparse_region_offset)?;
        self.file.sync_data()?;

        info!(
            records = self.total_records,
            sparse_entries = entries.len(),
            block_size = self.block_size,
            "coordinate store finalized"
        );

        self.sparse = entries;
        self.finalized = true;
        Ok(())
    }

    /// Opens an existing coordinate file read-only and loads its sparse
    /// index.
    pub fn open_for_query(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let header = read_header(&file)?;

        if header.block_size == 0 {
            return Err(StoreError::Format("header block_size is zero".into()));
        }

        let file_len = file.metadata()?.len();
        let sparse_end = header.sparse_region_offset + header.total_sparse_entries * SPARSE_ENTRY_LEN;
        if file_len < sparse_end {
            return Err(StoreError::Format(format!(
                "file truncated: {file_len} bytes, sparse region ends at {sparse_end}"
            )));
        }

        let mut sparse: Vec<SparseEntry> = Vec::with_capacity(header.total_sparse_entries as usize);
        let mut buf = [0u8; SPARSE_ENTRY_LEN as usize];
        for k in 0..header.total_sparse_entries {
            file.read_exact_at(&mut buf, header.sparse_region_offset + k * SPARSE_ENTRY_LEN)?;
            let entry = SparseEntry {
                id: i64::from_le_bytes(buf[0..8].try_into().expect("8-byte slice")),
                offset: u64::from_le_bytes(buf[8..16].try_into().expect("8-byte slice")),
            };
            if let Some(prev) = sparse.last() {
                if entry.id < prev.id {
                    return Err(StoreError::Format(
                        "sparse index ids are not ascending".into(),
                    ));
                }
            }
            sparse.push(entry);
        }

        debug!(
            path = %path.display(),
            records = header.total_records,
            sparse_entries = sparse.len(),
            "opened coordinate store for query"
        );

        Ok(Self {
            file,
            path,
            block_size: header.block_size,
            total_records: header.total_records,
            last_id: sparse.last().map(|entry| entry.id),
            write_pos: HEADER_LEN + header.total_records * RECORD_LEN,
            sparse,
            finalized: true,
        })
    }

    /// Resolves an id to its `(lon, lat)` pair, or `None` when the id was
    /// never written.
    ///
    /// Stage one narrows the search to a window between two consecutive
    /// sparse entries without touching the disk; stage two binary-searches
    /// the window on disk, one 8-byte id read per probe.
    pub fn lookup(&self, id: i64) -> Result<Option<(f64, f64)>, StoreError> {
        if !self.finalized {
            return Err(StoreError::InvalidState("lookup before finalize"));
        }

        let upper = self.sparse.partition_point(|entry| entry.id <= id);
        if upper == 0 {
            return Ok(None);
        }

        let candidate = self.sparse[upper - 1];
        if candidate.id == id {
            return self.read_record_coords(candidate.offset);
        }
        if upper == self.sparse.len() {
            // The last sparse entry covers the last record, so nothing
            // larger exists on disk.
            return Ok(None);
        }

        self.dense_search(candidate.offset, self.sparse[upper].offset, id)
    }

    /// Rebuilds the sparse index with a new stride.
    ///
    /// The coordinate region is untouched. The fresh region is appended at
    /// the end of the file and must be durable before the header pointer
    /// moves to it; the previous region becomes dead bytes.
    pub fn resize_sparse(&mut self, new_block_size: u64) -> Result<(), StoreError> {
        if new_block_size == 0 {
            return Err(StoreError::InvalidState("block_size must be at least 1"));
        }
        if !self.finalized {
            return Err(StoreError::InvalidState("resize_sparse before finalize"));
        }

        let file = OpenOptions::new().read(true).write(true).open(&self.path)?;
        let mut header = read_header(&file)?;

        let entries = build_sparse(&file, header.total_records, new_block_size)?;
        let region_offset = file.metadata()?.len();
        write_sparse_region(&file, &entries, region_offset)?;
        file.sync_data()?;

        header.block_size = new_block_size;
        header.total_sparse_entries = entries.len() as u64;
        header.sparse_region_offset = region_offset;
        file.write_all_at(&header.encode(), 0)?;
        file.sync_data()?;

        info!(
            block_size = new_block_size,
            sparse_entries = entries.len(),
            "sparse index rebuilt"
        );

        self.file = file;
        self.block_size = new_block_size;
        self.sparse = entries;
        Ok(())
    }

    /// Flushes and closes the underlying file.
    pub fn close(self) -> Result<(), StoreError> {
        self.file.sync_all()?;
        Ok(())
    }

    /// Number of coordinate records written so far.
    pub fn total_records(&self) -> u64 {
        self.total_records
    }

    /// Current sparse-index stride.
    pub fn block_size(&self) -> u64 {
        self.block_size
    }

    /// Number of entries in the in-memory sparse index.
    pub fn sparse_entries(&self) -> usize {
        self.sparse.len()
    }

    /// True once `finalize` has run (or after `open_for_query`).
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Iterative binary search over the record window `[lo, hi]` (absolute
    /// byte offsets of 16-byte records).
    fn dense_search(&self, lo: u64, hi: u64, id: i64) -> Result<Option<(f64, f64)>, StoreError> {
        let (mut lo, mut hi) = (lo, hi);
        while lo <= hi {
            let mid = lo + ((hi - lo) / RECORD_LEN / 2) * RECORD_LEN;
            let found = match self.read_id_at(mid)? {
                Some(found) => found,
                // A probe past the end of the file is a miss, not an error.
                None => return Ok(None),
            };

            if found == id {
                return self.read_record_coords(mid);
            }
            if found > id {
                // mid is at least HEADER_LEN, so this cannot underflow.
                hi = mid - RECORD_LEN;
            } else {
                lo = mid + RECORD_LEN;
            }
        }
        Ok(None)
    }

    fn read_id_at(&self, offset: u64) -> Result<Option<i64>, StoreError> {
        let mut buf = [0u8; ID_LEN as usize];
        if !self.read_exact_at_opt(&mut buf, offset)? {
            return Ok(None);
        }
        Ok(Some(i64::from_le_bytes(buf)))
    }

    /// Reads the two encoded coordinates of the record starting at
    /// `record_offset`.
    fn read_record_coords(&self, record_offset: u64) -> Result<Option<(f64, f64)>, StoreError> {
        let mut buf = [0u8; 8];
        if !self.read_exact_at_opt(&mut buf, record_offset + ID_LEN)? {
            return Ok(None);
        }
        let lon = coord::decode(buf[0..4].try_into().expect("4-byte slice"));
        let lat = coord::decode(buf[4..8].try_into().expect("4-byte slice"));
        Ok(Some((lon, lat)))
    }

    /// Positional read distinguishing end-of-file (`Ok(false)`) from real
    /// I/O failures.
    fn read_exact_at_opt(&self, buf: &mut [u8], offset: u64) -> Result<bool, StoreError> {
        match self.file.read_exact_at(buf, offset) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => Ok(false),
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}

fn read_header(file: &File) -> Result<Header, StoreError> {
    let mut bytes = [0u8; HEADER_LEN as usize];
    match file.read_exact_at(&mut bytes, 0) {
        Ok(()) => Header::decode(&bytes),
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
            Err(StoreError::Format("file too short for header".into()))
        }
        Err(e) => Err(StoreError::Io(e)),
    }
}

/// Captures every Nth record id plus the final record from the coordinate
/// region.
///
/// The final entry guarantees that every stored id is bracketed by two
/// consecutive entries, including the tail past the last full stride. When
/// the last record happens to sit on a stride boundary the final entry
/// duplicates it, which the lookup tolerates.
fn build_sparse(
    file: &File,
    total_records: u64,
    block_size: u64,
) -> Result<Vec<SparseEntry>, StoreError> {
    if total_records == 0 {
        return Ok(Vec::new());
    }

    let stride_count = total_records.div_ceil(block_size);
    let mut entries = Vec::with_capacity(stride_count as usize + 1);
    let mut buf = [0u8; ID_LEN as usize];

    for k in 0..stride_count {
        let offset = HEADER_LEN + k * block_size * RECORD_LEN;
        file.read_exact_at(&mut buf, offset)?;
        entries.push(SparseEntry {
            id: i64::from_le_bytes(buf),
            offset,
        });
    }

    let last_offset = HEADER_LEN + (total_records - 1) * RECORD_LEN;
    file.read_exact_at(&mut buf, last_offset)?;
    entries.push(SparseEntry {
        id: i64::from_le_bytes(buf),
        offset: last_offset,
    });

    Ok(entries)
}

fn write_sparse_region(
    file: &File,
    entries: &[SparseEntry],
    start: u64,
) -> Result<(), StoreError> {
    let mut offset = start;
    let mut buf = [0u8; SPARSE_ENTRY_LEN as usize];
    for entry in entries {
        buf[0..8].copy_from_slice(&entry.id.to_le_bytes());
        buf[8..16].copy_from_slice(&entry.offset.to_le_bytes());
        file.write_all_at(&buf, offset)?;
        offset += SPARSE_ENTRY_LEN;
    }
    Ok(())
}
