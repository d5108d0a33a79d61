//! Processing configuration.

use std::time::Duration;

/// Default sparse-index stride for the coordinate store.
///
/// At planet scale (~10^10 records) a stride of 100 keeps the in-memory
/// index around 1.6 GB while bounding a lookup to ~7 small disk reads.
pub const DEFAULT_BLOCK_SIZE: u64 = 100;

/// Default number of elements per batch flushed to the external stores.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Default per-operation timeout for external-store calls.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(600);

/// Configuration for a PBF processing pass.
///
/// Groups the knobs of the streaming coordinator, providing sensible
/// defaults while allowing customization.
///
/// # Example
///
/// ```
/// use osmstream::config::ProcessConfig;
/// use std::time::Duration;
///
/// let config = ProcessConfig::default();
/// assert_eq!(config.batch_size(), 100);
///
/// let config = ProcessConfig::new()
///     .with_block_size(1000)
///     .with_batch_size(50)
///     .with_store_timeout(Duration::from_secs(30));
/// assert_eq!(config.block_size(), 1000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessConfig {
    /// Sparse-index stride used when creating the coordinate store
    block_size: u64,
    /// Flush threshold for node and way batches
    batch_size: usize,
    /// Timeout applied to every external-store call
    store_timeout: Duration,
}

impl ProcessConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sparse-index stride for the coordinate store.
    ///
    /// Lower values speed up lookups at the cost of memory and file size.
    /// Default: 100.
    pub fn with_block_size(mut self, block_size: u64) -> Self {
        self.block_size = block_size;
        self
    }

    /// Set the flush threshold for node and way batches.
    ///
    /// Bulk inserts amortize the external store's per-call cost; batches
    /// stay small enough to keep single-document latency low. Default: 100.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Set the per-operation timeout for external-store calls.
    ///
    /// Default: 600 seconds.
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    /// Get the sparse-index stride.
    pub fn block_size(&self) -> u64 {
        self.block_size
    }

    /// Get the batch flush threshold.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Get the external-store timeout.
    pub fn store_timeout(&self) -> Duration {
        self.store_timeout
    }
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            batch_size: DEFAULT_BATCH_SIZE,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }
}
