//! Buffer pool configuration.

use strata_common::constants::{
    DEFAULT_BUCKET_SIZE, DEFAULT_POOL_SIZE, DEFAULT_REPLACER_K, PAGE_SIZE,
};

/// Configuration for the buffer pool.
#[derive(Debug, Clone)]
pub struct BufferPoolConfig {
    /// Number of page frames in the buffer pool.
    pub pool_size: usize,
    /// `k` for the LRU-K replacement policy.
    pub replacer_k: usize,
    /// Entries per page-table bucket.
    pub bucket_size: usize,
}

impl BufferPoolConfig {
    /// Creates a new configuration with the specified number of frames.
    pub fn new(pool_size: usize) -> Self {
        Self {
            pool_size,
            replacer_k: DEFAULT_REPLACER_K,
            bucket_size: DEFAULT_BUCKET_SIZE,
        }
    }

    /// Sets the replacement policy's `k`.
    pub fn with_replacer_k(mut self, replacer_k: usize) -> Self {
        self.replacer_k = replacer_k;
        self
    }

    /// Sets the page-table bucket size.
    pub fn with_bucket_size(mut self, bucket_size: usize) -> Self {
        self.bucket_size = bucket_size;
        self
    }

    /// Returns the total memory used by the frame buffers.
    pub fn memory_usage(&self) -> usize {
        self.pool_size * PAGE_SIZE
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.pool_size == 0 {
            return Err("pool_size must be > 0");
        }
        if self.replacer_k == 0 {
            return Err("replacer_k must be >= 1");
        }
        if self.bucket_size == 0 {
            return Err("bucket_size must be > 0");
        }
        Ok(())
    }
}

impl Default for BufferPoolConfig {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_SIZE)
    }
}
