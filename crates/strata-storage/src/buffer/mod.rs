//! Buffer pool for StrataDB.
//!
//! The buffer pool manages a fixed-size pool of in-memory page frames,
//! mediating all access between clients and the disk:
//!
//! - **Page Caching**: hits are served from memory, misses fetched
//!   from disk
//! - **Pin/Unpin**: reference counting protects in-use frames from
//!   eviction
//! - **Dirty Tracking**: modified pages are written back on eviction
//!   or flush
//! - **Eviction Policy**: LRU-K replacement behind a swappable trait
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         BufferPool                           │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │                      Page Table                        │  │
//! │  │          ExtendibleHashTable<PageId, FrameId>          │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! │                             │                                │
//! │                             ▼                                │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │                     Frame Array                        │  │
//! │  │  ┌─────────┐ ┌─────────┐ ┌─────────┐    ┌─────────┐    │  │
//! │  │  │ Frame 0 │ │ Frame 1 │ │ Frame 2 │ ...│ Frame N │    │  │
//! │  │  │ ─────── │ │ ─────── │ │ ─────── │    │ ─────── │    │  │
//! │  │  │ page_id │ │ page_id │ │ page_id │    │ page_id │    │  │
//! │  │  │ data[]  │ │ data[]  │ │ data[]  │    │ data[]  │    │  │
//! │  │  │ dirty   │ │ dirty   │ │ dirty   │    │ dirty   │    │  │
//! │  │  │ pin_cnt │ │ pin_cnt │ │ pin_cnt │    │ pin_cnt │    │  │
//! │  │  └─────────┘ └─────────┘ └─────────┘    └─────────┘    │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! │                             │                                │
//! │                             ▼                                │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │              Free List + LRU-K Replacer                │  │
//! │  │              (victim selection for misses)             │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use strata_storage::buffer::{BufferPool, BufferPoolConfig};
//! use strata_storage::disk::MemoryDiskManager;
//!
//! # fn main() -> strata_storage::buffer::BufferResult<()> {
//! let pool = BufferPool::new(
//!     BufferPoolConfig::new(16),
//!     Arc::new(MemoryDiskManager::new()),
//! )?;
//!
//! let mut page = pool.new_page()?;
//! let page_id = page.page_id();
//! page.data_mut()[0] = 7;
//!
//! // Declare the modification and release the pin.
//! pool.unpin_page(page_id, true);
//! pool.flush_page(page_id)?;
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod frame;
mod handle;
mod pool;

pub use config::BufferPoolConfig;
pub use error::{BufferError, BufferResult};
pub use frame::BufferFrame;
pub use handle::PageHandle;
pub use pool::BufferPool;

/// Statistics for buffer pool monitoring.
#[derive(Debug, Clone, Default)]
pub struct BufferPoolStats {
    /// Total number of page fetches.
    pub fetches: u64,
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses (required disk read).
    pub misses: u64,
    /// Number of pages evicted.
    pub evictions: u64,
    /// Number of pages written back to disk.
    pub flushes: u64,
    /// Current number of pinned frames.
    pub pinned_frames: usize,
    /// Current number of dirty frames.
    pub dirty_frames: usize,
}

impl BufferPoolStats {
    /// Returns the cache hit ratio (0.0 to 1.0).
    pub fn hit_ratio(&self) -> f64 {
        if self.fetches == 0 {
            0.0
        } else {
            self.hits as f64 / self.fetches as f64
        }
    }
}
