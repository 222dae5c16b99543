//! Synchronous page-granular disk I/O.
//!
//! The buffer pool talks to storage exclusively through the
//! [`DiskManager`] trait: read a page, write a page, both blocking and
//! page-sized. Two implementations are provided:
//!
//! - [`FileDiskManager`]: pages packed into a single database file at
//!   offset `page_id * PAGE_SIZE`
//! - [`MemoryDiskManager`]: a heap-backed map, for tests and ephemeral
//!   pools
//!
//! Writes are durable on return. A read past the end of the backing
//! store yields a zeroed page, since a page may be fetched before it
//! was ever flushed.

mod error;
mod file;
mod memory;
mod options;

pub use error::{IoError, IoResult};
pub use file::FileDiskManager;
pub use memory::MemoryDiskManager;
pub use options::OpenOptions;

use strata_common::types::PageId;

/// Capability interface for synchronous block I/O over page-sized
/// buffers.
///
/// Implementations are injected into the buffer pool at construction
/// and shared across threads; both methods take `&self` and must be
/// internally synchronized. `buf` is always exactly
/// [`PAGE_SIZE`](strata_common::constants::PAGE_SIZE) bytes and
/// `page_id` is always valid.
pub trait DiskManager: Send + Sync {
    /// Synchronously populates `buf` with the stored contents of
    /// `page_id`, zero-filling anything never written.
    fn read_page(&self, page_id: PageId, buf: &mut [u8]) -> IoResult<()>;

    /// Synchronously writes `buf` as the contents of `page_id`.
    /// Durable on return.
    fn write_page(&self, page_id: PageId, buf: &[u8]) -> IoResult<()>;
}
