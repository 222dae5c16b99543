//! In-memory disk manager.
//!
//! Stores pages in a heap-backed map instead of a file. Used by unit
//! tests and ephemeral pools; the `DiskManager` contract (including
//! zero-filled reads of never-written pages) is identical to the
//! file-backed implementation.

use std::collections::HashMap;

use parking_lot::Mutex;

use strata_common::constants::PAGE_SIZE;
use strata_common::types::PageId;

use super::error::IoResult;
use super::DiskManager;

/// Disk manager keeping all pages in memory.
#[derive(Default)]
pub struct MemoryDiskManager {
    pages: Mutex<HashMap<PageId, Box<[u8]>>>,
}

impl MemoryDiskManager {
    /// Creates an empty in-memory disk.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of pages ever written.
    pub fn page_count(&self) -> usize {
        self.pages.lock().len()
    }

    /// Returns true if the given page was ever written.
    pub fn contains(&self, page_id: PageId) -> bool {
        self.pages.lock().contains_key(&page_id)
    }
}

impl DiskManager for MemoryDiskManager {
    fn read_page(&self, page_id: PageId, buf: &mut [u8]) -> IoResult<()> {
        debug_assert_eq!(buf.len(), PAGE_SIZE);
        match self.pages.lock().get(&page_id) {
            Some(page) => buf.copy_from_slice(page),
            None => buf.fill(0),
        }
        Ok(())
    }

    fn write_page(&self, page_id: PageId, buf: &[u8]) -> IoResult<()> {
        debug_assert_eq!(buf.len(), PAGE_SIZE);
        self.pages.lock().insert(page_id, buf.into());
        Ok(())
    }
}

impl std::fmt::Debug for MemoryDiskManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryDiskManager")
            .field("pages", &self.page_count())
            .finish()
    }
}
