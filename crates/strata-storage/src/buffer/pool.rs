//! Buffer pool implementation.
//!
//! The pool owns a fixed array of frames, the page table mapping
//! resident page ids to frames, the replacement policy, and the free
//! list. A single coarse mutex (the pool latch) serializes every public
//! operation, disk I/O included; this is a deliberate simplicity
//! trade-off, and overlapped I/O is out of scope.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use strata_cache::extendible::ExtendibleHashTable;
use strata_cache::lru_k::LruKReplacer;
use strata_cache::replacer::Replacer;
use strata_common::types::{FrameId, PageId};

use super::config::BufferPoolConfig;
use super::error::{BufferError, BufferResult};
use super::frame::BufferFrame;
use super::handle::PageHandle;
use super::BufferPoolStats;
use crate::disk::DiskManager;
use crate::wal::LogManager;

/// State guarded by the pool latch.
struct PoolCore {
    /// Maps resident page ids to the frames holding them.
    page_table: ExtendibleHashTable<PageId, FrameId>,
    /// Eviction policy over frame ids.
    replacer: Box<dyn Replacer>,
    /// Frames never present in the page table.
    free_list: VecDeque<FrameId>,
    /// Next page id to allocate. Ids are never reused.
    next_page_id: PageId,
}

/// The buffer pool mediates all page access between database clients
/// and persistent storage.
///
/// `new_page` and `fetch_page` lend out pinned [`PageHandle`]s; every
/// handle must eventually be released with [`unpin_page`], which is
/// also where modifications are declared. The pool writes dirty pages
/// back on eviction, explicit flush, and delete.
///
/// [`unpin_page`]: BufferPool::unpin_page
pub struct BufferPool {
    config: BufferPoolConfig,
    /// Frame array, created once and shared with handles.
    frames: Vec<Arc<BufferFrame>>,
    /// Injected disk collaborator.
    disk: Arc<dyn DiskManager>,
    /// Optional write-ahead log flush hook.
    log_manager: Option<Arc<dyn LogManager>>,
    /// The pool latch.
    core: Mutex<PoolCore>,
    // Counters for statistics.
    fetch_count: AtomicU64,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
    eviction_count: AtomicU64,
    flush_count: AtomicU64,
}

impl BufferPool {
    /// Creates a new buffer pool over the given disk manager.
    pub fn new(config: BufferPoolConfig, disk: Arc<dyn DiskManager>) -> BufferResult<Self> {
        Self::with_log_manager(config, disk, None)
    }

    /// Creates a new buffer pool with an optional write-ahead log
    /// flush hook, invoked before any dirty page is written back.
    pub fn with_log_manager(
        config: BufferPoolConfig,
        disk: Arc<dyn DiskManager>,
        log_manager: Option<Arc<dyn LogManager>>,
    ) -> BufferResult<Self> {
        config.validate().map_err(BufferError::config)?;

        let frames: Vec<Arc<BufferFrame>> = (0..config.pool_size)
            .map(|i| Arc::new(BufferFrame::new(FrameId::new(i))))
            .collect();

        // Initially, every frame is in the free list.
        let core = PoolCore {
            page_table: ExtendibleHashTable::new(config.bucket_size),
            replacer: Box::new(LruKReplacer::new(config.replacer_k)),
            free_list: (0..config.pool_size).map(FrameId::new).collect(),
            next_page_id: PageId::FIRST,
        };

        Ok(Self {
            config,
            frames,
            disk,
            log_manager,
            core: Mutex::new(core),
            fetch_count: AtomicU64::new(0),
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
            eviction_count: AtomicU64::new(0),
            flush_count: AtomicU64::new(0),
        })
    }

    /// Allocates a fresh page and returns a pinned handle to its frame.
    ///
    /// The new page is zero-filled and never read from disk. Fails with
    /// [`BufferError::PoolExhausted`] when the free list is empty and
    /// every resident page is pinned; no page id is consumed in that
    /// case.
    pub fn new_page(&self) -> BufferResult<PageHandle> {
        let mut core = self.core.lock();

        let Some(frame_id) = self.acquire_frame(&mut core)? else {
            return Err(BufferError::PoolExhausted);
        };

        let page_id = core.next_page_id;
        core.next_page_id = page_id.next();

        let frame = &self.frames[frame_id.index()];
        frame.reset();
        frame.set_page_id(page_id);
        frame.pin();
        core.page_table.insert(page_id, frame_id);
        core.replacer.record_access(frame_id);
        core.replacer.set_evictable(frame_id, false);

        Ok(PageHandle::new(Arc::clone(frame)))
    }

    /// Fetches the given page, reading it from disk on a miss, and
    /// returns a pinned handle.
    ///
    /// Fails with [`BufferError::PoolExhausted`] when the page is not
    /// resident and no frame can be freed, and with
    /// [`BufferError::Disk`] when the read fails; a failed read leaves
    /// the page uninstalled and returns the frame to the free list.
    pub fn fetch_page(&self, page_id: PageId) -> BufferResult<PageHandle> {
        debug_assert!(page_id.is_valid());
        let mut core = self.core.lock();
        self.fetch_count.fetch_add(1, Ordering::Relaxed);

        if let Some(frame_id) = core.page_table.find(&page_id) {
            self.hit_count.fetch_add(1, Ordering::Relaxed);
            let frame = &self.frames[frame_id.index()];
            frame.pin();
            core.replacer.record_access(frame_id);
            core.replacer.set_evictable(frame_id, false);
            return Ok(PageHandle::new(Arc::clone(frame)));
        }

        self.miss_count.fetch_add(1, Ordering::Relaxed);
        let Some(frame_id) = self.acquire_frame(&mut core)? else {
            return Err(BufferError::PoolExhausted);
        };

        let frame = &self.frames[frame_id.index()];
        frame.reset();
        if let Err(e) = self.disk.read_page(page_id, &mut frame.write_data()[..]) {
            core.free_list.push_back(frame_id);
            return Err(e.into());
        }

        frame.set_page_id(page_id);
        frame.pin();
        core.page_table.insert(page_id, frame_id);
        core.replacer.record_access(frame_id);
        core.replacer.set_evictable(frame_id, false);

        Ok(PageHandle::new(Arc::clone(frame)))
    }

    /// Releases one pin on the given page, ORing `is_dirty` into its
    /// dirty flag.
    ///
    /// Returns false if the page is not resident or its pin count is
    /// already zero. When the last pin is released the frame becomes a
    /// candidate for eviction.
    pub fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> bool {
        let mut core = self.core.lock();

        let Some(frame_id) = core.page_table.find(&page_id) else {
            return false;
        };
        let frame = &self.frames[frame_id.index()];
        if frame.pin_count() == 0 {
            return false;
        }

        if is_dirty {
            frame.set_dirty(true);
        }
        if frame.unpin() == 0 {
            core.replacer.set_evictable(frame_id, true);
        }
        true
    }

    /// Writes the given page to disk, dirty or not, and clears its
    /// dirty flag.
    ///
    /// Returns `Ok(false)` if the page is not resident.
    ///
    /// # Panics
    ///
    /// Panics if called with [`PageId::INVALID`]; that is a programmer
    /// error, not a recoverable condition.
    pub fn flush_page(&self, page_id: PageId) -> BufferResult<bool> {
        assert!(page_id.is_valid(), "flush_page: invalid page id");
        let core = self.core.lock();

        let Some(frame_id) = core.page_table.find(&page_id) else {
            return Ok(false);
        };
        let frame = &self.frames[frame_id.index()];
        self.write_back(frame)?;
        frame.set_dirty(false);
        self.flush_count.fetch_add(1, Ordering::Relaxed);
        Ok(true)
    }

    /// Flushes every resident page, pinned or not.
    ///
    /// Pages pinned by other threads are flushed as-is; the bytes
    /// written are whatever the frame holds at the moment of the call.
    pub fn flush_all(&self) -> BufferResult<()> {
        let _latch = self.core.lock();

        for frame in &self.frames {
            let page_id = frame.page_id();
            if !page_id.is_valid() {
                continue;
            }
            if frame.is_pinned() {
                warn!(%page_id, "flushing page that is still pinned");
            }
            self.write_back(frame)?;
            frame.set_dirty(false);
            self.flush_count.fetch_add(1, Ordering::Relaxed);
        }
        Ok(())
    }

    /// Drops the given page from the pool, returning its frame to the
    /// free list.
    ///
    /// Returns `Ok(true)` if the page is not resident (vacuously
    /// deleted) and `Ok(false)` if it is still pinned. A dirty page is
    /// written back before its frame is recycled.
    pub fn delete_page(&self, page_id: PageId) -> BufferResult<bool> {
        let mut core = self.core.lock();

        let Some(frame_id) = core.page_table.find(&page_id) else {
            self.deallocate_page(page_id);
            return Ok(true);
        };
        let frame = &self.frames[frame_id.index()];
        if frame.pin_count() > 0 {
            return Ok(false);
        }

        if frame.is_dirty() {
            self.write_back(frame)?;
            self.flush_count.fetch_add(1, Ordering::Relaxed);
        }

        core.page_table.remove(&page_id);
        core.replacer.remove(frame_id);
        core.free_list.push_back(frame_id);
        frame.reset();
        self.deallocate_page(page_id);
        Ok(true)
    }

    /// Returns true if the given page is resident.
    pub fn contains(&self, page_id: PageId) -> bool {
        self.core.lock().page_table.find(&page_id).is_some()
    }

    /// Returns the number of frames in the pool.
    pub fn pool_size(&self) -> usize {
        self.config.pool_size
    }

    /// Returns statistics about the buffer pool.
    pub fn stats(&self) -> BufferPoolStats {
        let mut pinned = 0;
        let mut dirty = 0;
        for frame in &self.frames {
            if frame.is_pinned() {
                pinned += 1;
            }
            if frame.is_dirty() {
                dirty += 1;
            }
        }

        BufferPoolStats {
            fetches: self.fetch_count.load(Ordering::Relaxed),
            hits: self.hit_count.load(Ordering::Relaxed),
            misses: self.miss_count.load(Ordering::Relaxed),
            evictions: self.eviction_count.load(Ordering::Relaxed),
            flushes: self.flush_count.load(Ordering::Relaxed),
            pinned_frames: pinned,
            dirty_frames: dirty,
        }
    }

    // -------------------------------------------------------------------------
    // Private helpers
    // -------------------------------------------------------------------------

    /// Secures an unused frame: the free list first, then an eviction.
    ///
    /// An evicted dirty page is written back before its frame is
    /// handed out, and its page-table entry is dropped. Returns
    /// `Ok(None)` when every frame is pinned. The caller is
    /// responsible for resetting the returned frame.
    fn acquire_frame(&self, core: &mut PoolCore) -> BufferResult<Option<FrameId>> {
        if let Some(frame_id) = core.free_list.pop_front() {
            return Ok(Some(frame_id));
        }

        let Some(frame_id) = core.replacer.evict() else {
            return Ok(None);
        };
        let frame = &self.frames[frame_id.index()];
        let old_page_id = frame.page_id();

        if frame.is_dirty() {
            if let Err(e) = self.write_back(frame) {
                // The page stays resident; re-register the frame so a
                // later eviction can retry it.
                core.replacer.record_access(frame_id);
                core.replacer.set_evictable(frame_id, true);
                return Err(e);
            }
            self.flush_count.fetch_add(1, Ordering::Relaxed);
        }

        if old_page_id.is_valid() {
            core.page_table.remove(&old_page_id);
        }
        self.eviction_count.fetch_add(1, Ordering::Relaxed);
        debug!(page_id = %old_page_id, frame_id = %frame_id, "evicted page");
        Ok(Some(frame_id))
    }

    /// Writes a frame's page to disk, flushing the write-ahead log
    /// first when a log manager is present.
    fn write_back(&self, frame: &BufferFrame) -> BufferResult<()> {
        if let Some(log_manager) = &self.log_manager {
            log_manager.flush()?;
        }
        self.disk.write_page(frame.page_id(), &frame.read_data()[..])?;
        Ok(())
    }

    /// Returns a page id to the id space.
    ///
    /// Ids are allocated monotonically and never reused, so this is
    /// currently a no-op.
    fn deallocate_page(&self, _page_id: PageId) {}
}

impl std::fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferPool")
            .field("pool_size", &self.config.pool_size)
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::MemoryDiskManager;

    fn create_pool(pool_size: usize) -> (BufferPool, Arc<MemoryDiskManager>) {
        let disk = Arc::new(MemoryDiskManager::new());
        let config = BufferPoolConfig::new(pool_size)
            .with_replacer_k(2)
            .with_bucket_size(2);
        let pool = BufferPool::new(config, Arc::clone(&disk) as Arc<dyn DiskManager>).unwrap();
        (pool, disk)
    }

    #[test]
    fn test_invalid_config_rejected() {
        let disk = Arc::new(MemoryDiskManager::new());
        let result = BufferPool::new(BufferPoolConfig::new(0), disk);
        assert!(matches!(result, Err(BufferError::Config { .. })));
    }

    #[test]
    fn test_new_page_allocates_monotonic_ids() {
        let (pool, _disk) = create_pool(3);

        let p0 = pool.new_page().unwrap();
        let p1 = pool.new_page().unwrap();
        let p2 = pool.new_page().unwrap();
        assert_eq!(p0.page_id(), PageId::new(0));
        assert_eq!(p1.page_id(), PageId::new(1));
        assert_eq!(p2.page_id(), PageId::new(2));
    }

    #[test]
    fn test_new_page_exhaustion_returns_error_without_consuming_id() {
        let (pool, _disk) = create_pool(3);

        for _ in 0..3 {
            pool.new_page().unwrap();
        }
        // All frames pinned.
        assert!(matches!(pool.new_page(), Err(BufferError::PoolExhausted)));

        // The failed call must not have burned a page id.
        pool.unpin_page(PageId::new(0), false);
        let next = pool.new_page().unwrap();
        assert_eq!(next.page_id(), PageId::new(3));
    }

    #[test]
    fn test_eviction_prefers_earliest_cold_frame() {
        let (pool, _disk) = create_pool(3);

        for _ in 0..3 {
            pool.new_page().unwrap();
        }
        pool.unpin_page(PageId::new(0), false);
        pool.unpin_page(PageId::new(1), true);

        // Pages 0 and 1 each have a single recorded access, so the
        // earliest first access (page 0) is the victim.
        let p3 = pool.new_page().unwrap();
        assert_eq!(p3.page_id(), PageId::new(3));
        assert!(!pool.contains(PageId::new(0)));
        assert!(pool.contains(PageId::new(1)));
    }

    #[test]
    fn test_clean_eviction_skips_disk_write() {
        let (pool, disk) = create_pool(1);

        let p0 = pool.new_page().unwrap();
        let id0 = p0.page_id();
        pool.unpin_page(id0, false);

        pool.new_page().unwrap();
        assert!(!pool.contains(id0));
        // Page 0 was clean, so nothing reached the disk.
        assert!(!disk.contains(id0));
    }

    #[test]
    fn test_dirty_eviction_writes_back() {
        let (pool, disk) = create_pool(1);

        let mut p0 = pool.new_page().unwrap();
        let id0 = p0.page_id();
        p0.data_mut()[0..4].copy_from_slice(&[1, 2, 3, 4]);
        pool.unpin_page(id0, true);

        // Evict page 0 by pressure.
        pool.new_page().unwrap();
        assert!(!pool.contains(id0));
        assert!(disk.contains(id0));

        // And it comes back intact once the pool has room again.
        pool.unpin_page(PageId::new(1), false);
        let fetched = pool.fetch_page(id0).unwrap();
        assert_eq!(&fetched.data()[0..4], &[1, 2, 3, 4]);
    }

    #[test]
    fn test_fetch_hit_returns_same_frame_and_stacks_pins() {
        let (pool, _disk) = create_pool(3);

        let p0 = pool.new_page().unwrap();
        let id0 = p0.page_id();
        assert_eq!(p0.pin_count(), 1);

        let again = pool.fetch_page(id0).unwrap();
        assert_eq!(again.frame_id(), p0.frame_id());
        assert_eq!(again.pin_count(), 2);

        let stats = pool.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 0);
    }

    #[test]
    fn test_fetch_unknown_page_with_all_pinned_fails() {
        let (pool, _disk) = create_pool(1);

        let _p0 = pool.new_page().unwrap();
        assert!(matches!(
            pool.fetch_page(PageId::new(99)),
            Err(BufferError::PoolExhausted)
        ));
    }

    #[test]
    fn test_unpin_semantics() {
        let (pool, _disk) = create_pool(3);

        let p0 = pool.new_page().unwrap();
        let id0 = p0.page_id();

        // Unknown page.
        assert!(!pool.unpin_page(PageId::new(42), false));
        // First unpin succeeds, second has nothing to release.
        assert!(pool.unpin_page(id0, false));
        assert!(!pool.unpin_page(id0, false));
    }

    #[test]
    fn test_dirty_flag_is_sticky_across_unpins() {
        let (pool, disk) = create_pool(1);

        let mut p0 = pool.new_page().unwrap();
        let id0 = p0.page_id();
        p0.data_mut()[0] = 0xaa;
        pool.unpin_page(id0, true);

        // A later clean unpin must not wash out the dirty bit.
        pool.fetch_page(id0).unwrap();
        pool.unpin_page(id0, false);

        pool.new_page().unwrap();
        assert!(disk.contains(id0));
    }

    #[test]
    fn test_flush_page_clears_dirty_and_writes_unconditionally() {
        let (pool, disk) = create_pool(3);

        let p0 = pool.new_page().unwrap();
        let id0 = p0.page_id();
        pool.unpin_page(id0, true);

        assert!(pool.flush_page(id0).unwrap());
        assert!(disk.contains(id0));
        assert_eq!(pool.stats().dirty_frames, 0);

        // Not dirty anymore, but flush still writes.
        assert!(pool.flush_page(id0).unwrap());
        // Unknown page flushes report false.
        assert!(!pool.flush_page(PageId::new(42)).unwrap());
    }

    #[test]
    #[should_panic(expected = "invalid page id")]
    fn test_flush_invalid_page_id_panics() {
        let (pool, _disk) = create_pool(1);
        let _ = pool.flush_page(PageId::INVALID);
    }

    #[test]
    fn test_flush_all() {
        let (pool, disk) = create_pool(3);

        for _ in 0..3 {
            let p = pool.new_page().unwrap();
            let id = p.page_id();
            pool.unpin_page(id, true);
        }

        pool.flush_all().unwrap();
        assert_eq!(disk.page_count(), 3);
        assert_eq!(pool.stats().dirty_frames, 0);
    }

    #[test]
    fn test_delete_page_semantics() {
        let (pool, _disk) = create_pool(3);

        // Never-allocated page: vacuously deleted.
        assert!(pool.delete_page(PageId::new(42)).unwrap());

        let p0 = pool.new_page().unwrap();
        let id0 = p0.page_id();
        pool.fetch_page(id0).unwrap(); // pin count 2

        assert!(!pool.delete_page(id0).unwrap());
        pool.unpin_page(id0, false);
        assert!(!pool.delete_page(id0).unwrap());
        pool.unpin_page(id0, false);

        assert!(pool.delete_page(id0).unwrap());
        assert!(!pool.contains(id0));

        // The frame is reusable immediately.
        pool.new_page().unwrap();
    }

    #[test]
    fn test_delete_dirty_page_writes_back() {
        let (pool, disk) = create_pool(3);

        let p0 = pool.new_page().unwrap();
        let id0 = p0.page_id();
        pool.unpin_page(id0, true);

        assert!(pool.delete_page(id0).unwrap());
        assert!(disk.contains(id0));
    }

    #[test]
    fn test_deleted_page_id_is_not_reused() {
        let (pool, _disk) = create_pool(3);

        let p0 = pool.new_page().unwrap();
        let id0 = p0.page_id();
        pool.unpin_page(id0, false);
        pool.delete_page(id0).unwrap();

        let p1 = pool.new_page().unwrap();
        assert_eq!(p1.page_id(), PageId::new(1));
    }

    #[test]
    fn test_pinned_frames_never_evicted() {
        let (pool, _disk) = create_pool(3);

        let p0 = pool.new_page().unwrap();
        let p1 = pool.new_page().unwrap();
        let p2 = pool.new_page().unwrap();
        let keep = p1.page_id();
        pool.unpin_page(p0.page_id(), false);
        pool.unpin_page(p2.page_id(), false);

        // Two evictions are possible; the pinned page must survive both.
        pool.new_page().unwrap();
        pool.new_page().unwrap();
        assert!(pool.contains(keep));
        assert!(matches!(pool.new_page(), Err(BufferError::PoolExhausted)));
    }

    #[test]
    fn test_stats_counts() {
        let (pool, _disk) = create_pool(2);

        let p0 = pool.new_page().unwrap();
        let id0 = p0.page_id();
        pool.fetch_page(id0).unwrap();

        let stats = pool.stats();
        assert_eq!(stats.fetches, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.pinned_frames, 1);
    }
}
