//! Replacement policy capability trait.

use strata_common::types::FrameId;

/// A replacement policy over buffer pool frame ids.
///
/// The buffer pool depends only on this surface, so LRU-K can be
/// swapped for plain LRU or clock without touching the pool logic. All
/// methods are invoked with the pool latch held, so implementations do
/// not need to synchronize themselves.
pub trait Replacer: Send {
    /// Records that the given frame was accessed now.
    ///
    /// Creates a fresh, non-evictable history entry if the frame has
    /// not been seen before.
    fn record_access(&mut self, frame_id: FrameId);

    /// Toggles whether a frame is a candidate for eviction.
    ///
    /// No access is recorded. Ignored for frames with no recorded
    /// history.
    fn set_evictable(&mut self, frame_id: FrameId, evictable: bool);

    /// Picks a victim among the evictable frames, removing its history.
    ///
    /// Returns `None` if no frame is evictable.
    fn evict(&mut self) -> Option<FrameId>;

    /// Erases a frame's history and evictability outright.
    ///
    /// Used when the pool discards a page explicitly rather than
    /// through policy-driven eviction.
    fn remove(&mut self, frame_id: FrameId);

    /// Returns the number of evictable frames.
    fn size(&self) -> usize;
}
