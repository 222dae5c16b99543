//! LRU-K replacement policy.
//!
//! LRU-K considers the K-th most recent access time rather than just
//! the most recent access. This helps distinguish between frequently
//! accessed frames and frames that were touched a few times in a short
//! burst: a sequential scan cannot push hot pages out of the pool,
//! because scanned-once frames never accumulate K accesses.
//!
//! The replacer evicts the frame whose **backward k-distance** - the
//! logical time between now and its K-th most recent access - is
//! largest. Frames with fewer than K recorded accesses are treated as
//! having infinite distance and are evicted first, oldest first access
//! winning (classic LRU among cold frames).

use std::collections::{HashMap, VecDeque};

use strata_common::types::FrameId;

use crate::replacer::Replacer;

/// Access history for a single frame.
struct FrameRecord {
    /// Logical timestamps of the last up-to-K accesses, oldest first.
    history: VecDeque<u64>,
    /// Whether this frame may be evicted.
    evictable: bool,
}

impl FrameRecord {
    fn new(k: usize) -> Self {
        Self {
            history: VecDeque::with_capacity(k),
            evictable: false,
        }
    }

    /// Records an access, keeping only the K most recent timestamps.
    fn record(&mut self, now: u64, k: usize) {
        self.history.push_back(now);
        if self.history.len() > k {
            self.history.pop_front();
        }
    }

    fn has_k_accesses(&self, k: usize) -> bool {
        self.history.len() >= k
    }

    /// Oldest retained timestamp. For a frame with K accesses this is
    /// the K-th most recent access; for a colder frame it is the first
    /// access.
    fn oldest(&self) -> u64 {
        self.history.front().copied().unwrap_or(0)
    }
}

/// LRU-K replacer over buffer pool frames.
///
/// Parameterized by `k >= 1`. Time is a logical clock that advances on
/// each recorded access, so timestamps are unique and eviction order is
/// deterministic.
///
/// # Example
///
/// ```rust
/// use strata_cache::lru_k::LruKReplacer;
/// use strata_cache::replacer::Replacer;
/// use strata_common::types::FrameId;
///
/// let mut replacer = LruKReplacer::new(2);
/// replacer.record_access(FrameId::new(0));
/// replacer.set_evictable(FrameId::new(0), true);
/// assert_eq!(replacer.evict(), Some(FrameId::new(0)));
/// ```
pub struct LruKReplacer {
    /// K value for the algorithm.
    k: usize,
    /// Logical clock, advanced on each `record_access`.
    clock: u64,
    /// Per-frame access history and evictability.
    records: HashMap<FrameId, FrameRecord>,
    /// Number of records with `evictable == true`.
    evictable_count: usize,
}

impl LruKReplacer {
    /// Creates a new LRU-K replacer.
    pub fn new(k: usize) -> Self {
        Self {
            k: k.max(1),
            clock: 0,
            records: HashMap::new(),
            evictable_count: 0,
        }
    }

    /// Returns the configured K.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Returns true if the given frame currently has recorded history.
    pub fn contains(&self, frame_id: FrameId) -> bool {
        self.records.contains_key(&frame_id)
    }

    /// Ranks `a` above `b` when `a` should be evicted before `b`.
    fn evicts_before(&self, a: &FrameRecord, b: &FrameRecord) -> bool {
        match (a.has_k_accesses(self.k), b.has_k_accesses(self.k)) {
            // Infinite distance beats finite distance.
            (false, true) => true,
            (true, false) => false,
            // Both infinite: earliest first access wins. Both finite:
            // the larger backward k-distance is the older K-th access.
            _ => a.oldest() < b.oldest(),
        }
    }
}

impl Replacer for LruKReplacer {
    fn record_access(&mut self, frame_id: FrameId) {
        self.clock += 1;
        let now = self.clock;
        let k = self.k;
        self.records
            .entry(frame_id)
            .or_insert_with(|| FrameRecord::new(k))
            .record(now, k);
    }

    fn set_evictable(&mut self, frame_id: FrameId, evictable: bool) {
        if let Some(record) = self.records.get_mut(&frame_id) {
            if record.evictable != evictable {
                record.evictable = evictable;
                if evictable {
                    self.evictable_count += 1;
                } else {
                    self.evictable_count -= 1;
                }
            }
        }
    }

    fn evict(&mut self) -> Option<FrameId> {
        let mut victim: Option<(FrameId, &FrameRecord)> = None;
        for (&frame_id, record) in &self.records {
            if !record.evictable {
                continue;
            }
            match victim {
                Some((_, best)) if !self.evicts_before(record, best) => {}
                _ => victim = Some((frame_id, record)),
            }
        }

        let frame_id = victim.map(|(id, _)| id)?;
        self.records.remove(&frame_id);
        self.evictable_count -= 1;
        Some(frame_id)
    }

    fn remove(&mut self, frame_id: FrameId) {
        if let Some(record) = self.records.remove(&frame_id) {
            if record.evictable {
                self.evictable_count -= 1;
            }
        }
    }

    fn size(&self) -> usize {
        self.evictable_count
    }
}

impl std::fmt::Debug for LruKReplacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LruKReplacer")
            .field("k", &self.k)
            .field("tracked", &self.records.len())
            .field("evictable", &self.evictable_count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(id: usize) -> FrameId {
        FrameId::new(id)
    }

    #[test]
    fn test_evict_empty() {
        let mut replacer = LruKReplacer::new(2);
        assert_eq!(replacer.evict(), None);
        assert_eq!(replacer.size(), 0);
    }

    #[test]
    fn test_new_frames_are_not_evictable() {
        let mut replacer = LruKReplacer::new(2);
        replacer.record_access(frame(0));
        assert_eq!(replacer.size(), 0);
        assert_eq!(replacer.evict(), None);

        replacer.set_evictable(frame(0), true);
        assert_eq!(replacer.size(), 1);
        assert_eq!(replacer.evict(), Some(frame(0)));
    }

    #[test]
    fn test_cold_frames_evicted_fifo() {
        // All frames have a single access (< k), so eviction falls back
        // to earliest-first-access order.
        let mut replacer = LruKReplacer::new(2);
        for i in 0..3 {
            replacer.record_access(frame(i));
            replacer.set_evictable(frame(i), true);
        }

        assert_eq!(replacer.evict(), Some(frame(0)));
        assert_eq!(replacer.evict(), Some(frame(1)));
        assert_eq!(replacer.evict(), Some(frame(2)));
        assert_eq!(replacer.evict(), None);
    }

    #[test]
    fn test_infinite_distance_evicted_before_finite() {
        let mut replacer = LruKReplacer::new(2);

        // Frame 0 reaches k accesses; frame 1 stays cold.
        replacer.record_access(frame(0));
        replacer.record_access(frame(0));
        replacer.record_access(frame(1));
        replacer.set_evictable(frame(0), true);
        replacer.set_evictable(frame(1), true);

        // Frame 1 was accessed more recently, but its distance is
        // infinite, so it goes first.
        assert_eq!(replacer.evict(), Some(frame(1)));
        assert_eq!(replacer.evict(), Some(frame(0)));
    }

    #[test]
    fn test_largest_backward_k_distance_wins() {
        let mut replacer = LruKReplacer::new(2);

        // Access pattern (timestamps 1..=6):
        //   frame 0 at 1, 2, 5 -> retained history [2, 5]
        //   frame 1 at 3, 4, 6 -> retained history [4, 6]
        replacer.record_access(frame(0));
        replacer.record_access(frame(0));
        replacer.record_access(frame(1));
        replacer.record_access(frame(1));
        replacer.record_access(frame(0));
        replacer.record_access(frame(1));
        replacer.set_evictable(frame(0), true);
        replacer.set_evictable(frame(1), true);

        // Frame 0's k-th most recent access (2) is older than frame
        // 1's (4), so frame 0 has the larger backward k-distance.
        assert_eq!(replacer.evict(), Some(frame(0)));
        assert_eq!(replacer.evict(), Some(frame(1)));
    }

    #[test]
    fn test_set_evictable_excludes_frame() {
        let mut replacer = LruKReplacer::new(2);
        replacer.record_access(frame(0));
        replacer.record_access(frame(1));
        replacer.set_evictable(frame(0), true);
        replacer.set_evictable(frame(1), true);
        assert_eq!(replacer.size(), 2);

        replacer.set_evictable(frame(0), false);
        assert_eq!(replacer.size(), 1);
        assert_eq!(replacer.evict(), Some(frame(1)));
        assert_eq!(replacer.evict(), None);

        // Still tracked, just pinned.
        assert!(replacer.contains(frame(0)));
    }

    #[test]
    fn test_set_evictable_idempotent() {
        let mut replacer = LruKReplacer::new(2);
        replacer.record_access(frame(0));
        replacer.set_evictable(frame(0), true);
        replacer.set_evictable(frame(0), true);
        assert_eq!(replacer.size(), 1);
        replacer.set_evictable(frame(0), false);
        replacer.set_evictable(frame(0), false);
        assert_eq!(replacer.size(), 0);
    }

    #[test]
    fn test_set_evictable_unknown_frame_ignored() {
        let mut replacer = LruKReplacer::new(2);
        replacer.set_evictable(frame(9), true);
        assert_eq!(replacer.size(), 0);
        assert_eq!(replacer.evict(), None);
    }

    #[test]
    fn test_evict_erases_history() {
        let mut replacer = LruKReplacer::new(2);
        replacer.record_access(frame(0));
        replacer.record_access(frame(0));
        replacer.record_access(frame(1));
        replacer.set_evictable(frame(0), true);
        replacer.set_evictable(frame(1), true);

        assert_eq!(replacer.evict(), Some(frame(1)));
        assert!(!replacer.contains(frame(1)));

        // Re-recorded frame starts cold again (infinite distance),
        // so it is evicted before frame 0.
        replacer.record_access(frame(1));
        replacer.set_evictable(frame(1), true);
        assert_eq!(replacer.evict(), Some(frame(1)));
    }

    #[test]
    fn test_remove() {
        let mut replacer = LruKReplacer::new(2);
        replacer.record_access(frame(0));
        replacer.record_access(frame(1));
        replacer.set_evictable(frame(0), true);
        replacer.set_evictable(frame(1), true);

        replacer.remove(frame(0));
        assert_eq!(replacer.size(), 1);
        assert!(!replacer.contains(frame(0)));
        assert_eq!(replacer.evict(), Some(frame(1)));

        // Removing an unknown frame is a no-op.
        replacer.remove(frame(42));
        assert_eq!(replacer.size(), 0);
    }

    #[test]
    fn test_history_bounded_by_k() {
        let mut replacer = LruKReplacer::new(2);

        // Hammer frame 0, then touch frame 1 twice. Frame 0's k-th most
        // recent access is newer than frame 1's, so frame 1 goes first.
        for _ in 0..10 {
            replacer.record_access(frame(0));
        }
        replacer.record_access(frame(1));
        replacer.record_access(frame(1));
        replacer.record_access(frame(0));

        replacer.set_evictable(frame(0), true);
        replacer.set_evictable(frame(1), true);
        assert_eq!(replacer.evict(), Some(frame(1)));
    }

    #[test]
    fn test_k_equals_one_is_plain_lru() {
        let mut replacer = LruKReplacer::new(1);
        replacer.record_access(frame(0));
        replacer.record_access(frame(1));
        replacer.record_access(frame(0)); // frame 0 now most recent
        replacer.set_evictable(frame(0), true);
        replacer.set_evictable(frame(1), true);

        assert_eq!(replacer.evict(), Some(frame(1)));
        assert_eq!(replacer.evict(), Some(frame(0)));
    }
}
