//! System-wide constants for StrataDB.

// =============================================================================
// Page Geometry
// =============================================================================

/// Page size in bytes (4 KB).
///
/// Fixed at build time. Every frame in the buffer pool holds exactly one
/// page of this size, and disk offsets are multiples of it.
pub const PAGE_SIZE: usize = 4 * 1024;

// =============================================================================
// Buffer Pool Defaults
// =============================================================================

/// Default number of frames in the buffer pool.
pub const DEFAULT_POOL_SIZE: usize = 128;

/// Default `k` for the LRU-K replacement policy (LRU-2).
pub const DEFAULT_REPLACER_K: usize = 2;

// =============================================================================
// Page Table Defaults
// =============================================================================

/// Default number of entries per extendible hash table bucket.
pub const DEFAULT_BUCKET_SIZE: usize = 8;

/// Maximum local depth of a hash table bucket.
///
/// A full bucket whose local depth has reached this limit stops
/// splitting and accepts overflow entries instead, so inserts terminate
/// even when more than `bucket_size` keys share a full hash value.
pub const MAX_LOCAL_DEPTH: usize = 24;
