//! Write-ahead log flush hook.

use crate::disk::IoResult;

/// Capability interface for forcing the write-ahead log to disk.
///
/// The buffer pool honors write-ahead ordering by invoking [`flush`]
/// immediately before any dirty page is written back (eviction,
/// explicit flush, or delete write-back). The collaborator is optional;
/// a pool without one simply skips the hook.
///
/// Log content, grouping, and recovery are out of this crate's scope.
///
/// [`flush`]: LogManager::flush
pub trait LogManager: Send + Sync {
    /// Flushes all buffered log records up to the current tail.
    /// Durable on return.
    fn flush(&self) -> IoResult<()>;
}
