//! Replacement policies and page-table structures for StrataDB.
//!
//! This crate provides the associative machinery the buffer pool is
//! built on:
//!
//! - **Replacer**: the capability trait the pool uses to pick eviction
//!   victims
//! - **LRU-K Replacer**: backward k-distance eviction over frame ids
//! - **Extendible Hash Table**: dynamically growing directory/bucket
//!   map used as the pool's page table
//!
//! # Example
//!
//! ```rust
//! use strata_cache::extendible::ExtendibleHashTable;
//!
//! let table = ExtendibleHashTable::new(4);
//! table.insert(1, "one");
//! assert_eq!(table.find(&1), Some("one"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod extendible;
pub mod lru_k;
pub mod replacer;

pub use extendible::ExtendibleHashTable;
pub use lru_k::LruKReplacer;
pub use replacer::Replacer;
