//! # strata-common
//!
//! Common types and constants for StrataDB.
//!
//! This crate provides the foundational pieces shared by the storage
//! stack:
//!
//! - **Types**: identifier newtypes (`PageId`, `FrameId`)
//! - **Constants**: page geometry and buffer pool defaults
//!
//! ## Example
//!
//! ```rust
//! use strata_common::types::{FrameId, PageId};
//!
//! let page = PageId::new(42);
//! assert!(page.is_valid());
//! let frame = FrameId::new(0);
//! assert_eq!(frame.index(), 0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod constants;
pub mod types;

// Re-export commonly used items at the crate root
pub use constants::*;
pub use types::{FrameId, PageId};
