//! Core types for StrataDB.

mod ids;

pub use ids::{FrameId, PageId};
