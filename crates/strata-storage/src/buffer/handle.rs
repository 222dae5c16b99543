//! Page handles lent to buffer pool callers.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use strata_common::types::{FrameId, PageId};

use super::frame::BufferFrame;

/// A borrowed reference to a pinned page in the buffer pool.
///
/// Handles are returned by `new_page` and `fetch_page` with the frame
/// already pinned; the pin acts as a manual reference count, and the
/// pool guarantees the backing frame is not reused while it is held.
///
/// A handle does **not** unpin on drop. The caller must eventually call
/// `unpin_page(page_id, is_dirty)` - that call is also where
/// modifications are declared, so writing through [`data_mut`] alone
/// does not mark the page dirty. A handle whose unpin is forgotten
/// wedges the frame for the lifetime of the pool.
///
/// [`data_mut`]: PageHandle::data_mut
pub struct PageHandle {
    frame: Arc<BufferFrame>,
}

impl PageHandle {
    pub(crate) fn new(frame: Arc<BufferFrame>) -> Self {
        Self { frame }
    }

    /// Returns the page ID.
    #[inline]
    pub fn page_id(&self) -> PageId {
        self.frame.page_id()
    }

    /// Returns the ID of the frame holding the page.
    #[inline]
    pub fn frame_id(&self) -> FrameId {
        self.frame.frame_id()
    }

    /// Returns the frame's current pin count.
    #[inline]
    pub fn pin_count(&self) -> u32 {
        self.frame.pin_count()
    }

    /// Returns a read lock over the page bytes.
    #[inline]
    pub fn data(&self) -> impl Deref<Target = [u8]> + '_ {
        PageDataRef {
            guard: self.frame.read_data(),
        }
    }

    /// Returns a write lock over the page bytes.
    ///
    /// Remember to pass `is_dirty = true` to the matching `unpin_page`.
    #[inline]
    pub fn data_mut(&mut self) -> impl DerefMut<Target = [u8]> + '_ {
        PageDataMut {
            guard: self.frame.write_data(),
        }
    }
}

impl std::fmt::Debug for PageHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageHandle")
            .field("page_id", &self.page_id())
            .field("frame_id", &self.frame_id())
            .field("pin_count", &self.pin_count())
            .finish()
    }
}

/// Helper struct to provide Deref for page data.
struct PageDataRef<'a> {
    guard: parking_lot::RwLockReadGuard<'a, Box<[u8]>>,
}

impl Deref for PageDataRef<'_> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

/// Helper struct to provide DerefMut for page data.
struct PageDataMut<'a> {
    guard: parking_lot::RwLockWriteGuard<'a, Box<[u8]>>,
}

impl Deref for PageDataMut<'_> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

impl DerefMut for PageDataMut<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.guard
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_exposes_metadata() {
        let frame = Arc::new(BufferFrame::new(FrameId::new(3)));
        frame.set_page_id(PageId::new(42));
        frame.pin();

        let handle = PageHandle::new(Arc::clone(&frame));
        assert_eq!(handle.page_id(), PageId::new(42));
        assert_eq!(handle.frame_id(), FrameId::new(3));
        assert_eq!(handle.pin_count(), 1);
    }

    #[test]
    fn test_drop_does_not_unpin() {
        let frame = Arc::new(BufferFrame::new(FrameId::new(0)));
        frame.set_page_id(PageId::new(1));
        frame.pin();

        {
            let _handle = PageHandle::new(Arc::clone(&frame));
        }

        // The pin survives the handle; only unpin_page releases it.
        assert_eq!(frame.pin_count(), 1);
    }

    #[test]
    fn test_data_roundtrip_through_handle() {
        let frame = Arc::new(BufferFrame::new(FrameId::new(0)));
        frame.set_page_id(PageId::new(1));
        frame.pin();

        let mut handle = PageHandle::new(Arc::clone(&frame));
        handle.data_mut()[0..4].copy_from_slice(&[9, 8, 7, 6]);
        assert_eq!(&handle.data()[0..4], &[9, 8, 7, 6]);

        // Writing through the handle does not set the dirty flag.
        assert!(!frame.is_dirty());
    }
}
