//! File-backed disk manager.
//!
//! Pages live in a single database file at offset
//! `page_id * PAGE_SIZE`. All I/O is synchronous; the buffer pool
//! serializes its own access, and the internal mutex makes the manager
//! safe to share beyond that.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::debug;

use strata_common::constants::PAGE_SIZE;
use strata_common::types::PageId;

use super::error::{IoError, IoResult};
use super::options::OpenOptions;
use super::DiskManager;

/// Disk manager backed by a single database file.
///
/// # Example
///
/// ```rust,no_run
/// use strata_common::constants::PAGE_SIZE;
/// use strata_common::types::PageId;
/// use strata_storage::disk::{DiskManager, FileDiskManager};
///
/// let disk = FileDiskManager::open("strata.db")?;
/// let mut buf = vec![0u8; PAGE_SIZE];
/// disk.read_page(PageId::new(0), &mut buf)?;
/// # Ok::<(), strata_storage::disk::IoError>(())
/// ```
pub struct FileDiskManager {
    /// The underlying file, wrapped in a mutex for thread-safe access.
    file: Mutex<File>,
    /// The file path.
    path: PathBuf,
    /// Whether the file was opened with write access.
    writable: bool,
}

impl FileDiskManager {
    /// Opens (creating if necessary) a database file with the default
    /// database options.
    pub fn open(path: impl AsRef<Path>) -> IoResult<Self> {
        Self::open_with(path, OpenOptions::for_database())
    }

    /// Opens a database file with the specified options.
    pub fn open_with(path: impl AsRef<Path>, options: OpenOptions) -> IoResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = Self::open_sync(&path, &options)?;
        debug!(path = %path.display(), "opened database file");
        Ok(Self {
            file: Mutex::new(file),
            path,
            writable: options.is_write(),
        })
    }

    fn open_sync(path: &Path, options: &OpenOptions) -> IoResult<File> {
        let mut std_opts = options.to_std_options();

        // Apply platform-specific flags
        #[cfg(target_os = "linux")]
        {
            use std::os::unix::fs::OpenOptionsExt;
            let mut flags = 0;
            if options.direct_io {
                flags |= libc::O_DIRECT;
            }
            if options.dsync {
                flags |= libc::O_DSYNC;
            }
            if flags != 0 {
                std_opts.custom_flags(flags);
            }
        }

        std_opts
            .open(path)
            .map_err(|e| IoError::from_io_with_path(e, path))
    }

    /// Returns the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the current file size in bytes.
    pub fn size(&self) -> IoResult<u64> {
        let file = self.file.lock();
        Ok(file.metadata()?.len())
    }

    fn offset_of(page_id: PageId) -> u64 {
        debug_assert!(page_id.is_valid());
        page_id.as_i32() as u64 * PAGE_SIZE as u64
    }
}

impl DiskManager for FileDiskManager {
    fn read_page(&self, page_id: PageId, buf: &mut [u8]) -> IoResult<()> {
        debug_assert_eq!(buf.len(), PAGE_SIZE);
        let offset = Self::offset_of(page_id);

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;

        let mut total = 0;
        while total < buf.len() {
            match file.read(&mut buf[total..]) {
                Ok(0) => break,
                Ok(n) => total += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        // The page may lie partly or wholly past the end of the file
        // when it was never flushed; the unwritten tail reads as zero.
        if total < buf.len() {
            debug!(%page_id, read = total, "short page read, zero-filling");
            buf[total..].fill(0);
        }

        Ok(())
    }

    fn write_page(&self, page_id: PageId, buf: &[u8]) -> IoResult<()> {
        debug_assert_eq!(buf.len(), PAGE_SIZE);
        if !self.writable {
            return Err(IoError::InvalidOperation {
                operation: "write_page",
                mode: "read-only",
            });
        }
        let offset = Self::offset_of(page_id);

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(buf)?;
        // Durable on return.
        file.sync_data()?;
        Ok(())
    }
}

impl std::fmt::Debug for FileDiskManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileDiskManager")
            .field("path", &self.path)
            .field("writable", &self.writable)
            .finish()
    }
}
