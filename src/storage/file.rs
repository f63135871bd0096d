//! Page File
//!
//! Thin wrapper over the table's single data file. All transfers are whole
//! pages at page-aligned offsets, issued as positional reads/writes so no
//! shared cursor is involved.

use std::fs::{File, OpenOptions};
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// The open data file of a table
#[derive(Debug)]
pub struct PageFile {
    /// Underlying file handle
    file: File,
    /// Where the file lives (for logging)
    path: PathBuf,
    /// Whether O_DIRECT was actually applied
    direct_io: bool,
}

impl PageFile {
    /// Create (or truncate) the data file for read/write access
    pub fn create(path: &Path, direct_io: bool) -> Result<Self> {
        let mut options = OpenOptions::new();
        options.read(true).write(true).create(true).truncate(true);
        let direct_io = Self::apply_direct_io(&mut options, direct_io);

        let file = options.open(path)?;

        Ok(Self {
            file,
            path: path.to_path_buf(),
            direct_io,
        })
    }

    /// Open an existing data file read-only (for offline inspection)
    pub fn open_read_only(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().read(true).open(path)?;

        Ok(Self {
            file,
            path: path.to_path_buf(),
            direct_io: false,
        })
    }

    #[cfg(target_os = "linux")]
    fn apply_direct_io(options: &mut OpenOptions, enabled: bool) -> bool {
        use std::os::unix::fs::OpenOptionsExt;
        if enabled {
            options.custom_flags(libc::O_DIRECT);
        }
        enabled
    }

    #[cfg(not(target_os = "linux"))]
    fn apply_direct_io(_options: &mut OpenOptions, enabled: bool) -> bool {
        if enabled {
            tracing::warn!("O_DIRECT is not supported on this platform, using buffered I/O");
        }
        false
    }

    /// Read up to `buf.len()` bytes at `offset`
    ///
    /// Returns the number of bytes read, which is short only at end of file.
    pub fn read_block(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.file.read_at(&mut buf[filled..], offset + filled as u64)?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        Ok(filled)
    }

    /// Write the whole of `buf` at `offset`
    pub fn write_block(&self, offset: u64, buf: &[u8]) -> Result<()> {
        self.file.write_all_at(buf, offset)?;
        Ok(())
    }

    /// fsync: flush data and metadata to stable storage
    pub fn sync(&self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    /// Set the file length to exactly `len` bytes
    pub fn truncate(&self, len: u64) -> Result<()> {
        self.file.set_len(len)?;
        Ok(())
    }

    /// Current on-disk length
    pub fn len(&self) -> Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_direct_io(&self) -> bool {
        self.direct_io
    }
}
