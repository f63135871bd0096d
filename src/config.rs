//! Configuration for heapfile
//!
//! Centralized configuration with sensible defaults. Geometry is validated
//! here, before any file is opened.

use std::path::PathBuf;

use crate::error::{HeapError, Result};
use crate::page::{PAGE_HEADER_SIZE, RID_PREFIX_SIZE};

/// Smallest supported page, also the direct I/O block size
pub const MIN_PAGE_SIZE: u32 = 512;

/// Main configuration for a table file
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // File Configuration
    // -------------------------------------------------------------------------
    /// Path of the single data file. Created (and truncated) on open.
    pub path: PathBuf,

    /// Open the file with O_DIRECT (Linux only; ignored elsewhere)
    pub direct_io: bool,

    // -------------------------------------------------------------------------
    // Geometry
    // -------------------------------------------------------------------------
    /// Page size in bytes. Power of two, at least 512.
    pub page_size: u32,

    /// Payload size of one record, excluding the 8-byte RID prefix
    pub record_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: PathBuf::from("test_db.bin"),
            direct_io: true,
            page_size: 4096,
            record_size: 8,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check the page/record geometry
    ///
    /// Rejects page sizes that are not a power of two or smaller than
    /// [`MIN_PAGE_SIZE`], and record sizes that leave no room for a single
    /// data slot.
    pub fn validate(&self) -> Result<()> {
        if self.page_size < MIN_PAGE_SIZE || !self.page_size.is_power_of_two() {
            return Err(HeapError::InvalidConfig(format!(
                "bad page size {}: must be a power of two >= {}",
                self.page_size, MIN_PAGE_SIZE
            )));
        }

        if self.record_size == 0 {
            return Err(HeapError::InvalidConfig(
                "record size must be at least 1 byte".to_string(),
            ));
        }

        let usable = (self.page_size as usize) - PAGE_HEADER_SIZE;
        let slot = self.record_size as usize + RID_PREFIX_SIZE;
        if slot > usable {
            return Err(HeapError::InvalidConfig(format!(
                "record size {} does not fit a {}-byte page ({} usable bytes per slot)",
                self.record_size,
                self.page_size,
                usable - RID_PREFIX_SIZE
            )));
        }

        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data file path
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.path = path.into();
        self
    }

    /// Set the page size (in bytes)
    pub fn page_size(mut self, size: u32) -> Self {
        self.config.page_size = size;
        self
    }

    /// Set the record payload size (in bytes)
    pub fn record_size(mut self, size: u32) -> Self {
        self.config.record_size = size;
        self
    }

    /// Enable or disable O_DIRECT
    pub fn direct_io(mut self, enabled: bool) -> Self {
        self.config.direct_io = enabled;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
