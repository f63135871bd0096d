//! Table Module
//!
//! The heap-file handle: owns the data file, the resident directory tail,
//! the resident data tail and a one-entry read cache.
//!
//! ## Responsibilities
//! - Append-only insert with data/directory page rollover
//! - Point reads through tail → cache → disk
//! - Swap-delete with tail reclamation and file truncation (see `reclaim`)
//! - Explicit durability: fsync after every rollover and every delete
//!
//! ## Resident Pages
//! ```text
//!   dir_tail ──────► last directory page (appends go here)
//!   data_tail ─────► last data page      (appends go here)
//!   read_cache ────► most recently loaded non-tail data page
//! ```
//! Every other page lives only on disk.

mod addressing;
mod reclaim;
mod scan;

use std::path::Path;

use tracing::{debug, info, trace};

use crate::config::Config;
use crate::error::{HeapError, Result};
use crate::page::{
    DirectoryEntry, Page, PageKind, DIRECTORY_ENTRY_SIZE, PAGE_HEADER_SIZE, RID_PREFIX_SIZE,
    ROOT_DIRECTORY_OFFSET,
};
use crate::rid::Rid;
use crate::storage::PageFile;

pub use addressing::PageLayout;
pub use scan::Scan;

/// Which resident slot holds a located page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resident {
    DataTail,
    ReadCache,
}

/// An open heap file
///
/// Single-threaded: every operation takes `&mut self`, and only one table
/// may be open against a file at a time.
pub struct Table {
    /// Table configuration
    config: Config,

    /// Ordinal/offset mapping shared by the allocator and the decoder
    layout: PageLayout,

    /// The data file
    file: PageFile,

    /// Last directory page (never absent: the root is the first tail)
    dir_tail: Page,

    /// Last data page, `None` while the table is empty
    data_tail: Option<Page>,

    /// Most recently loaded non-tail data page
    read_cache: Option<Page>,

    /// Append position == logical file length
    file_offset: u32,
}

impl Table {
    /// Create a new table file, truncating any existing one
    ///
    /// Geometry is validated before the file is touched. The root directory
    /// page is written at offset 0.
    pub fn create(config: Config) -> Result<Self> {
        config.validate()?;

        let layout = PageLayout::new(config.page_size);
        let file = PageFile::create(&config.path, config.direct_io)?;

        let mut root = Page::create(
            PageKind::Directory,
            ROOT_DIRECTORY_OFFSET,
            config.page_size,
            DIRECTORY_ENTRY_SIZE as u32,
        )?;
        root.persist(&file)?;
        file.sync()?;

        info!(
            path = %config.path.display(),
            page_size = config.page_size,
            record_size = config.record_size,
            direct_io = file.is_direct_io(),
            "created table"
        );

        Ok(Self {
            file_offset: config.page_size,
            config,
            layout,
            file,
            dir_tail: root,
            data_tail: None,
            read_cache: None,
        })
    }

    /// Create with a path and record size (convenience method)
    ///
    /// Uses the default config otherwise.
    pub fn create_path(path: &Path, record_size: u32) -> Result<Self> {
        let config = Config::builder()
            .path(path)
            .record_size(record_size)
            .build();
        Self::create(config)
    }

    // =========================================================================
    // Insert
    // =========================================================================

    /// Append a record and return its RID
    ///
    /// Records shorter than `record_size` are zero-padded.
    pub fn insert(&mut self, record: &[u8]) -> Result<Rid> {
        let max = self.config.record_size as usize;
        if record.len() > max {
            return Err(HeapError::RecordTooLarge {
                size: record.len(),
                max,
            });
        }

        let rollover = self.data_tail.as_ref().map_or(true, Page::is_full);
        if rollover {
            self.allocate_data_page()?;
        }

        let tail = self
            .data_tail
            .as_mut()
            .ok_or_else(|| HeapError::CorruptDirectory("no data tail after allocation".into()))?;
        let slot_id = tail.append(record)?;
        let rid = Rid::new(tail.page_id(), slot_id);

        if rollover {
            self.file.sync()?;
        }

        trace!(%rid, "inserted record");
        Ok(rid)
    }

    /// Add a data page at the end of the file and make it the data tail
    ///
    /// Rolls the directory first when the current one cannot catalog
    /// another data page. The directory tail is persisted before returning
    /// so the catalog reaches disk ahead of the data it describes.
    fn allocate_data_page(&mut self) -> Result<()> {
        while self
            .layout
            .directory_needs_rollover(self.dir_tail.record_count())
        {
            self.allocate_directory_page()?;
        }

        let offset = self.reserve_page(PageKind::Data)?;
        let page = Page::create(
            PageKind::Data,
            offset,
            self.config.page_size,
            self.config.record_size,
        )?;
        self.dir_tail
            .push_entry(DirectoryEntry::new(PageKind::Data, offset))?;

        if let Some(prev) = self.data_tail.as_mut() {
            prev.link(&page);
            prev.persist(&self.file)?;
        }

        debug!(
            offset,
            page_id = page.page_id(),
            directory = self.dir_tail.offset(),
            "allocated data page"
        );
        self.data_tail = Some(page);
        self.dir_tail.persist(&self.file)
    }

    /// Add a directory page, cataloged in and linked from the current one
    fn allocate_directory_page(&mut self) -> Result<()> {
        let offset = self.reserve_page(PageKind::Directory)?;
        let page = Page::create(
            PageKind::Directory,
            offset,
            self.config.page_size,
            DIRECTORY_ENTRY_SIZE as u32,
        )?;

        self.dir_tail
            .push_entry(DirectoryEntry::new(PageKind::Directory, offset))?;
        self.dir_tail.link(&page);
        self.dir_tail.persist(&self.file)?;

        debug!(offset, previous = self.dir_tail.offset(), "allocated directory page");
        self.dir_tail = page;
        Ok(())
    }

    /// Claim the next page-sized extent of the file for a page of `kind`
    fn reserve_page(&mut self, kind: PageKind) -> Result<u32> {
        let offset = self.file_offset;
        let end = offset
            .checked_add(self.config.page_size)
            .ok_or(HeapError::FileTooLarge)?;

        let ordinal = self.layout.ordinal_of_offset(offset).ok_or_else(|| {
            HeapError::CorruptDirectory("append position is the root directory".into())
        })?;
        let expected = if self.layout.is_data_page(ordinal) {
            PageKind::Data
        } else {
            PageKind::Directory
        };
        if kind != expected {
            return Err(HeapError::CorruptDirectory(format!(
                "allocating a {kind:?} page at ordinal {ordinal}, addressing expects {expected:?}"
            )));
        }

        self.file_offset = end;
        Ok(offset)
    }

    // =========================================================================
    // Read
    // =========================================================================

    /// Read the payload stored under `rid`
    pub fn read(&mut self, rid: Rid) -> Result<Vec<u8>> {
        let at = self.locate(rid.page_id())?;
        Ok(self.resident(at)?.read_at(rid)?.to_vec())
    }

    /// Copy the payload stored under `rid` into the front of `buf`
    ///
    /// `buf` must hold at least `record_size` bytes, otherwise
    /// `BufferTooSmall`.
    pub fn read_into(&mut self, rid: Rid, buf: &mut [u8]) -> Result<()> {
        let at = self.locate(rid.page_id())?;
        let record = self.resident(at)?.read_at(rid)?;
        if buf.len() < record.len() {
            return Err(HeapError::BufferTooSmall {
                needed: record.len(),
                available: buf.len(),
            });
        }
        buf[..record.len()].copy_from_slice(record);
        Ok(())
    }

    /// Make the data page at `page_id` resident and say where it is
    ///
    /// Checks the data tail, then the read cache, then loads from disk into
    /// the read cache (evicting the previous occupant).
    fn locate(&mut self, page_id: u32) -> Result<Resident> {
        if !self.layout.is_data_page(page_id) {
            return Err(HeapError::NotFound);
        }

        let offset = self.layout.offset_of_ordinal(page_id);
        if offset >= u64::from(self.file_offset) {
            return Err(HeapError::NotFound);
        }
        let offset = offset as u32;

        if self.data_tail.as_ref().is_some_and(|p| p.offset() == offset) {
            return Ok(Resident::DataTail);
        }
        if self.read_cache.as_ref().is_some_and(|p| p.offset() == offset) {
            return Ok(Resident::ReadCache);
        }

        let page = self.load_data_page(offset)?;
        if let Some(evicted) = self.read_cache.replace(page) {
            trace!(offset = evicted.offset(), "evicted read cache page");
        }
        Ok(Resident::ReadCache)
    }

    fn resident(&self, at: Resident) -> Result<&Page> {
        let page = match at {
            Resident::DataTail => self.data_tail.as_ref(),
            Resident::ReadCache => self.read_cache.as_ref(),
        };
        page.ok_or_else(|| HeapError::CorruptDirectory(format!("{at:?} page is not resident")))
    }

    fn resident_mut(&mut self, at: Resident) -> Result<&mut Page> {
        let page = match at {
            Resident::DataTail => self.data_tail.as_mut(),
            Resident::ReadCache => self.read_cache.as_mut(),
        };
        page.ok_or_else(|| HeapError::CorruptDirectory(format!("{at:?} page is not resident")))
    }

    /// Load a data page and check it was written with this table's geometry
    fn load_data_page(&self, offset: u32) -> Result<Page> {
        let page = Page::load(&self.file, PageKind::Data, offset, self.config.page_size)?;
        let expected = self.config.record_size + RID_PREFIX_SIZE as u32;
        if page.record_size() != expected {
            return Err(HeapError::CorruptDirectory(format!(
                "data page at offset {offset} has slot size {}, expected {expected}",
                page.record_size()
            )));
        }
        Ok(page)
    }

    /// Load a directory page, refusing offsets the interleaving rule says
    /// hold data
    fn load_directory_page(&self, offset: u32) -> Result<Page> {
        if !self.layout.is_directory_offset(offset) {
            return Err(HeapError::CorruptDirectory(format!(
                "offset {offset} is not a directory position"
            )));
        }
        let page = Page::load(&self.file, PageKind::Directory, offset, self.config.page_size)?;
        if page.record_size() != DIRECTORY_ENTRY_SIZE as u32 {
            return Err(HeapError::CorruptDirectory(format!(
                "directory page at offset {offset} has slot size {}",
                page.record_size()
            )));
        }
        Ok(page)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Write both tail pages and fsync
    pub fn sync(&mut self) -> Result<()> {
        if let Some(tail) = self.data_tail.as_mut() {
            tail.persist(&self.file)?;
        }
        self.dir_tail.persist(&self.file)?;
        self.file.sync()
    }

    /// Flush everything and release the file
    pub fn close(mut self) -> Result<()> {
        self.sync()?;
        info!(
            path = %self.file.path().display(),
            file_len = self.file_offset,
            "closed table"
        );
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn layout(&self) -> &PageLayout {
        &self.layout
    }

    /// Logical file length (the append position)
    pub fn file_len(&self) -> u64 {
        u64::from(self.file_offset)
    }

    /// Records one data page holds
    pub fn records_per_page(&self) -> u32 {
        (self.config.page_size - PAGE_HEADER_SIZE as u32)
            / (self.config.record_size + RID_PREFIX_SIZE as u32)
    }

    /// Entries one directory page holds
    pub fn directory_fanout(&self) -> u32 {
        self.layout.directory_fanout()
    }

    pub fn data_page_count(&self) -> u64 {
        self.layout.page_counts(self.file_len()).0
    }

    /// Directory pages, root included
    pub fn directory_page_count(&self) -> u64 {
        self.layout.page_counts(self.file_len()).1
    }

    /// Live records
    ///
    /// Every data page but the tail is full, so this is pure arithmetic.
    pub fn record_count(&self) -> u64 {
        match &self.data_tail {
            Some(tail) => {
                (self.data_page_count() - 1) * u64::from(self.records_per_page())
                    + u64::from(tail.record_count())
            }
            None => 0,
        }
    }

    /// RID of the last live record
    pub fn data_tail_rid(&self) -> Option<Rid> {
        let tail = self.data_tail.as_ref()?;
        let count = tail.record_count();
        (count > 0).then(|| Rid::new(tail.page_id(), count - 1))
    }

    /// Offset of the resident directory tail
    pub fn directory_tail_offset(&self) -> u32 {
        self.dir_tail.offset()
    }

    /// Number of entries in the resident directory tail
    pub fn directory_tail_len(&self) -> u32 {
        self.dir_tail.record_count()
    }

    /// The whole catalog in allocation order
    ///
    /// Walks the directory chain from the root; the last node is the
    /// resident tail, the others are read from disk.
    pub fn directory_entries(&self) -> Result<Vec<DirectoryEntry>> {
        let mut entries = Vec::new();
        let mut offset = ROOT_DIRECTORY_OFFSET;
        let max_hops = self.directory_page_count();

        for _ in 0..max_hops {
            if offset == self.dir_tail.offset() {
                entries.extend(self.dir_tail.entries()?);
                return Ok(entries);
            }

            let page = self.load_directory_page(offset)?;
            entries.extend(page.entries()?);
            offset = page.next_offset();
            if offset == ROOT_DIRECTORY_OFFSET {
                break;
            }
        }

        Err(HeapError::CorruptDirectory(format!(
            "directory chain does not reach the tail at offset {}",
            self.dir_tail.offset()
        )))
    }
}
