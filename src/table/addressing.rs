//! Page addressing
//!
//! Directory and data pages are interleaved at fixed positions, so the kind
//! and offset of any page follow from its ordinal alone:
//!
//! ```text
//! ordinal:  -1     0 .. K-2     K-1     K .. 2K-2    2K-1    ...
//! kind:     Dir    Data ...     Dir     Data ...     Dir     ...
//! offset:   0      (ordinal + 1) * page_size
//! ```
//!
//! `K` is the directory fan-out. The allocator in [`super::Table`] rolls the
//! directory exactly when these functions say a directory ordinal comes
//! next; [`PageLayout::directory_needs_rollover`] is the allocator's half of
//! that contract and lives here so both halves change together.

use crate::page::{DIRECTORY_ENTRY_SIZE, PAGE_HEADER_SIZE, ROOT_DIRECTORY_OFFSET};
use crate::rid::Rid;

/// Page geometry and the ordinal <-> offset mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLayout {
    page_size: u32,
    /// K: directory entries per directory page
    directory_fanout: u32,
}

impl PageLayout {
    /// Precondition: `page_size` already validated (power of two, >= 512)
    pub fn new(page_size: u32) -> Self {
        let directory_fanout = (page_size - PAGE_HEADER_SIZE as u32) / DIRECTORY_ENTRY_SIZE as u32;
        Self {
            page_size,
            directory_fanout,
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn directory_fanout(&self) -> u32 {
        self.directory_fanout
    }

    /// Byte offset of the page at `ordinal`
    pub fn offset_of_ordinal(&self, ordinal: u32) -> u64 {
        (u64::from(ordinal) + 1) * u64::from(self.page_size)
    }

    /// Ordinal of the page at `offset`; `None` for the root directory
    ///
    /// Precondition: `offset` is a multiple of the page size.
    pub fn ordinal_of_offset(&self, offset: u32) -> Option<u32> {
        (offset / self.page_size).checked_sub(1)
    }

    /// Whether `ordinal` is a data page (false for directory positions)
    pub fn is_data_page(&self, ordinal: u32) -> bool {
        (u64::from(ordinal) + 1) % u64::from(self.directory_fanout) != 0
    }

    /// Whether the page at `offset` is a directory page (root included)
    pub fn is_directory_offset(&self, offset: u32) -> bool {
        match self.ordinal_of_offset(offset) {
            Some(ordinal) => !self.is_data_page(ordinal),
            None => offset == ROOT_DIRECTORY_OFFSET,
        }
    }

    /// True once a directory holding `entry_count` entries must be followed
    /// by a new directory before another data page can be cataloged
    ///
    /// Every directory keeps its last slot for its successor's entry, so it
    /// catalogs at most K-1 data pages.
    pub fn directory_needs_rollover(&self, entry_count: u32) -> bool {
        entry_count + 2 > self.directory_fanout
    }

    /// The first data ordinal after `ordinal`
    pub fn next_data_ordinal(&self, ordinal: u32) -> Option<u32> {
        let mut next = ordinal.checked_add(1)?;
        if !self.is_data_page(next) {
            next = next.checked_add(1)?;
        }
        Some(next)
    }

    /// The RID after `rid` in sequence order
    ///
    /// Wraps to slot 0 of the next data ordinal once `records_per_page`
    /// slots are used. Says nothing about whether the RID is live.
    pub fn next_rid(&self, rid: Rid, records_per_page: u32) -> Option<Rid> {
        match rid.slot_id().checked_add(1) {
            Some(slot_id) if slot_id < records_per_page => Some(Rid::new(rid.page_id(), slot_id)),
            _ => self
                .next_data_ordinal(rid.page_id())
                .map(|page_id| Rid::new(page_id, 0)),
        }
    }

    /// Offset of the data page preceding the data page at `offset`
    ///
    /// Steps back one page, and one more when that lands on a directory.
    /// `None` for the first data page.
    pub fn prev_data_offset(&self, offset: u32) -> Option<u32> {
        let mut prev = offset.checked_sub(self.page_size)?;
        if self.is_directory_offset(prev) {
            prev = prev.checked_sub(self.page_size)?;
        }
        // Offset 0 is the root directory, never a data page.
        (prev != ROOT_DIRECTORY_OFFSET).then_some(prev)
    }

    /// Offset of the directory page preceding the directory at `offset`
    ///
    /// Directories sit K ordinals apart; the one after the root is at
    /// ordinal K-1, whose predecessor is the root at offset 0. `None` for
    /// the root itself.
    pub fn prev_directory_offset(&self, offset: u32) -> Option<u32> {
        if offset == ROOT_DIRECTORY_OFFSET {
            return None;
        }
        let stride = u64::from(self.directory_fanout) * u64::from(self.page_size);
        u64::from(offset)
            .checked_sub(stride)
            .and_then(|prev| u32::try_from(prev).ok())
    }

    /// Data and directory page counts (root included) for a file of
    /// `file_len` bytes
    pub fn page_counts(&self, file_len: u64) -> (u64, u64) {
        let pages = (file_len / u64::from(self.page_size)).saturating_sub(1);
        let directories = pages / u64::from(self.directory_fanout);
        (pages - directories, directories + 1)
    }
}
