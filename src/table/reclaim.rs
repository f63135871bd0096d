//! Swap-delete and tail reclamation
//!
//! Deleting a record moves the table's last live record into the hole and
//! shrinks the data tail by one slot. RIDs therefore stay dense: every page
//! but the tail is full, and the tail's live slots are `0..record_count`.
//! The price is that the moved record changes identity; callers must not
//! hold RIDs across deletes.
//!
//! When the data tail empties it is dropped from the end of the file, and
//! when that leaves a non-root directory page without entries, that page
//! goes too.

use tracing::{debug, trace};

use crate::error::{HeapError, Result};
use crate::page::{Page, PageKind, ROOT_DIRECTORY_OFFSET};
use crate::rid::Rid;

use super::{Resident, Table};

impl Table {
    /// Delete the record at `rid`
    ///
    /// Steps:
    /// 1. Locate the page holding `rid` (tail, cache or disk)
    /// 2. Overwrite `rid`'s slot with the last live record, unless `rid`
    ///    is the last live record
    /// 3. Persist the target page if it is not the data tail
    /// 4. Drop the last slot of the data tail, reclaiming emptied pages
    /// 5. Write both tails and fsync
    pub fn delete(&mut self, rid: Rid) -> Result<()> {
        let target = self.locate(rid.page_id())?;
        if rid.slot_id() >= self.resident(target)?.record_count() {
            return Err(HeapError::NotFound);
        }

        let last_rid = self.data_tail_rid().ok_or_else(|| {
            HeapError::CorruptDirectory(format!("record {rid} exists but the data tail is empty"))
        })?;

        if rid != last_rid {
            let last_record = self.resident(Resident::DataTail)?.read_at(last_rid)?.to_vec();
            self.resident_mut(target)?
                .insert_at(rid.slot_id(), &last_record)?;
            trace!(%rid, moved_from = %last_rid, "relocated last record");
        }

        if target != Resident::DataTail {
            let page = self.read_cache.as_mut().ok_or_else(|| {
                HeapError::CorruptDirectory("read cache emptied during delete".into())
            })?;
            page.persist(&self.file)?;
        }

        let tail = self.resident_mut(Resident::DataTail)?;
        tail.remove_last()?;
        if tail.is_empty() {
            self.reclaim_data_tail()?;
        }

        self.sync()
    }

    /// Drop the emptied data tail from the end of the file
    ///
    /// Its directory entry is removed, its predecessor (if any) becomes the
    /// new tail with `next` cleared, and the file is truncated by one page.
    /// A non-root directory page left without entries is reclaimed after.
    fn reclaim_data_tail(&mut self) -> Result<()> {
        let emptied = self.data_tail.take().ok_or_else(|| {
            HeapError::CorruptDirectory("no data tail to reclaim".into())
        })?;
        self.check_is_last_page(&emptied)?;
        self.remove_directory_entry(PageKind::Data, emptied.offset())?;

        let predecessor = match self.layout.prev_data_offset(emptied.offset()) {
            Some(offset) => {
                let mut page = self.take_or_load_data_page(offset)?;
                page.set_next(0);
                Some(page)
            }
            None => None,
        };

        self.shrink_file()?;
        debug!(
            offset = emptied.offset(),
            new_tail = ?predecessor.as_ref().map(Page::offset),
            file_len = self.file_offset,
            "reclaimed data page"
        );
        self.data_tail = predecessor;

        if self.dir_tail.is_empty() && self.dir_tail.offset() != ROOT_DIRECTORY_OFFSET {
            self.reclaim_directory_tail()?;
        }
        Ok(())
    }

    /// Drop the emptied directory tail and fall back to its predecessor
    fn reclaim_directory_tail(&mut self) -> Result<()> {
        let emptied_offset = self.dir_tail.offset();
        let prev_offset = self
            .layout
            .prev_directory_offset(emptied_offset)
            .ok_or_else(|| {
                HeapError::CorruptDirectory(format!(
                    "directory at offset {emptied_offset} has no predecessor"
                ))
            })?;

        let predecessor = self.load_directory_page(prev_offset)?;
        if predecessor.next_offset() != emptied_offset {
            return Err(HeapError::CorruptDirectory(format!(
                "directory at offset {prev_offset} links to {}, expected {emptied_offset}",
                predecessor.next_offset()
            )));
        }

        let emptied = std::mem::replace(&mut self.dir_tail, predecessor);
        self.check_is_last_page(&emptied)?;
        self.remove_directory_entry(PageKind::Directory, emptied_offset)?;
        self.dir_tail.set_next(0);

        self.shrink_file()?;
        debug!(
            offset = emptied_offset,
            new_tail = prev_offset,
            file_len = self.file_offset,
            "reclaimed directory page"
        );
        Ok(())
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Reclaimed pages must be the last page of the file
    fn check_is_last_page(&self, page: &Page) -> Result<()> {
        let end = u64::from(page.offset()) + u64::from(self.config.page_size);
        if end != self.file_len() {
            return Err(HeapError::CorruptDirectory(format!(
                "page at offset {} is not at the end of the {}-byte file",
                page.offset(),
                self.file_offset
            )));
        }
        Ok(())
    }

    /// Pop the directory tail's last entry, which must describe `offset`
    fn remove_directory_entry(&mut self, kind: PageKind, offset: u32) -> Result<()> {
        match self.dir_tail.last_entry()? {
            Some(entry) if entry.kind == kind && entry.offset == offset => {
                self.dir_tail.remove_last()
            }
            other => Err(HeapError::CorruptDirectory(format!(
                "directory at offset {} ends with {other:?}, expected {kind:?} page at {offset}",
                self.dir_tail.offset()
            ))),
        }
    }

    /// Take a data page out of the read cache, or load it
    fn take_or_load_data_page(&mut self, offset: u32) -> Result<Page> {
        if self.read_cache.as_ref().is_some_and(|p| p.offset() == offset) {
            if let Some(page) = self.read_cache.take() {
                return Ok(page);
            }
        }
        self.load_data_page(offset)
    }

    /// Give back the last page of the file
    fn shrink_file(&mut self) -> Result<()> {
        self.file_offset -= self.config.page_size;
        self.file.truncate(u64::from(self.file_offset))
    }
}
