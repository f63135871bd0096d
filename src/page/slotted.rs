//! Slotted page
//!
//! In-memory image of one page: the decoded header plus a page-aligned
//! buffer holding the slots. Slots are filled from the front; only the last
//! occupied slot can be removed, and any slot below capacity can be
//! overwritten in place.

use std::ops::Range;

use bytes::{Buf, BufMut};

use crate::error::{HeapError, Result};
use crate::rid::Rid;
use crate::storage::{AlignedBuffer, PageFile};

use super::{PageHeader, PageKind, PAGE_HEADER_SIZE};

/// One page of the table file
#[derive(Debug)]
pub struct Page {
    /// Data or Directory
    kind: PageKind,
    /// Absolute byte offset in the file, fixed for the page's lifetime
    offset: u32,
    /// Ordinal derived from `offset`
    page_id: u32,
    /// Decoded header; written back into `buf` on persist
    header: PageHeader,
    /// Full page image (header bytes + slots), page-size aligned
    buf: AlignedBuffer,
}

impl Page {
    /// Create an empty page destined for `offset`
    ///
    /// `record_size` is the caller's payload size; data pages widen every
    /// slot by the RID prefix.
    pub fn create(kind: PageKind, offset: u32, page_size: u32, record_size: u32) -> Result<Self> {
        let header = PageHeader {
            page_size,
            record_size: record_size + kind.prefix_len() as u32,
            record_count: 0,
            next: 0,
        };

        Ok(Self {
            kind,
            offset,
            page_id: Self::page_id_of(offset, page_size),
            header,
            buf: AlignedBuffer::new(page_size as usize, page_size as usize)?,
        })
    }

    /// Read the page at `offset` from disk
    ///
    /// A short read (page beyond end of file) is `NotFound`. A header that
    /// disagrees with the expected geometry is `CorruptDirectory`.
    pub fn load(file: &PageFile, kind: PageKind, offset: u32, page_size: u32) -> Result<Self> {
        let mut buf = AlignedBuffer::new(page_size as usize, page_size as usize)?;
        let read = file.read_block(u64::from(offset), &mut buf)?;
        if read < page_size as usize {
            return Err(HeapError::NotFound);
        }

        let header = PageHeader::decode(&buf[..PAGE_HEADER_SIZE])?;
        if header.page_size != page_size {
            return Err(HeapError::CorruptDirectory(format!(
                "page at offset {offset} claims page size {}, table uses {page_size}",
                header.page_size
            )));
        }

        let min_slot = kind.prefix_len() as u32 + 1;
        let max_slot = page_size - PAGE_HEADER_SIZE as u32;
        if header.record_size < min_slot || header.record_size > max_slot {
            return Err(HeapError::CorruptDirectory(format!(
                "page at offset {offset} has slot size {} outside {min_slot}..={max_slot}",
                header.record_size
            )));
        }

        if header.record_count > header.max_records() {
            return Err(HeapError::CorruptDirectory(format!(
                "page at offset {offset} holds {} records, capacity is {}",
                header.record_count,
                header.max_records()
            )));
        }

        Ok(Self {
            kind,
            offset,
            page_id: Self::page_id_of(offset, page_size),
            header,
            buf,
        })
    }

    fn page_id_of(offset: u32, page_size: u32) -> u32 {
        // The root directory sits at offset 0 and has no ordinal of its own.
        (offset / page_size).saturating_sub(1)
    }

    // =========================================================================
    // Slot Operations
    // =========================================================================

    /// Write `record` into slot `slot_id` without touching `record_count`
    ///
    /// Records shorter than the payload are zero-padded. Data pages also
    /// stamp the slot's RID in front of the payload.
    pub fn insert_at(&mut self, slot_id: u32, record: &[u8]) -> Result<()> {
        let capacity = self.max_records();
        if slot_id >= capacity {
            return Err(HeapError::PageFull { slot_id, capacity });
        }

        let payload_size = self.payload_size();
        if record.len() > payload_size {
            return Err(HeapError::RecordTooLarge {
                size: record.len(),
                max: payload_size,
            });
        }

        let rid = Rid::new(self.page_id, slot_id);
        let kind = self.kind;
        let range = self.slot_range(slot_id);
        let slot = &mut self.buf[range];

        let (mut prefix, payload) = slot.split_at_mut(kind.prefix_len());
        if kind == PageKind::Data {
            prefix.put_u64_le(rid.as_u64());
        }
        payload[..record.len()].copy_from_slice(record);
        payload[record.len()..].fill(0);

        Ok(())
    }

    /// Write `record` into the first free slot and return its index
    pub fn append(&mut self, record: &[u8]) -> Result<u32> {
        let slot_id = self.header.record_count;
        self.insert_at(slot_id, record)?;
        self.header.record_count += 1;
        Ok(slot_id)
    }

    /// The payload stored under `rid`
    pub fn read_at(&self, rid: Rid) -> Result<&[u8]> {
        if rid.page_id() != self.page_id {
            return Err(HeapError::NotFound);
        }
        self.slot_payload(rid.slot_id())
    }

    /// RID prefix as stored on disk for an occupied data slot
    pub fn stored_rid(&self, slot_id: u32) -> Result<Rid> {
        if self.kind != PageKind::Data || slot_id >= self.header.record_count {
            return Err(HeapError::NotFound);
        }
        let mut prefix = &self.buf[self.slot_range(slot_id)];
        Ok(Rid::from(prefix.get_u64_le()))
    }

    /// Zero the last occupied slot and release it
    pub fn remove_last(&mut self) -> Result<()> {
        if self.header.record_count == 0 {
            return Err(HeapError::NotFound);
        }
        self.header.record_count -= 1;
        let range = self.slot_range(self.header.record_count);
        self.buf[range].fill(0);
        Ok(())
    }

    /// Payload bytes of an occupied slot (RID prefix skipped)
    pub(crate) fn slot_payload(&self, slot_id: u32) -> Result<&[u8]> {
        if slot_id >= self.header.record_count {
            return Err(HeapError::NotFound);
        }
        let range = self.slot_range(slot_id);
        Ok(&self.buf[range.start + self.kind.prefix_len()..range.end])
    }

    fn slot_range(&self, slot_id: u32) -> Range<usize> {
        let size = self.header.record_size as usize;
        let start = PAGE_HEADER_SIZE + slot_id as usize * size;
        start..start + size
    }

    // =========================================================================
    // Persistence & Chaining
    // =========================================================================

    /// Write the full page image at its offset
    pub fn persist(&mut self, file: &PageFile) -> Result<()> {
        self.header.encode(&mut self.buf[..PAGE_HEADER_SIZE]);
        file.write_block(u64::from(self.offset), &self.buf)
    }

    /// Point this page's `next` at `next`
    pub fn link(&mut self, next: &Page) {
        self.header.next = next.offset;
    }

    pub fn set_next(&mut self, offset: u32) {
        self.header.next = offset;
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn kind(&self) -> PageKind {
        self.kind
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn page_id(&self) -> u32 {
        self.page_id
    }

    pub fn header(&self) -> &PageHeader {
        &self.header
    }

    pub fn next_offset(&self) -> u32 {
        self.header.next
    }

    pub fn record_count(&self) -> u32 {
        self.header.record_count
    }

    /// Slot size as stored in the header
    pub fn record_size(&self) -> u32 {
        self.header.record_size
    }

    /// Bytes of caller data one slot holds
    pub fn payload_size(&self) -> usize {
        self.header.record_size as usize - self.kind.prefix_len()
    }

    pub fn max_records(&self) -> u32 {
        self.header.max_records()
    }

    pub fn is_full(&self) -> bool {
        self.header.record_count >= self.max_records()
    }

    pub fn is_empty(&self) -> bool {
        self.header.record_count == 0
    }
}
