//! Directory entries
//!
//! A directory page is a slotted page whose slots are catalog entries, one
//! per allocated page, in allocation order.

use bytes::{Buf, BufMut};

use crate::error::{HeapError, Result};

use super::{Page, PageKind};

/// Entry size: kind (4) + offset (4)
pub const DIRECTORY_ENTRY_SIZE: usize = 8;

/// Catalog record describing one allocated page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub kind: PageKind,
    pub offset: u32,
}

impl DirectoryEntry {
    pub fn new(kind: PageKind, offset: u32) -> Self {
        Self { kind, offset }
    }

    pub fn encode(&self) -> [u8; DIRECTORY_ENTRY_SIZE] {
        let mut out = [0u8; DIRECTORY_ENTRY_SIZE];
        let mut cursor = &mut out[..];
        cursor.put_u32_le(self.kind.code());
        cursor.put_u32_le(self.offset);
        out
    }

    pub fn decode(mut bytes: &[u8]) -> Result<Self> {
        if bytes.len() < DIRECTORY_ENTRY_SIZE {
            return Err(HeapError::CorruptDirectory(format!(
                "directory entry needs {} bytes, got {}",
                DIRECTORY_ENTRY_SIZE,
                bytes.len()
            )));
        }

        let code = bytes.get_u32_le();
        let offset = bytes.get_u32_le();
        let kind = PageKind::from_code(code).ok_or_else(|| {
            HeapError::CorruptDirectory(format!("unknown page kind {code} in directory entry"))
        })?;

        Ok(Self { kind, offset })
    }
}

// =============================================================================
// Directory-page helpers
// =============================================================================

impl Page {
    /// Append a catalog entry to this directory page
    pub fn push_entry(&mut self, entry: DirectoryEntry) -> Result<u32> {
        self.expect_kind(PageKind::Directory)?;
        self.append(&entry.encode())
    }

    /// Decode the entry stored in `slot_id`
    pub fn entry(&self, slot_id: u32) -> Result<DirectoryEntry> {
        self.expect_kind(PageKind::Directory)?;
        DirectoryEntry::decode(self.slot_payload(slot_id)?)
    }

    /// The most recently appended entry, if any
    pub fn last_entry(&self) -> Result<Option<DirectoryEntry>> {
        match self.record_count() {
            0 => Ok(None),
            n => self.entry(n - 1).map(Some),
        }
    }

    /// All entries of this page in allocation order
    pub fn entries(&self) -> Result<Vec<DirectoryEntry>> {
        (0..self.record_count()).map(|slot| self.entry(slot)).collect()
    }

    fn expect_kind(&self, kind: PageKind) -> Result<()> {
        if self.kind() != kind {
            return Err(HeapError::CorruptDirectory(format!(
                "page at offset {} is {:?}, expected {:?}",
                self.offset(),
                self.kind(),
                kind
            )));
        }
        Ok(())
    }
}
