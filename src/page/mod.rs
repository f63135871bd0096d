//! Page Module
//!
//! Self-describing fixed-size pages with uniform slots.
//!
//! ## Page Format
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Header (16 bytes, little-endian)                             │
//! │   page_size (4) | record_size (4) | record_count (4) | next (4)│
//! ├──────────────────────────────────────────────────────────────┤
//! │ Slot 0 │ Slot 1 │ ... │ Slot max-1 │ (zero padding)          │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ### Slot payload by page kind
//! - Data:      rid (8) + record payload (record_size - 8)
//! - Directory: kind (4) + offset (4)

mod directory;
mod slotted;

use bytes::{Buf, BufMut};

use crate::error::{HeapError, Result};

pub use directory::{DirectoryEntry, DIRECTORY_ENTRY_SIZE};
pub use slotted::Page;

/// Header size: page_size (4) + record_size (4) + record_count (4) + next (4)
pub const PAGE_HEADER_SIZE: usize = 16;

/// Size of the RID stamped in front of every data record
pub const RID_PREFIX_SIZE: usize = 8;

/// Offset of the root directory page
pub const ROOT_DIRECTORY_OFFSET: u32 = 0;

// =============================================================================
// Page Kind
// =============================================================================

/// The two page kinds sharing the slot substrate
///
/// They differ only in what a slot holds: data slots carry an RID prefix in
/// front of the caller's bytes, directory slots hold a raw entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageKind {
    Data,
    Directory,
}

impl PageKind {
    /// On-disk code used in directory entries
    pub const fn code(self) -> u32 {
        match self {
            PageKind::Data => 1,
            PageKind::Directory => 2,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(PageKind::Data),
            2 => Some(PageKind::Directory),
            _ => None,
        }
    }

    /// Bytes each slot reserves before the caller's payload
    pub const fn prefix_len(self) -> usize {
        match self {
            PageKind::Data => RID_PREFIX_SIZE,
            PageKind::Directory => 0,
        }
    }
}

// =============================================================================
// Page Header
// =============================================================================

/// Fixed header at the start of every page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageHeader {
    /// Total page size, header included
    pub page_size: u32,
    /// Size of one slot (for data pages: payload + RID prefix)
    pub record_size: u32,
    /// Number of occupied slots
    pub record_count: u32,
    /// Offset of the next page of the same kind, 0 if none
    pub next: u32,
}

impl PageHeader {
    pub fn decode(mut bytes: &[u8]) -> Result<Self> {
        if bytes.len() < PAGE_HEADER_SIZE {
            return Err(HeapError::CorruptDirectory(format!(
                "page header needs {} bytes, got {}",
                PAGE_HEADER_SIZE,
                bytes.len()
            )));
        }

        Ok(Self {
            page_size: bytes.get_u32_le(),
            record_size: bytes.get_u32_le(),
            record_count: bytes.get_u32_le(),
            next: bytes.get_u32_le(),
        })
    }

    pub fn encode(&self, mut out: &mut [u8]) {
        out.put_u32_le(self.page_size);
        out.put_u32_le(self.record_size);
        out.put_u32_le(self.record_count);
        out.put_u32_le(self.next);
    }

    /// Slots that fit after the header
    pub fn max_records(&self) -> u32 {
        if self.record_size == 0 {
            return 0;
        }
        (self.page_size - PAGE_HEADER_SIZE as u32) / self.record_size
    }
}
