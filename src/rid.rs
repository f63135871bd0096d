//! Record Identifier
//!
//! A RID names one slot of one data page. Packed into 64 bits it is
//! `page_id << 32 | slot_id`, which is also the exact prefix stamped in
//! front of every record on disk.
//!
//! The page id is a page *ordinal* (position among all pages after the
//! root directory), so a RID decodes to a file offset arithmetically; see
//! [`crate::table::PageLayout`].

use std::fmt;

/// Record identifier: data page ordinal + slot index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rid {
    /// Ordinal of the data page the record lives in
    page_id: u32,
    /// Index of the slot within the page. Not a byte offset!
    slot_id: u32,
}

impl Rid {
    pub const fn new(page_id: u32, slot_id: u32) -> Self {
        Self { page_id, slot_id }
    }

    pub const fn page_id(&self) -> u32 {
        self.page_id
    }

    pub const fn slot_id(&self) -> u32 {
        self.slot_id
    }

    /// The packed 64-bit form
    pub const fn as_u64(&self) -> u64 {
        (self.page_id as u64) << 32 | self.slot_id as u64
    }
}

impl From<u64> for Rid {
    fn from(value: u64) -> Self {
        Self {
            page_id: (value >> 32) as u32,
            slot_id: value as u32,
        }
    }
}

impl From<Rid> for u64 {
    fn from(rid: Rid) -> Self {
        rid.as_u64()
    }
}

impl fmt::Display for Rid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.page_id, self.slot_id)
    }
}
