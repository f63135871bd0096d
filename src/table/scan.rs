//! Sequential scan
//!
//! Walks live records in RID order: slot by slot through a page, then on
//! to the next data ordinal, stepping over directory positions. Pages are
//! brought in through the same tail → cache → disk path as point reads.

use crate::error::{HeapError, Result};
use crate::rid::Rid;

use super::Table;

/// Iterator over `(rid, payload)` pairs starting at a given RID
pub struct Scan<'a> {
    table: &'a mut Table,
    /// Next RID to try; `None` once exhausted
    next: Option<Rid>,
}

impl Table {
    /// Scan live records from `start` to the end of the table
    ///
    /// A `start` on a directory ordinal begins at the following data page.
    pub fn scan_from(&mut self, start: Rid) -> Scan<'_> {
        Scan {
            table: self,
            next: Some(start),
        }
    }

    /// Scan every live record
    pub fn scan(&mut self) -> Scan<'_> {
        self.scan_from(Rid::new(0, 0))
    }
}

impl Iterator for Scan<'_> {
    type Item = Result<(Rid, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let rid = self.next?;
            let layout = *self.table.layout();

            if layout.offset_of_ordinal(rid.page_id()) >= self.table.file_len() {
                self.next = None;
                return None;
            }

            if !layout.is_data_page(rid.page_id()) {
                self.next = layout
                    .next_data_ordinal(rid.page_id())
                    .map(|page_id| Rid::new(page_id, 0));
                continue;
            }

            let record = match self.table.read(rid) {
                Ok(record) => record,
                Err(HeapError::NotFound) => {
                    // Past the page's last live slot.
                    self.next = layout
                        .next_data_ordinal(rid.page_id())
                        .map(|page_id| Rid::new(page_id, 0));
                    continue;
                }
                Err(e) => {
                    self.next = None;
                    return Some(Err(e));
                }
            };

            self.next = rid
                .slot_id()
                .checked_add(1)
                .map(|slot_id| Rid::new(rid.page_id(), slot_id));
            return Some(Ok((rid, record)));
        }
    }
}
