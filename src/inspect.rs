//! Offline inspection
//!
//! Walks the directory chain of a closed (or synced) table file straight
//! from disk and cross-checks it against the page interleaving rule:
//!
//! - entries appear in allocation order, one page apart, starting right
//!   after the root
//! - each entry's kind matches what its ordinal says it must be
//! - a directory entry is the last entry of its page and matches `next`
//! - data pages chain in order, every one but the last is full, and each
//!   slot carries its own RID
//! - the chain covers the file exactly

use std::path::Path;

use crate::config::MIN_PAGE_SIZE;
use crate::error::{HeapError, Result};
use crate::page::{DirectoryEntry, Page, PageKind, RID_PREFIX_SIZE, ROOT_DIRECTORY_OFFSET};
use crate::rid::Rid;
use crate::storage::PageFile;
use crate::table::PageLayout;

/// Summary of a table file
#[derive(Debug, Clone)]
pub struct TableReport {
    pub page_size: u32,
    pub file_len: u64,
    /// Directory pages, root included
    pub directory_pages: u64,
    pub data_pages: u64,
    /// Live records across all data pages
    pub records: u64,
    /// Payload size of a record, `None` when there are no data pages
    pub record_size: Option<u32>,
    /// The full catalog in allocation order
    pub entries: Vec<DirectoryEntry>,
}

/// Data-chain state carried across directory pages
struct DataChain {
    /// Last data page seen: (offset, next, record_count, max_records)
    last: Option<(u32, u32, u32, u32)>,
    slot_size: Option<u32>,
}

/// Inspect the table file at `path`, written with `page_size` pages
pub fn inspect(path: &Path, page_size: u32) -> Result<TableReport> {
    if page_size < MIN_PAGE_SIZE || !page_size.is_power_of_two() {
        return Err(HeapError::InvalidConfig(format!("bad page size {page_size}")));
    }

    let file = PageFile::open_read_only(path)?;
    let file_len = file.len()?;
    if file_len < u64::from(page_size) || file_len % u64::from(page_size) != 0 {
        return Err(HeapError::CorruptDirectory(format!(
            "file length {file_len} is not a positive multiple of {page_size}"
        )));
    }

    let layout = PageLayout::new(page_size);
    let mut report = TableReport {
        page_size,
        file_len,
        directory_pages: 0,
        data_pages: 0,
        records: 0,
        record_size: None,
        entries: Vec::new(),
    };
    let mut chain = DataChain {
        last: None,
        slot_size: None,
    };

    let mut expected_offset = u64::from(page_size);
    let mut dir_offset = ROOT_DIRECTORY_OFFSET;

    loop {
        let dir = Page::load(&file, PageKind::Directory, dir_offset, page_size)?;
        report.directory_pages += 1;
        if report.directory_pages > file_len / u64::from(page_size) {
            return Err(HeapError::CorruptDirectory(format!(
                "directory chain loops back at offset {dir_offset}"
            )));
        }

        let entries = dir.entries()?;
        for (slot, entry) in entries.iter().enumerate() {
            if u64::from(entry.offset) != expected_offset {
                return Err(HeapError::CorruptDirectory(format!(
                    "directory at {dir_offset} slot {slot} points at {}, expected {expected_offset}",
                    entry.offset
                )));
            }
            check_kind(&layout, entry)?;

            match entry.kind {
                PageKind::Data => {
                    check_data_page(&file, &layout, entry.offset, &mut chain, &mut report)?
                }
                PageKind::Directory => {
                    if slot + 1 != entries.len() || dir.next_offset() != entry.offset {
                        return Err(HeapError::CorruptDirectory(format!(
                            "directory entry for {} is not the link of directory {dir_offset}",
                            entry.offset
                        )));
                    }
                }
            }
            expected_offset += u64::from(page_size);
        }
        report.entries.extend(entries);

        match dir.next_offset() {
            ROOT_DIRECTORY_OFFSET => break,
            next => dir_offset = next,
        }
    }

    if expected_offset != file_len {
        return Err(HeapError::CorruptDirectory(format!(
            "directory covers {expected_offset} bytes, file is {file_len}"
        )));
    }
    if let Some((offset, next, _, _)) = chain.last {
        if next != 0 {
            return Err(HeapError::CorruptDirectory(format!(
                "last data page at {offset} links to {next}"
            )));
        }
    }

    report.record_size = chain.slot_size.map(|size| size - RID_PREFIX_SIZE as u32);
    Ok(report)
}

fn check_kind(layout: &PageLayout, entry: &DirectoryEntry) -> Result<()> {
    let ordinal = layout.ordinal_of_offset(entry.offset).ok_or_else(|| {
        HeapError::CorruptDirectory("directory entry points at the root".into())
    })?;
    let expected = if layout.is_data_page(ordinal) {
        PageKind::Data
    } else {
        PageKind::Directory
    };
    if entry.kind != expected {
        return Err(HeapError::CorruptDirectory(format!(
            "ordinal {ordinal} is cataloged as {:?}, addressing says {expected:?}",
            entry.kind
        )));
    }
    Ok(())
}

fn check_data_page(
    file: &PageFile,
    layout: &PageLayout,
    offset: u32,
    chain: &mut DataChain,
    report: &mut TableReport,
) -> Result<()> {
    let page = Page::load(file, PageKind::Data, offset, layout.page_size())?;

    match chain.slot_size {
        Some(size) if size != page.record_size() => {
            return Err(HeapError::CorruptDirectory(format!(
                "data page at {offset} has slot size {}, earlier pages use {size}",
                page.record_size()
            )));
        }
        _ => chain.slot_size = Some(page.record_size()),
    }

    if let Some((prev, next, count, max)) = chain.last {
        if next != offset {
            return Err(HeapError::CorruptDirectory(format!(
                "data page at {prev} links to {next}, expected {offset}"
            )));
        }
        if count != max {
            return Err(HeapError::CorruptDirectory(format!(
                "non-tail data page at {prev} holds {count} of {max} records"
            )));
        }
    }

    for slot_id in 0..page.record_count() {
        let expected = Rid::new(page.page_id(), slot_id);
        let stored = page.stored_rid(slot_id)?;
        if stored != expected {
            return Err(HeapError::CorruptDirectory(format!(
                "slot {expected} carries RID {stored}"
            )));
        }
    }

    report.data_pages += 1;
    report.records += u64::from(page.record_count());
    chain.last = Some((
        offset,
        page.next_offset(),
        page.record_count(),
        page.max_records(),
    ));
    Ok(())
}
