//! Tests for offline inspection
//!
//! These tests verify:
//! - Reports for empty, single-directory and multi-directory files
//! - Rejection of a bad page size argument
//! - Detection of damaged files

use std::fs::OpenOptions;
use std::os::unix::fs::FileExt;
use std::path::PathBuf;

use heapfile::inspect::inspect;
use heapfile::page::{DirectoryEntry, PageKind};
use heapfile::{Config, HeapError, Rid, Table};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

/// Write `count` records into a fresh table and close it
fn setup_closed_table(page_size: u32, record_size: u32, count: u32) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("table.bin");
    let config = Config::builder()
        .path(&path)
        .page_size(page_size)
        .record_size(record_size)
        .direct_io(false)
        .build();

    let mut table = Table::create(config).unwrap();
    for i in 0..count {
        table.insert(&i.to_le_bytes()).unwrap();
    }
    table.close().unwrap();
    (temp_dir, path)
}

fn overwrite(path: &PathBuf, offset: u64, bytes: &[u8]) {
    let file = OpenOptions::new().write(true).open(path).unwrap();
    file.write_all_at(bytes, offset).unwrap();
}

// =============================================================================
// Report Tests
// =============================================================================

#[test]
fn test_inspect_empty_table() {
    let (_temp_dir, path) = setup_closed_table(512, 8, 0);
    let report = inspect(&path, 512).unwrap();

    assert_eq!(report.file_len, 512);
    assert_eq!(report.directory_pages, 1);
    assert_eq!(report.data_pages, 0);
    assert_eq!(report.records, 0);
    assert_eq!(report.record_size, None);
    assert!(report.entries.is_empty());
}

#[test]
fn test_inspect_single_directory() {
    let (_temp_dir, path) = setup_closed_table(512, 8, 34);
    let report = inspect(&path, 512).unwrap();

    assert_eq!(report.file_len, 3 * 512);
    assert_eq!(report.directory_pages, 1);
    assert_eq!(report.data_pages, 2);
    assert_eq!(report.records, 34);
    assert_eq!(report.record_size, Some(8));
    assert_eq!(
        report.entries,
        vec![
            DirectoryEntry::new(PageKind::Data, 512),
            DirectoryEntry::new(PageKind::Data, 1024),
        ]
    );
}

#[test]
fn test_inspect_multiple_directories() {
    let (_temp_dir, path) = setup_closed_table(512, 240, 123);
    let report = inspect(&path, 512).unwrap();

    assert_eq!(report.file_len, 64 * 512);
    assert_eq!(report.directory_pages, 2);
    assert_eq!(report.data_pages, 62);
    assert_eq!(report.records, 123);
    assert_eq!(report.record_size, Some(240));
    assert_eq!(report.entries.len(), 63);
    assert_eq!(
        report.entries[61],
        DirectoryEntry::new(PageKind::Directory, 62 * 512)
    );
}

#[test]
fn test_inspect_after_deletes() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("table.bin");
    let config = Config::builder()
        .path(&path)
        .page_size(512)
        .record_size(240)
        .direct_io(false)
        .build();

    let mut table = Table::create(config).unwrap();
    for i in 0..125u32 {
        table.insert(&i.to_le_bytes()).unwrap();
    }
    for _ in 0..4 {
        table.delete(Rid::new(3, 1)).unwrap();
    }
    table.close().unwrap();

    let report = inspect(&path, 512).unwrap();
    assert_eq!(report.records, 121);
    assert_eq!(report.directory_pages, 1);
    assert_eq!(report.data_pages, 61);
    assert_eq!(report.file_len, 62 * 512);
}

// =============================================================================
// Rejection Tests
// =============================================================================

#[test]
fn test_inspect_bad_page_size() {
    let (_temp_dir, path) = setup_closed_table(512, 8, 3);

    assert!(matches!(
        inspect(&path, 600),
        Err(HeapError::InvalidConfig(_))
    ));
}

#[test]
fn test_inspect_mismatched_page_size() {
    let (_temp_dir, path) = setup_closed_table(512, 240, 123);

    assert!(matches!(
        inspect(&path, 1024),
        Err(HeapError::CorruptDirectory(_))
    ));
}

#[test]
fn test_inspect_missing_file() {
    let temp_dir = TempDir::new().unwrap();
    let result = inspect(&temp_dir.path().join("absent.bin"), 512);

    assert!(matches!(result, Err(HeapError::Io(_))));
}

#[test]
fn test_inspect_detects_wrong_stored_rid() {
    let (_temp_dir, path) = setup_closed_table(512, 8, 10);
    // First slot of data page 0: RID prefix right after the header.
    overwrite(&path, 512 + 16, &Rid::new(5, 5).as_u64().to_le_bytes());

    assert!(matches!(
        inspect(&path, 512),
        Err(HeapError::CorruptDirectory(_))
    ));
}

#[test]
fn test_inspect_detects_trailing_page() {
    let (_temp_dir, path) = setup_closed_table(512, 8, 10);
    overwrite(&path, 1024, &[0u8; 512]);

    assert!(matches!(
        inspect(&path, 512),
        Err(HeapError::CorruptDirectory(_))
    ));
}
