//! Tests for Table
//!
//! These tests verify:
//! - Create-time validation (nothing touches disk on bad geometry)
//! - Insert/read round trips and RID assignment
//! - Data page and directory page rollover
//! - Reads through the tail, the read cache and disk
//! - Sequential scans across directory positions
//! - The default O_DIRECT path and load-time geometry checks

use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};

use heapfile::page::{DirectoryEntry, PageKind};
use heapfile::{Config, HeapError, Rid, Table};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_table(page_size: u32, record_size: u32) -> (TempDir, Table) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .path(temp_dir.path().join("table.bin"))
        .page_size(page_size)
        .record_size(record_size)
        .direct_io(false)
        .build();
    let table = Table::create(config).unwrap();
    (temp_dir, table)
}

fn padded(bytes: &[u8], record_size: usize) -> Vec<u8> {
    let mut record = bytes.to_vec();
    record.resize(record_size, 0);
    record
}

fn bad_config(page_size: u32, record_size: u32) -> (TempDir, PathBuf, Config) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("rejected.bin");
    let config = Config::builder()
        .path(&path)
        .page_size(page_size)
        .record_size(record_size)
        .direct_io(false)
        .build();
    (temp_dir, path, config)
}

// =============================================================================
// Create Tests
// =============================================================================

#[test]
fn test_create_writes_root_directory() {
    let (_temp_dir, table) = setup_temp_table(512, 8);

    assert_eq!(table.file_len(), 512);
    assert_eq!(table.record_count(), 0);
    assert_eq!(table.data_page_count(), 0);
    assert_eq!(table.directory_page_count(), 1);
    assert_eq!(table.directory_tail_offset(), 0);
    assert_eq!(table.data_tail_rid(), None);
    assert_eq!(
        std::fs::metadata(&table.config().path).unwrap().len(),
        512
    );
}

#[test]
fn test_create_truncates_existing_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("table.bin");
    std::fs::write(&path, vec![0xAB; 4096]).unwrap();

    let config = Config::builder()
        .path(&path)
        .page_size(512)
        .direct_io(false)
        .build();
    let table = Table::create(config).unwrap();

    assert_eq!(table.file_len(), 512);
    assert_eq!(std::fs::metadata(&path).unwrap().len(), 512);
}

#[test]
fn test_reject_page_size_not_power_of_two() {
    let (_temp_dir, path, config) = bad_config(1000, 8);

    assert!(matches!(
        Table::create(config),
        Err(HeapError::InvalidConfig(_))
    ));
    assert!(!path.exists());
}

#[test]
fn test_reject_page_size_below_minimum() {
    let (_temp_dir, path, config) = bad_config(256, 8);

    assert!(matches!(
        Table::create(config),
        Err(HeapError::InvalidConfig(_))
    ));
    assert!(!path.exists());
}

#[test]
fn test_reject_record_size() {
    let (_temp_dir, path, config) = bad_config(512, 0);
    assert!(matches!(
        Table::create(config),
        Err(HeapError::InvalidConfig(_))
    ));
    assert!(!path.exists());

    // 489 + 8 bytes of RID exceed the 496 bytes after the header.
    let (_temp_dir, path, config) = bad_config(512, 489);
    assert!(matches!(
        Table::create(config),
        Err(HeapError::InvalidConfig(_))
    ));
    assert!(!path.exists());
}

#[test]
fn test_config_defaults() {
    let config = Config::default();

    assert_eq!(config.path, PathBuf::from("test_db.bin"));
    assert_eq!(config.page_size, 4096);
    assert_eq!(config.record_size, 8);
    assert!(config.direct_io);
    assert!(config.validate().is_ok());
}

// =============================================================================
// Insert / Read Tests
// =============================================================================

#[test]
fn test_insert_and_read() {
    let (_temp_dir, mut table) = setup_temp_table(512, 8);

    let rid = table.insert(b"hello").unwrap();
    assert_eq!(rid, Rid::new(0, 0));
    assert_eq!(table.read(rid).unwrap(), padded(b"hello", 8));
    assert_eq!(table.file_len(), 1024);
}

#[test]
fn test_read_into() {
    let (_temp_dir, mut table) = setup_temp_table(512, 8);
    let rid = table.insert(b"abcdefgh").unwrap();

    let mut buf = [0xFFu8; 10];
    table.read_into(rid, &mut buf).unwrap();
    assert_eq!(&buf[..8], b"abcdefgh");
    assert_eq!(&buf[8..], &[0xFF, 0xFF]);

    let mut small = [0u8; 4];
    assert!(matches!(
        table.read_into(rid, &mut small),
        Err(HeapError::BufferTooSmall {
            needed: 8,
            available: 4
        })
    ));
}

#[test]
fn test_insert_record_too_large() {
    let (_temp_dir, mut table) = setup_temp_table(512, 8);

    assert!(matches!(
        table.insert(b"123456789"),
        Err(HeapError::RecordTooLarge { size: 9, max: 8 })
    ));
    assert_eq!(table.record_count(), 0);
    assert_eq!(table.file_len(), 512);
}

#[test]
fn test_data_page_rollover() {
    let (_temp_dir, mut table) = setup_temp_table(512, 8);
    assert_eq!(table.records_per_page(), 31);

    let rids: Vec<Rid> = (0..34u32)
        .map(|i| table.insert(&i.to_le_bytes()).unwrap())
        .collect();

    assert_eq!(rids[30], Rid::new(0, 30));
    assert_eq!(rids[31], Rid::new(1, 0));
    assert_eq!(rids[33], Rid::new(1, 2));
    assert_eq!(table.file_len(), 3 * 512);
    assert_eq!(table.data_page_count(), 2);
    assert_eq!(table.directory_tail_len(), 2);
    assert_eq!(table.record_count(), 34);
    assert_eq!(table.data_tail_rid(), Some(Rid::new(1, 2)));

    for (i, rid) in rids.iter().enumerate() {
        assert_eq!(table.read(*rid).unwrap(), padded(&(i as u32).to_le_bytes(), 8));
    }
}

#[test]
fn test_one_record_per_page() {
    let (_temp_dir, mut table) = setup_temp_table(512, 488);
    assert_eq!(table.records_per_page(), 1);

    let a = table.insert(b"a").unwrap();
    let b = table.insert(b"b").unwrap();

    assert_eq!(a, Rid::new(0, 0));
    assert_eq!(b, Rid::new(1, 0));
    assert_eq!(table.read(a).unwrap(), padded(b"a", 488));
}

#[test]
fn test_directory_rollover() {
    // 240-byte records: two per 512-byte page, 61 data pages per directory.
    let (_temp_dir, mut table) = setup_temp_table(512, 240);
    assert_eq!(table.records_per_page(), 2);
    assert_eq!(table.directory_fanout(), 62);

    let mut last = Rid::new(0, 0);
    for i in 0..123u32 {
        last = table.insert(format!("rec-{i}").as_bytes()).unwrap();
    }

    // Ordinal 61 went to the second directory page.
    assert_eq!(last, Rid::new(62, 0));
    assert_eq!(table.file_len(), 64 * 512);
    assert_eq!(table.directory_page_count(), 2);
    assert_eq!(table.data_page_count(), 62);
    assert_eq!(table.directory_tail_offset(), 62 * 512);
    assert_eq!(table.directory_tail_len(), 1);
    assert_eq!(table.record_count(), 123);

    let entries = table.directory_entries().unwrap();
    assert_eq!(entries.len(), 63);
    assert_eq!(entries[0], DirectoryEntry::new(PageKind::Data, 512));
    assert_eq!(entries[61], DirectoryEntry::new(PageKind::Directory, 62 * 512));
    assert_eq!(entries[62], DirectoryEntry::new(PageKind::Data, 63 * 512));

    assert_eq!(table.read(last).unwrap(), padded(b"rec-122", 240));
    assert_eq!(table.read(Rid::new(60, 1)).unwrap(), padded(b"rec-121", 240));
}

#[test]
fn test_read_directory_ordinal_not_found() {
    let (_temp_dir, mut table) = setup_temp_table(512, 240);
    for i in 0..123u32 {
        table.insert(&i.to_le_bytes()).unwrap();
    }

    assert!(table.read(Rid::new(61, 0)).unwrap_err().is_not_found());
}

#[test]
fn test_read_missing_records() {
    let (_temp_dir, mut table) = setup_temp_table(512, 8);
    table.insert(b"only").unwrap();

    // Empty slot on the tail, page past the end of the file.
    assert!(table.read(Rid::new(0, 1)).unwrap_err().is_not_found());
    assert!(table.read(Rid::new(5, 0)).unwrap_err().is_not_found());
    assert!(table.read(Rid::new(u32::MAX, 0)).unwrap_err().is_not_found());
}

#[test]
fn test_reads_across_cached_pages() {
    let (_temp_dir, mut table) = setup_temp_table(512, 8);
    for i in 0..70u32 {
        table.insert(&i.to_le_bytes()).unwrap();
    }
    table.sync().unwrap();

    // Pages 0 and 1 alternate through the read cache, page 2 is the tail.
    for _ in 0..3 {
        assert_eq!(table.read(Rid::new(0, 3)).unwrap(), padded(&3u32.to_le_bytes(), 8));
        assert_eq!(table.read(Rid::new(1, 4)).unwrap(), padded(&35u32.to_le_bytes(), 8));
        assert_eq!(table.read(Rid::new(2, 7)).unwrap(), padded(&69u32.to_le_bytes(), 8));
    }
}

// =============================================================================
// Scan Tests
// =============================================================================

#[test]
fn test_scan_empty_table() {
    let (_temp_dir, mut table) = setup_temp_table(512, 8);
    assert_eq!(table.scan().count(), 0);
}

#[test]
fn test_scan_in_rid_order() {
    let (_temp_dir, mut table) = setup_temp_table(512, 8);
    let rids: Vec<Rid> = (0..40u32)
        .map(|i| table.insert(&i.to_le_bytes()).unwrap())
        .collect();

    let scanned: Vec<(Rid, Vec<u8>)> = table.scan().map(|r| r.unwrap()).collect();

    assert_eq!(scanned.len(), 40);
    for (i, (rid, record)) in scanned.iter().enumerate() {
        assert_eq!(*rid, rids[i]);
        assert_eq!(*record, padded(&(i as u32).to_le_bytes(), 8));
    }
}

#[test]
fn test_scan_skips_directory_ordinals() {
    let (_temp_dir, mut table) = setup_temp_table(512, 240);
    for i in 0..123u32 {
        table.insert(&i.to_le_bytes()).unwrap();
    }

    let tail: Vec<Rid> = table
        .scan_from(Rid::new(60, 1))
        .map(|r| r.unwrap().0)
        .collect();
    assert_eq!(tail, vec![Rid::new(60, 1), Rid::new(62, 0)]);

    let from_directory: Vec<Rid> = table
        .scan_from(Rid::new(61, 0))
        .map(|r| r.unwrap().0)
        .collect();
    assert_eq!(from_directory, vec![Rid::new(62, 0)]);

    assert_eq!(table.scan().count(), 123);
}

#[test]
fn test_scan_from_past_end() {
    let (_temp_dir, mut table) = setup_temp_table(512, 8);
    for i in 0..5u32 {
        table.insert(&i.to_le_bytes()).unwrap();
    }

    assert_eq!(table.scan_from(Rid::new(0, 3)).count(), 2);
    assert_eq!(table.scan_from(Rid::new(0, 100)).count(), 0);
    assert_eq!(table.scan_from(Rid::new(9, 0)).count(), 0);
}

// =============================================================================
// Direct I/O Tests
// =============================================================================

fn direct_io_round_trip(path: &Path) -> heapfile::Result<()> {
    let mut table = Table::create_path(path, 8)?;
    assert!(table.config().direct_io);
    assert_eq!(table.file_len(), 4096);

    let rids = (0..600u32)
        .map(|i| table.insert(&i.to_le_bytes()))
        .collect::<heapfile::Result<Vec<Rid>>>()?;
    assert_eq!(table.records_per_page(), 255);
    assert_eq!(rids[255], Rid::new(1, 0));
    assert_eq!(table.read(rids[3])?, padded(&3u32.to_le_bytes(), 8));

    table.delete(rids[3])?;
    assert_eq!(table.read(rids[3])?, padded(&599u32.to_le_bytes(), 8));

    while let Some(last) = table.data_tail_rid() {
        table.delete(last)?;
    }
    assert_eq!(table.file_len(), 4096);
    table.close()
}

#[test]
fn test_create_path_with_direct_io() {
    // tmpfs refuses O_DIRECT, so stay on the build directory's filesystem.
    let temp_dir = TempDir::new_in(env!("CARGO_TARGET_TMPDIR")).unwrap();
    let path = temp_dir.path().join("direct.bin");

    match direct_io_round_trip(&path) {
        Ok(()) => assert_eq!(std::fs::metadata(&path).unwrap().len(), 4096),
        Err(HeapError::Io(e)) if e.kind() == ErrorKind::InvalidInput => {
            eprintln!("skipping: O_DIRECT not supported here ({e})");
        }
        Err(e) => panic!("direct I/O round trip failed: {e}"),
    }
}

// =============================================================================
// Corruption Tests
// =============================================================================

#[test]
fn test_read_rejects_foreign_slot_size() {
    let (_temp_dir, mut table) = setup_temp_table(512, 8);
    for i in 0..70u32 {
        table.insert(&i.to_le_bytes()).unwrap();
    }
    table.sync().unwrap();

    // Page 0 claims 12-byte slots; this table writes 16-byte ones.
    let file = OpenOptions::new()
        .write(true)
        .open(&table.config().path)
        .unwrap();
    file.write_all_at(&12u32.to_le_bytes(), 512 + 4).unwrap();

    assert!(matches!(
        table.read(Rid::new(0, 0)),
        Err(HeapError::CorruptDirectory(_))
    ));
    // The tail is resident and unaffected.
    assert_eq!(table.read(Rid::new(2, 0)).unwrap(), padded(&62u32.to_le_bytes(), 8));
}
