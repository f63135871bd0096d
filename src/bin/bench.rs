//! heapfile Benchmark Driver
//!
//! Creates a table, inserts N records, then times a read batch
//! (sequential from a random RID, or random point reads) and a batch of
//! random deletes, printing throughput lines to stdout.

use std::time::{Duration, Instant};

use clap::Parser;
use heapfile::{Config, Rid, Table};
use rand::Rng;
use tracing_subscriber::{fmt, EnvFilter};

/// heapfile benchmark
#[derive(Parser, Debug)]
#[command(name = "heapfile-bench")]
#[command(about = "Insert/read/delete throughput for a heap-file table")]
#[command(version)]
struct Args {
    /// Page size in bytes (power of two, >= 512)
    #[arg(short = 'p', long, default_value_t = 4096, value_parser = clap::value_parser!(u32).range(1..))]
    page_size: u32,

    /// Record payload size in bytes
    #[arg(short = 's', long, default_value_t = 8, value_parser = clap::value_parser!(u32).range(1..))]
    record_size: u32,

    /// Number of records to insert
    #[arg(short = 'i', long, default_value_t = 1000, value_parser = clap::value_parser!(u32).range(1..))]
    inserts: u32,

    /// Number of records to read
    #[arg(short = 'n', long, default_value_t = 100, value_parser = clap::value_parser!(u32).range(1..))]
    interval: u32,

    /// Number of records to delete
    #[arg(short = 'd', long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..))]
    deletes: u32,

    /// Read random RIDs instead of a sequence
    #[arg(short = 'r', long)]
    random: bool,

    /// Table file
    #[arg(long, default_value = "test_db.bin")]
    path: String,

    /// Use buffered I/O instead of O_DIRECT
    #[arg(long)]
    buffered: bool,
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,heapfile=info"));

    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();

    let config = Config::builder()
        .path(&args.path)
        .page_size(args.page_size)
        .record_size(args.record_size)
        .direct_io(!args.buffered)
        .build();

    if let Err(e) = run(&args, config) {
        tracing::error!("Benchmark failed: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args, config: Config) -> heapfile::Result<()> {
    let mut table = Table::create(config)?;
    let records_per_page = table.records_per_page();
    let mut rng = rand::rng();

    // -------------------------------------------------------------------------
    // Insert
    // -------------------------------------------------------------------------
    let start = Instant::now();
    let mut inserted: u32 = 0;
    for i in 0..args.inserts {
        let record = format_record(i, args.record_size as usize);
        if let Err(e) = table.insert(&record) {
            tracing::error!("Insert failed at {}: {}", i, e);
            break;
        }
        inserted += 1;
        if i % 10_000 == 0 {
            tracing::info!("Inserted {}", i);
        }
    }
    table.sync()?;
    report("Insert", inserted, start.elapsed());

    // -------------------------------------------------------------------------
    // Read
    // -------------------------------------------------------------------------
    let start = Instant::now();
    if args.random {
        let mut read = 0;
        for _ in 0..args.interval {
            let rid = random_rid(&mut rng, records_per_page, inserted);
            match table.read(rid) {
                Ok(record) => tracing::debug!("{}: {}", rid, display_record(&record)),
                Err(e) if e.is_not_found() => tracing::debug!("{}: not found", rid),
                Err(e) => return Err(e),
            }
            read += 1;
        }
        report("Random read", read, start.elapsed());
    } else {
        let layout = *table.layout();
        let first = random_rid(&mut rng, records_per_page, inserted);
        let mut next = if layout.is_data_page(first.page_id()) {
            Some(first)
        } else {
            layout
                .next_data_ordinal(first.page_id())
                .map(|page_id| Rid::new(page_id, first.slot_id()))
        };

        // Every attempt counts, hit or miss.
        let mut read = 0;
        while let Some(rid) = next.filter(|_| read < args.interval) {
            match table.read(rid) {
                Ok(record) => tracing::debug!("{}: {}", rid, display_record(&record)),
                Err(e) if e.is_not_found() => tracing::debug!("{}: not found", rid),
                Err(e) => return Err(e),
            }
            read += 1;
            next = layout.next_rid(rid, records_per_page);
        }
        report("Sequential read", read, start.elapsed());
    }

    // -------------------------------------------------------------------------
    // Delete
    // -------------------------------------------------------------------------
    let start = Instant::now();
    let mut deleted = 0;
    for i in 0..args.deletes {
        let live = inserted.saturating_sub(i);
        let rid = random_rid(&mut rng, records_per_page, live);
        match table.delete(rid) {
            Ok(()) => deleted += 1,
            Err(e) if e.is_not_found() => tracing::debug!("{}: nothing to delete", rid),
            Err(e) => return Err(e),
        }
    }
    table.sync()?;
    report("Random delete", deleted, start.elapsed());

    table.close()
}

/// Decimal rendering of `i`, truncated to leave a trailing NUL
fn format_record(i: u32, record_size: usize) -> Vec<u8> {
    let mut record = i.to_string().into_bytes();
    record.truncate(record_size.saturating_sub(1));
    record
}

fn display_record(record: &[u8]) -> String {
    let end = record.iter().position(|&b| b == 0).unwrap_or(record.len());
    String::from_utf8_lossy(&record[..end]).into_owned()
}

/// A RID somewhere inside the first `live` records' worth of data pages
///
/// Directory ordinals and slots past the tail's last record are not
/// filtered out; reading them simply misses.
fn random_rid(rng: &mut impl Rng, records_per_page: u32, live: u32) -> Rid {
    let page_id = if live >= records_per_page {
        rng.random_range(0..live / records_per_page)
    } else {
        0
    };
    let slot_id = rng.random_range(0..records_per_page);
    Rid::new(page_id, slot_id)
}

fn report(what: &str, count: u32, elapsed: Duration) {
    let per_sec = if elapsed.as_secs_f64() > 0.0 {
        f64::from(count) / elapsed.as_secs_f64()
    } else {
        f64::INFINITY
    };
    println!(
        "{} of {} records took {} sec {} nsec ({:.0} records/sec)",
        what,
        count,
        elapsed.as_secs(),
        elapsed.subsec_nanos(),
        per_sec
    );
}
