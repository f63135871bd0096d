//! heapfile CLI
//!
//! Offline inspection of a closed table file.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use heapfile::inspect::{inspect, TableReport};
use heapfile::page::PageKind;
use tracing_subscriber::{fmt, EnvFilter};

/// heapfile CLI
#[derive(Parser, Debug)]
#[command(name = "heapfile-cli")]
#[command(about = "Inspect heap-file table files")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate the directory chain and print a summary
    Inspect {
        /// The table file
        path: PathBuf,

        /// Page size the file was written with
        #[arg(short, long, default_value_t = 4096)]
        page_size: u32,
    },

    /// List every directory entry in allocation order
    Entries {
        /// The table file
        path: PathBuf,

        /// Page size the file was written with
        #[arg(short, long, default_value_t = 4096)]
        page_size: u32,
    },
}

fn main() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,heapfile=info"));
    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();

    let result = match &args.command {
        Commands::Inspect { path, page_size } => {
            inspect(path, *page_size).map(|report| print_summary(&report))
        }
        Commands::Entries { path, page_size } => {
            inspect(path, *page_size).map(|report| print_entries(&report))
        }
    };

    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn print_summary(report: &TableReport) {
    println!("page size:        {}", report.page_size);
    println!("file length:      {}", report.file_len);
    println!("directory pages:  {}", report.directory_pages);
    println!("data pages:       {}", report.data_pages);
    println!("records:          {}", report.records);
    match report.record_size {
        Some(size) => println!("record size:      {}", size),
        None => println!("record size:      -"),
    }
}

fn print_entries(report: &TableReport) {
    for (i, entry) in report.entries.iter().enumerate() {
        let kind = match entry.kind {
            PageKind::Data => "data",
            PageKind::Directory => "directory",
        };
        let ordinal = entry.offset / report.page_size - 1;
        println!("{:>6}  {:<9}  ordinal {:>6}  offset {}", i, kind, ordinal, entry.offset);
    }
}
