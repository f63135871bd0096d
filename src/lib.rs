//! # heapfile
//!
//! A heap-file storage engine for fixed-length records:
//! - One data file of self-describing, fixed-size pages
//! - A directory chain cataloging every allocated page
//! - 64-bit record identifiers decoded arithmetically, no directory lookup
//! - Append-only insert, point read, swap-delete with file shrinkage
//! - Block-aligned I/O, optionally O_DIRECT
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Table                              │
//! │         insert / read / delete / scan / sync / close        │
//! └──────────┬──────────────────┬───────────────────┬───────────┘
//!            │                  │                   │
//!            ▼                  ▼                   ▼
//!   ┌────────────────┐  ┌───────────────┐  ┌─────────────────┐
//!   │  PageLayout    │  │ Resident pages│  │   PageFile      │
//!   │ (RID → offset) │  │ dir/data tail │  │ (aligned I/O)   │
//!   └────────────────┘  │ + read cache  │  └─────────────────┘
//!                       └───────┬───────┘
//!                               ▼
//!                       ┌───────────────┐
//!                       │ Slotted Page  │
//!                       └───────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use heapfile::{Config, Table};
//!
//! let config = Config::builder()
//!     .path("records.bin")
//!     .page_size(4096)
//!     .record_size(32)
//!     .build();
//! let mut table = Table::create(config)?;
//!
//! let rid = table.insert(b"hello")?;
//! assert_eq!(&table.read(rid)?[..5], b"hello");
//! table.delete(rid)?;
//! table.close()?;
//! # Ok::<(), heapfile::HeapError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod storage;
pub mod page;
pub mod rid;
pub mod table;
pub mod inspect;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{HeapError, Result};
pub use config::Config;
pub use rid::Rid;
pub use table::Table;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of heapfile
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
