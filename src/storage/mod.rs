//! Storage Module
//!
//! Block-level access to the table's data file.
//!
//! ## Responsibilities
//! - Page-size, page-aligned buffers (required by O_DIRECT)
//! - Positional whole-page reads and writes
//! - Explicit durability barriers (fsync) and file truncation
//!
//! ## File Layout
//! ```text
//! offset 0            page_size          2*page_size
//! ┌───────────────────┬──────────────────┬──────────────────┬─────
//! │ Root Directory    │ ordinal 0 (Data) │ ordinal 1 (Data) │ ...
//! └───────────────────┴──────────────────┴──────────────────┴─────
//!   ordinal (K-1), (2K-1), ... are Directory pages, K = directory fan-out
//! ```

mod aligned;
mod file;

pub use aligned::AlignedBuffer;
pub use file::PageFile;
