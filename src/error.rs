//! Error types for heapfile
//!
//! Provides a unified error type for all table and page operations.

use thiserror::Error;

/// Result type alias using HeapError
pub type Result<T> = std::result::Result<T, HeapError>;

/// Unified error type for heapfile operations
#[derive(Debug, Error)]
pub enum HeapError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Page Errors
    // -------------------------------------------------------------------------
    #[error("Page full: slot {slot_id} is beyond capacity {capacity}")]
    PageFull { slot_id: u32, capacity: u32 },

    #[error("Record too large: {size} bytes, payload holds {max}")]
    RecordTooLarge { size: usize, max: usize },

    #[error("Buffer too small: record is {needed} bytes, buffer holds {available}")]
    BufferTooSmall { needed: usize, available: usize },

    // -------------------------------------------------------------------------
    // Lookup Errors
    // -------------------------------------------------------------------------
    #[error("Record not found")]
    NotFound,

    // -------------------------------------------------------------------------
    // Consistency Errors
    // -------------------------------------------------------------------------
    #[error("Directory corruption detected: {0}")]
    CorruptDirectory(String),

    #[error("File too large: next page offset does not fit in 32 bits")]
    FileTooLarge,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    InvalidConfig(String),
}

impl HeapError {
    /// True for the "absent record" outcome, as opposed to a real failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, HeapError::NotFound)
    }
}
