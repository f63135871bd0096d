//! Aligned page buffers
//!
//! O_DIRECT requires the user buffer, the file offset and the transfer
//! length to be multiples of the device block size. Every page buffer is
//! therefore allocated aligned to the page size itself, which is a power of
//! two no smaller than the 512-byte block.

use std::alloc::{self, Layout};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;
use std::slice;

use crate::error::{HeapError, Result};

/// A zero-initialized heap buffer with guaranteed alignment
pub struct AlignedBuffer {
    ptr: NonNull<u8>,
    layout: Layout,
}

// SAFETY: AlignedBuffer owns its memory and doesn't share it
unsafe impl Send for AlignedBuffer {}
unsafe impl Sync for AlignedBuffer {}

impl AlignedBuffer {
    /// Allocate `size` zeroed bytes aligned to `alignment`
    ///
    /// Fails with `InvalidConfig` when `size` is zero or `alignment` is not a
    /// power of two.
    pub fn new(size: usize, alignment: usize) -> Result<Self> {
        if size == 0 {
            return Err(HeapError::InvalidConfig(
                "buffer size must be greater than 0".to_string(),
            ));
        }

        let layout = Layout::from_size_align(size, alignment).map_err(|e| {
            HeapError::InvalidConfig(format!("bad buffer layout ({size}, {alignment}): {e}"))
        })?;

        // SAFETY: layout has a non-zero size (checked above)
        let raw = unsafe { alloc::alloc_zeroed(layout) };
        let ptr = match NonNull::new(raw) {
            Some(ptr) => ptr,
            None => alloc::handle_alloc_error(layout),
        };

        Ok(Self { ptr, layout })
    }

    /// Returns the size of the buffer in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.layout.size()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.layout.size() == 0
    }

    /// Returns the alignment of the buffer
    #[inline]
    pub fn alignment(&self) -> usize {
        self.layout.align()
    }

    /// Checks if the buffer start is aligned to `alignment`
    #[inline]
    pub fn is_aligned_to(&self, alignment: usize) -> bool {
        (self.ptr.as_ptr() as usize) % alignment == 0
    }

    /// Fills the entire buffer with zeros
    pub fn zero(&mut self) {
        self.fill(0);
    }
}

impl Drop for AlignedBuffer {
    fn drop(&mut self) {
        // SAFETY: ptr was allocated with exactly this layout
        unsafe {
            alloc::dealloc(self.ptr.as_ptr(), self.layout);
        }
    }
}

impl Deref for AlignedBuffer {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &Self::Target {
        // SAFETY: ptr is valid for layout.size() initialized bytes
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.layout.size()) }
    }
}

impl DerefMut for AlignedBuffer {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        // SAFETY: ptr is valid, and &mut self guarantees exclusive access
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.layout.size()) }
    }
}

impl fmt::Debug for AlignedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlignedBuffer")
            .field("size", &self.layout.size())
            .field("alignment", &self.layout.align())
            .finish()
    }
}
