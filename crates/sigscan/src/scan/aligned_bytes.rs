//! Aligned, zero-padded byte storage for compiled patterns

use core::slice;
use std::{
    alloc::{alloc_zeroed, dealloc, handle_alloc_error, Layout, LayoutError},
    marker::PhantomData,
    ops::Deref,
    ptr::{self, NonNull},
};

#[derive(Debug, thiserror::Error)]
pub enum AlignedBytesError {
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

/// Heap bytes whose base address is aligned to `align` and whose length is
/// `src.len()` rounded up to a multiple of `align`, the excess zero-filled.
#[derive(Debug)]
#[repr(C)]
pub(crate) struct AlignedBytes {
    data: *mut u8,
    len: usize,
    layout: Option<Layout>,
    _phantom: PhantomData<Vec<u8>>,
}

unsafe impl Send for AlignedBytes {}
unsafe impl Sync for AlignedBytes {}

impl AlignedBytes {
    /// Copy `src` into fresh aligned storage, padded with zeroes to the next
    /// multiple of `align`. `align` must be a power of two.
    pub(crate) fn padded(src: &[u8], align: usize) -> Result<AlignedBytes, AlignedBytesError> {
        if src.is_empty() {
            let slf = Self {
                data: NonNull::dangling().as_ptr(),
                len: 0,
                layout: None,
                _phantom: PhantomData,
            };

            return Ok(slf);
        }

        let size = src.len().div_ceil(align) * align;
        let layout = Layout::from_size_align(size, align)?;

        // SAFETY: layout has non-zero size
        let ptr = unsafe { alloc_zeroed(layout) };

        if ptr.is_null() {
            handle_alloc_error(layout);
        }

        // SAFETY: the allocation holds `size >= src.len()` bytes
        unsafe {
            ptr::copy_nonoverlapping(src.as_ptr(), ptr, src.len());
        }

        let slf = Self {
            data: ptr,
            len: size,
            layout: Some(layout),
            _phantom: PhantomData,
        };

        Ok(slf)
    }
}

impl Deref for AlignedBytes {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        // SAFETY: data points at len initialized bytes (or is a dangling
        // pointer with len 0)
        unsafe { slice::from_raw_parts(self.data, self.len) }
    }
}

impl Drop for AlignedBytes {
    fn drop(&mut self) {
        if let Some(layout) = self.layout.take() {
            // SAFETY: data was allocated with this exact layout
            unsafe { dealloc(self.data, layout) }
        }
    }
}
