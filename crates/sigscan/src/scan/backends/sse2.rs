//! SSE2 pattern scanning backend
//!
//! Baseline x86_64 tier: every x86_64 CPU has SSE2, so this backend needs no
//! feature detection. 16-byte lanes.

use std::arch::x86_64::{
    __m128i, _mm_and_si128, _mm_cmpeq_epi8, _mm_load_si128, _mm_loadu_si128, _mm_movemask_epi8,
    _mm_set1_epi8, _mm_storeu_si128,
};

use crate::scan::kernel;
use crate::scan::lane::Lane;

#[derive(Clone, Copy)]
pub(crate) struct Sse2(__m128i);

impl Lane for Sse2 {
    const WIDTH: usize = 16;

    #[inline(always)]
    unsafe fn load(ptr: *const u8) -> Self {
        // SAFETY: caller passes a 16-aligned readable address
        Self(unsafe { _mm_load_si128(ptr.cast()) })
    }

    #[inline(always)]
    unsafe fn load_unaligned(ptr: *const u8) -> Self {
        // SAFETY: caller passes a readable address
        Self(unsafe { _mm_loadu_si128(ptr.cast()) })
    }

    #[inline(always)]
    unsafe fn store_unaligned(self, ptr: *mut u8) {
        // SAFETY: caller passes a writable address
        unsafe { _mm_storeu_si128(ptr.cast(), self.0) }
    }

    #[inline(always)]
    #[allow(unused_unsafe)]
    unsafe fn splat(byte: u8) -> Self {
        // SAFETY: SSE2 is part of the x86_64 baseline
        Self(unsafe { _mm_set1_epi8(byte as i8) })
    }

    #[inline(always)]
    #[allow(unused_unsafe)]
    unsafe fn and(self, other: Self) -> Self {
        // SAFETY: SSE2 is part of the x86_64 baseline
        Self(unsafe { _mm_and_si128(self.0, other.0) })
    }

    #[inline(always)]
    #[allow(unused_unsafe)]
    unsafe fn eq_mask(self, other: Self) -> u64 {
        // SAFETY: SSE2 is part of the x86_64 baseline
        unsafe { _mm_movemask_epi8(_mm_cmpeq_epi8(self.0, other.0)) as u16 as u64 }
    }

    #[inline(always)]
    #[allow(unused_unsafe)]
    unsafe fn reduce_all_eq(self, other: Self) -> bool {
        // SAFETY: SSE2 is part of the x86_64 baseline
        unsafe { _mm_movemask_epi8(_mm_cmpeq_epi8(self.0, other.0)) == 0xffff }
    }
}

/// # Safety
/// Every 16-aligned block overlapping `ptr..ptr + len` is valid for reads.
pub(crate) unsafe fn find_raw(
    ptr: *const u8,
    len: usize,
    data: &[u8],
    mask: &[u8],
    pat_len: usize,
) -> Option<usize> {
    // SAFETY: SSE2 is part of the x86_64 baseline; read contract forwarded
    unsafe { kernel::find_raw::<Sse2>(ptr, len, data, mask, pat_len) }
}

pub(crate) fn find_slice(
    haystack: &[u8],
    data: &[u8],
    mask: &[u8],
    pat_len: usize,
    compact: bool,
) -> Option<usize> {
    // SAFETY: SSE2 is part of the x86_64 baseline
    unsafe {
        if compact {
            kernel::find_slice::<Sse2, true>(haystack, data, mask, pat_len)
        } else {
            kernel::find_slice::<Sse2, false>(haystack, data, mask, pat_len)
        }
    }
}
