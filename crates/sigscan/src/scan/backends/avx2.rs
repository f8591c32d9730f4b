//! AVX2 pattern scanning backend
//!
//! 32-byte lanes. Selected at runtime when the CPU advertises AVX2; every
//! entry point carries `#[target_feature]` so the generic kernel specializes
//! into AVX2 code.

use std::arch::x86_64::{
    __m256i, _mm256_and_si256, _mm256_cmpeq_epi8, _mm256_load_si256, _mm256_loadu_si256,
    _mm256_movemask_epi8, _mm256_set1_epi8, _mm256_storeu_si256,
};

use crate::scan::kernel;
use crate::scan::lane::Lane;

#[derive(Clone, Copy)]
pub(crate) struct Avx2(__m256i);

impl Lane for Avx2 {
    const WIDTH: usize = 32;

    #[inline(always)]
    unsafe fn load(ptr: *const u8) -> Self {
        // SAFETY: caller passes a 32-aligned readable address and has AVX2
        Self(unsafe { _mm256_load_si256(ptr.cast()) })
    }

    #[inline(always)]
    unsafe fn load_unaligned(ptr: *const u8) -> Self {
        // SAFETY: caller passes a readable address and has AVX2
        Self(unsafe { _mm256_loadu_si256(ptr.cast()) })
    }

    #[inline(always)]
    unsafe fn store_unaligned(self, ptr: *mut u8) {
        // SAFETY: caller passes a writable address and has AVX2
        unsafe { _mm256_storeu_si256(ptr.cast(), self.0) }
    }

    #[inline(always)]
    #[allow(unused_unsafe)]
    unsafe fn splat(byte: u8) -> Self {
        // SAFETY: caller has AVX2
        Self(unsafe { _mm256_set1_epi8(byte as i8) })
    }

    #[inline(always)]
    #[allow(unused_unsafe)]
    unsafe fn and(self, other: Self) -> Self {
        // SAFETY: caller has AVX2
        Self(unsafe { _mm256_and_si256(self.0, other.0) })
    }

    #[inline(always)]
    #[allow(unused_unsafe)]
    unsafe fn eq_mask(self, other: Self) -> u64 {
        // SAFETY: caller has AVX2
        unsafe { _mm256_movemask_epi8(_mm256_cmpeq_epi8(self.0, other.0)) as u32 as u64 }
    }

    #[inline(always)]
    #[allow(unused_unsafe)]
    unsafe fn reduce_all_eq(self, other: Self) -> bool {
        // SAFETY: caller has AVX2
        unsafe { _mm256_movemask_epi8(_mm256_cmpeq_epi8(self.0, other.0)) == -1 }
    }
}

/// # Safety
/// The CPU supports AVX2, and every 32-aligned block overlapping
/// `ptr..ptr + len` is valid for reads.
#[target_feature(enable = "avx2")]
pub(crate) unsafe fn find_raw(
    ptr: *const u8,
    len: usize,
    data: &[u8],
    mask: &[u8],
    pat_len: usize,
) -> Option<usize> {
    // SAFETY: read contract forwarded; AVX2 established by this function
    unsafe { kernel::find_raw::<Avx2>(ptr, len, data, mask, pat_len) }
}

/// # Safety
/// The CPU supports AVX2.
#[target_feature(enable = "avx2")]
pub(crate) unsafe fn find_slice(
    haystack: &[u8],
    data: &[u8],
    mask: &[u8],
    pat_len: usize,
    compact: bool,
) -> Option<usize> {
    // SAFETY: AVX2 established by this function
    unsafe {
        if compact {
            kernel::find_slice::<Avx2, true>(haystack, data, mask, pat_len)
        } else {
            kernel::find_slice::<Avx2, false>(haystack, data, mask, pat_len)
        }
    }
}
