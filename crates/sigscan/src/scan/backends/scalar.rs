//! Scalar pattern scanning backend
//!
//! Byte-at-a-time reference matcher: the oracle the vector backends are
//! tested against, the prefix/tail scanner of the bounded slice path, and
//! the fallback on targets without a SIMD backend.

/// True iff the pattern matches at `haystack[at..]`. Requires
/// `at + pat_len <= haystack.len()`.
#[inline]
pub(crate) fn matches_at(
    haystack: &[u8],
    at: usize,
    data: &[u8],
    mask: &[u8],
    pat_len: usize,
) -> bool {
    debug_assert!(at + pat_len <= haystack.len());

    for j in 0..pat_len {
        if mask[j] == 0x00 {
            continue;
        }
        if haystack[at + j] & mask[j] != data[j] {
            return false;
        }
    }

    true
}

/// Find the first occurrence of the pattern in `haystack`, one candidate
/// offset at a time.
pub(crate) fn find(haystack: &[u8], data: &[u8], mask: &[u8], pat_len: usize) -> Option<usize> {
    debug_assert!(pat_len >= 1);

    let last = haystack.len().checked_sub(pat_len)?;
    (0..=last).find(|&i| matches_at(haystack, i, data, mask, pat_len))
}

/// Pointer form of [`find`] for the raw entry points.
///
/// # Safety
/// `ptr` is valid for `len` bytes of reads.
pub(crate) unsafe fn find_raw(
    ptr: *const u8,
    len: usize,
    data: &[u8],
    mask: &[u8],
    pat_len: usize,
) -> Option<usize> {
    // SAFETY: caller guarantees ptr..ptr + len is readable
    let haystack = unsafe { core::slice::from_raw_parts(ptr, len) };
    find(haystack, data, mask, pat_len)
}
