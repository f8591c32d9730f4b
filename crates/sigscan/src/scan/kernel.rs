//! The vectorized first-occurrence kernel, generic over [`Lane`]
//!
//! Three entry points share one algorithm:
//!
//! - [`find_aligned`] is the inner loop proper. It walks a `WIDTH`-aligned
//!   buffer one lane at a time, filters candidate start offsets with per-byte
//!   equality predicates, and verifies survivors with shifted pattern lanes.
//!   It may read past the end of the buffer up to the enclosing aligned block
//!   boundary, which is the caller's contract to make safe.
//! - [`find_raw`] adapts an arbitrarily aligned pointer to `find_aligned` by
//!   walking back to the previous aligned address and probing the first lane
//!   with a wildcard-widened copy of the pattern, then scanning the aligned
//!   remainder.
//! - [`find_slice`] is the bounded variant for safe callers: a scalar prefix
//!   over the unaligned head, whole lanes only over the aligned interior
//!   (candidates verified bytewise, never reading past the slice), and a
//!   scalar tail.

use super::backends::scalar;
use super::lane::{pattern_window, Lane};

/// The `count` highest bits of a `width`-bit candidate mask: starts the
/// in-lane filter cannot rule out because the probed pattern byte falls in
/// the next lane.
#[inline(always)]
fn unpruned_bits(width: usize, count: usize) -> u64 {
    debug_assert!(count >= 1 && count < width && width <= 64);
    let lane_bits = if width == 64 { u64::MAX } else { (1 << width) - 1 };
    lane_bits & (lane_bits << (width - count))
}

/// First occurrence of `(data, mask, pat_len)` in the `len` bytes at `ptr`,
/// leftmost first. `only_first` restricts candidate generation to the lane at
/// offset 0; it is the one entry through which a leading zero mask byte is
/// legal, because the widened pattern of [`find_raw`] arrives here.
///
/// # Safety
/// - the CPU supports `L`
/// - `ptr` is aligned to `L::WIDTH`
/// - every `L::WIDTH`-aligned block that holds at least one of the `len`
///   buffer bytes is valid for reads (the scan reads whole blocks, so up to
///   `WIDTH - 1` bytes past `ptr + len`)
pub(crate) unsafe fn find_aligned<L: Lane>(
    ptr: *const u8,
    len: usize,
    data: &[u8],
    mask: &[u8],
    pat_len: usize,
    only_first: bool,
) -> Option<usize> {
    let w = L::WIDTH;
    debug_assert!(ptr as usize % w == 0);
    debug_assert!(pat_len >= 1);
    debug_assert!(data.len() >= pat_len && mask.len() >= pat_len);

    if len < pat_len {
        return None;
    }

    // SAFETY (for all lane ops below): the caller guarantees CPU support
    let first_mask = unsafe { L::splat(mask[0]) };
    let first_data = unsafe { L::splat(data[0]) };
    let head_mask = unsafe { pattern_window::<L>(mask, 0) };
    let head_data = unsafe { pattern_window::<L>(data, 0) };
    let filter_end = w.min(pat_len);

    let mut base = 0;
    loop {
        // SAFETY: base is a multiple of w and base < len, so this block holds
        // a buffer byte and is readable per the caller's contract
        let word = unsafe { L::load(ptr.add(base)) };

        // bit k: the first pattern byte admits a match starting at base + k
        let mut candidates = unsafe { word.and(first_mask).eq_mask(first_data) };

        // Early reject: pattern byte `offs` must show up `offs` elements
        // above the start. Starts in the top `offs` positions keep their bit
        // since that byte lives in the next lane.
        let mut offs = 1;
        while candidates != 0 && offs < filter_end {
            if mask[offs] != 0 {
                let pred = unsafe {
                    word.and(L::splat(mask[offs])).eq_mask(L::splat(data[offs]))
                };
                candidates &= (pred >> offs) | unpruned_bits(w, offs);
            }
            offs += 1;
        }

        while candidates != 0 {
            let k = candidates.trailing_zeros() as usize;
            candidates &= candidates - 1;

            let at = base + k;
            if at + pat_len > len {
                // every remaining start is further right, so nothing fits
                return None;
            }
            // SAFETY: at + pat_len <= len keeps every verify load inside a
            // block holding a buffer byte
            if unsafe { verify::<L>(ptr, word, base, k, head_mask, head_data, data, mask, pat_len) }
            {
                return Some(at);
            }
        }

        base += w;
        if only_first || base >= len {
            return None;
        }
    }
}

/// Check the full pattern against the candidate at `base + k`, where `word`
/// is the already-loaded lane at `base`.
///
/// # Safety
/// Same contract as [`find_aligned`], plus `base + k + pat_len <= len`.
#[allow(clippy::too_many_arguments)]
#[inline(always)]
unsafe fn verify<L: Lane>(
    ptr: *const u8,
    word: L,
    base: usize,
    k: usize,
    head_mask: L,
    head_data: L,
    data: &[u8],
    mask: &[u8],
    pat_len: usize,
) -> bool {
    let w = L::WIDTH;

    // Slide the first pattern lane up to the candidate: element k + j of the
    // shifted lane is pattern position j. Padding past the pattern shifts in
    // as zero mask bytes, which match anything.
    unsafe {
        let shifted_mask = head_mask.shift_right(k);
        let shifted_data = head_data.shift_right(k);
        if !word.and(shifted_mask).reduce_all_eq(shifted_data) {
            return false;
        }
    }

    // w - k pattern bytes are confirmed; continue one aligned lane at a time
    // against the matching window of the pattern arrays.
    let mut done = w - k;
    let mut lane = base + w;
    while done < pat_len {
        unsafe {
            let next = L::load(ptr.add(lane));
            let window_mask = pattern_window::<L>(mask, done);
            let window_data = pattern_window::<L>(data, done);
            if !next.and(window_mask).reduce_all_eq(window_data) {
                return false;
            }
        }
        done += w;
        lane += w;
    }

    true
}

/// First occurrence at any alignment, full speed. Reduces to one or two
/// [`find_aligned`] calls.
///
/// # Safety
/// - the CPU supports `L`
/// - every `L::WIDTH`-aligned block overlapping `ptr..ptr + len` is valid
///   for reads
pub(crate) unsafe fn find_raw<L: Lane>(
    ptr: *const u8,
    len: usize,
    data: &[u8],
    mask: &[u8],
    pat_len: usize,
) -> Option<usize> {
    let w = L::WIDTH;
    let shortfall = ptr as usize & (w - 1);

    if shortfall == 0 {
        // SAFETY: forwarded caller contract, ptr is aligned
        return unsafe { find_aligned::<L>(ptr, len, data, mask, pat_len, false) };
    }

    if len < pat_len {
        return None;
    }

    // Probe the lane enclosing the buffer start with a widened pattern: the
    // wildcard prefix absorbs exactly the walk-back bytes, so a widened match
    // at offset k is a user match at offset k. Only candidate generation is
    // confined to that lane; verification follows the pattern as far as it
    // needs.
    let mut wide_data = vec![0; shortfall + pat_len];
    let mut wide_mask = vec![0; shortfall + pat_len];
    wide_data[shortfall..].copy_from_slice(&data[..pat_len]);
    wide_mask[shortfall..].copy_from_slice(&mask[..pat_len]);

    let hit = unsafe {
        find_aligned::<L>(
            ptr.sub(shortfall),
            len + shortfall,
            &wide_data,
            &wide_mask,
            shortfall + pat_len,
            true,
        )
    };
    if hit.is_some() {
        return hit;
    }

    // Scan the remainder from the next aligned address. Starts below `skip`
    // were all covered by the probe.
    let skip = w - shortfall;
    if len <= skip {
        return None;
    }
    // SAFETY: ptr + skip is aligned and still inside the buffer
    unsafe { find_aligned::<L>(ptr.add(skip), len - skip, data, mask, pat_len, false) }
        .map(|i| i + skip)
}

/// First occurrence within a slice, never reading outside it: scalar over the
/// unaligned head (every start up to and including the first aligned one),
/// SIMD candidate filtering over whole lanes with bytewise verification, and
/// a scalar tail for the last partial lane.
///
/// `COMPACT` drops the multi-offset filter, trading candidate quality for
/// less code.
///
/// # Safety
/// The CPU supports `L`.
pub(crate) unsafe fn find_slice<L: Lane, const COMPACT: bool>(
    haystack: &[u8],
    data: &[u8],
    mask: &[u8],
    pat_len: usize,
) -> Option<usize> {
    let w = L::WIDTH;
    let len = haystack.len();
    debug_assert!(pat_len >= 1);

    if len < pat_len {
        return None;
    }

    let misalign = haystack.as_ptr() as usize & (w - 1);
    let head = if misalign == 0 { 0 } else { w - misalign };

    // Starts 0..=head, one past the last unaligned one, so a match straddling
    // the first lane boundary is caught here.
    let prefix_end = len.min(pat_len + head);
    if let Some(i) = scalar::find(&haystack[..prefix_end], data, mask, pat_len) {
        return Some(i);
    }
    if prefix_end == len {
        return None;
    }

    let body = &haystack[head..];
    let whole = body.len() & !(w - 1);

    // SAFETY (lane ops): the caller guarantees CPU support
    let first_mask = unsafe { L::splat(mask[0]) };
    let first_data = unsafe { L::splat(data[0]) };
    let filter_end = w.min(pat_len);

    let mut base = 0;
    while base < whole {
        // SAFETY: body is w-aligned and base + w <= whole <= body.len()
        let word = unsafe { L::load(body.as_ptr().add(base)) };

        let mut candidates = unsafe { word.and(first_mask).eq_mask(first_data) };

        if !COMPACT {
            let mut offs = 1;
            while candidates != 0 && offs < filter_end {
                if mask[offs] != 0 {
                    let pred = unsafe {
                        word.and(L::splat(mask[offs])).eq_mask(L::splat(data[offs]))
                    };
                    candidates &= (pred >> offs) | unpruned_bits(w, offs);
                }
                offs += 1;
            }
        }

        while candidates != 0 {
            let k = candidates.trailing_zeros() as usize;
            candidates &= candidates - 1;

            let at = base + k;
            if at + pat_len > body.len() {
                return None;
            }
            if scalar::matches_at(body, at, data, mask, pat_len) {
                return Some(head + at);
            }
        }

        base += w;
    }

    // Starts in the final partial lane.
    scalar::find(&body[whole..], data, mask, pat_len).map(|i| head + whole + i)
}
