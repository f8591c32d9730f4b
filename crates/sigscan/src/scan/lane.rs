//! SIMD lane abstraction the scan kernel is generic over
//!
//! A [`Lane`] is one register's worth of buffer bytes. The kernel only ever
//! touches lanes through the operations below, so a backend is a thin newtype
//! over its vector type plus `#[target_feature]` entry wrappers. All methods
//! are `unsafe` for the same reason: the caller must guarantee the CPU
//! supports the backing instruction set, which the entry wrappers establish
//! once per scan.

/// Scratch size for the spill-based shifts. Large enough for two of the
/// widest lane.
const SPILL: usize = 128;

pub(crate) trait Lane: Copy {
    /// Lane width in bytes. A power of two, at most 64.
    const WIDTH: usize;

    /// Load from a `WIDTH`-aligned address.
    ///
    /// # Safety
    /// `ptr` is aligned to `WIDTH` and valid for `WIDTH` bytes of reads.
    unsafe fn load(ptr: *const u8) -> Self;

    /// Load from any address.
    ///
    /// # Safety
    /// `ptr` is valid for `WIDTH` bytes of reads.
    unsafe fn load_unaligned(ptr: *const u8) -> Self;

    /// Store to any address.
    ///
    /// # Safety
    /// `ptr` is valid for `WIDTH` bytes of writes.
    unsafe fn store_unaligned(self, ptr: *mut u8);

    /// Broadcast one byte to every element.
    ///
    /// # Safety
    /// The CPU supports this lane type.
    unsafe fn splat(byte: u8) -> Self;

    /// Elementwise AND.
    ///
    /// # Safety
    /// The CPU supports this lane type.
    unsafe fn and(self, other: Self) -> Self;

    /// Elementwise equality as a bitmask: bit `k` is set iff byte `k` (the
    /// byte at the lowest address being bit 0) compares equal.
    ///
    /// # Safety
    /// The CPU supports this lane type.
    unsafe fn eq_mask(self, other: Self) -> u64;

    /// True iff every byte of `self` equals the corresponding byte of
    /// `other`.
    ///
    /// # Safety
    /// The CPU supports this lane type.
    unsafe fn reduce_all_eq(self, other: Self) -> bool;

    /// Shift elements toward higher indices by `count`, zero-filling from
    /// the low end. (Note this moves bytes toward *higher* addresses, which
    /// x86 calls a left shift.)
    ///
    /// # Safety
    /// The CPU supports this lane type. `count < WIDTH`.
    #[inline(always)]
    unsafe fn shift_right(self, count: usize) -> Self {
        debug_assert!(count < Self::WIDTH);
        let mut spill = [0u8; SPILL];
        // SAFETY: count + WIDTH <= 2 * WIDTH <= SPILL, so both accesses stay
        // inside the zeroed scratch
        unsafe {
            self.store_unaligned(spill.as_mut_ptr().add(count));
            Self::load_unaligned(spill.as_ptr())
        }
    }

    /// Shift elements toward lower indices by `count`, zero-filling from the
    /// high end.
    ///
    /// # Safety
    /// The CPU supports this lane type. `count < WIDTH`.
    #[inline(always)]
    unsafe fn shift_left(self, count: usize) -> Self {
        debug_assert!(count < Self::WIDTH);
        let mut spill = [0u8; SPILL];
        // SAFETY: count + WIDTH <= 2 * WIDTH <= SPILL
        unsafe {
            self.store_unaligned(spill.as_mut_ptr());
            Self::load_unaligned(spill.as_ptr().add(count))
        }
    }
}

/// Materialize `WIDTH` pattern bytes starting at `at`, zero-extended past the
/// end of the array. Zero mask bytes match anything, so the extension is
/// exactly the logical padding the kernel relies on.
///
/// # Safety
/// The CPU supports `L`. `at <= bytes.len()`.
#[inline(always)]
pub(crate) unsafe fn pattern_window<L: Lane>(bytes: &[u8], at: usize) -> L {
    debug_assert!(at <= bytes.len());

    if at + L::WIDTH <= bytes.len() {
        // SAFETY: the whole window is inside the slice
        unsafe { L::load_unaligned(bytes.as_ptr().add(at)) }
    } else {
        let mut window = [0u8; 64];
        let rest = bytes.len() - at;
        window[..rest].copy_from_slice(&bytes[at..]);
        // SAFETY: WIDTH <= 64 bytes are readable from the scratch window
        unsafe { L::load_unaligned(window.as_ptr()) }
    }
}

#[cfg(all(test, target_arch = "x86_64"))]
mod tests {
    use super::*;
    use crate::scan::backends::sse2::Sse2;

    fn bytes_of(lane: Sse2) -> [u8; 16] {
        let mut out = [0u8; 16];
        unsafe { lane.store_unaligned(out.as_mut_ptr()) };
        out
    }

    #[test]
    fn eq_mask_bit_zero_is_lowest_address() {
        let data: [u8; 16] = [7, 0, 0, 0, 0, 0, 0, 7, 0, 0, 0, 0, 0, 0, 0, 7];
        unsafe {
            let lane = Sse2::load_unaligned(data.as_ptr());
            let mask = lane.eq_mask(Sse2::splat(7));
            assert_eq!(mask, 1 | 1 << 7 | 1 << 15);
        }
    }

    #[test]
    fn shift_right_moves_toward_higher_indices() {
        let data: [u8; 16] = core::array::from_fn(|i| i as u8 + 1);
        unsafe {
            let lane = Sse2::load_unaligned(data.as_ptr());
            let shifted = bytes_of(lane.shift_right(3));
            assert_eq!(&shifted[..3], &[0, 0, 0]);
            assert_eq!(&shifted[3..], &data[..13]);
        }
    }

    #[test]
    fn shift_left_moves_toward_lower_indices() {
        let data: [u8; 16] = core::array::from_fn(|i| i as u8 + 1);
        unsafe {
            let lane = Sse2::load_unaligned(data.as_ptr());
            let shifted = bytes_of(lane.shift_left(5));
            assert_eq!(&shifted[..11], &data[5..]);
            assert_eq!(&shifted[11..], &[0, 0, 0, 0, 0]);
        }
    }

    #[test]
    fn shift_by_zero_is_identity() {
        let data: [u8; 16] = core::array::from_fn(|i| i as u8 ^ 0x5a);
        unsafe {
            let lane = Sse2::load_unaligned(data.as_ptr());
            assert_eq!(bytes_of(lane.shift_right(0)), data);
            assert_eq!(bytes_of(lane.shift_left(0)), data);
        }
    }

    #[test]
    fn pattern_window_zero_extends() {
        let pat = [0xaa, 0xbb, 0xcc];
        unsafe {
            let window = bytes_of(pattern_window::<Sse2>(&pat, 2));
            assert_eq!(window[0], 0xcc);
            assert!(window[1..].iter().all(|&b| b == 0));
        }
    }
}
