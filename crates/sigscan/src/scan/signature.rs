//! Compile-time pattern signatures
//!
//! [`Signature`] is the monomorphized counterpart of
//! [`Pattern`](super::Pattern): the byte count is a const generic and the
//! parser is a `const fn`, so a signature in a `static` or `const` is built
//! (and validated) at compile time and the scan loops specialize per
//! pattern. A malformed literal fails the build instead of returning an
//! error.

use super::backends::{self, Backend};

/// A scan pattern with a compile-time length.
///
/// `N` is the number of pattern positions, which must equal the token count
/// of the text handed to [`Signature::ida`].
///
/// # Example
///
/// ```
/// use sigscan::Signature;
///
/// static INDIRECT_CALL: Signature<6> = Signature::ida("FF 15 ? ? ? 48");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Signature<const N: usize> {
    data: [u8; N],
    mask: [u8; N],
}

impl<const N: usize> Signature<N> {
    /// Parse an IDA-style pattern at compile time.
    ///
    /// # Panics
    ///
    /// Panics (at build time when evaluated in const context) if the text is
    /// not exactly `N` whitespace-separated tokens of 1-2 hex digits or
    /// `?`/`??`, or if the first or last token is a wildcard.
    pub const fn ida(pattern: &str) -> Self {
        assert!(N > 0, "pattern must not be empty");

        let text = pattern.as_bytes();
        let mut data = [0u8; N];
        let mut mask = [0u8; N];

        let mut token = 0;
        let mut pos = 0;
        while pos < text.len() {
            let byte = text[pos];
            if is_space(byte) {
                pos += 1;
                continue;
            }

            assert!(token < N, "pattern has more tokens than N");

            if byte == b'?' {
                pos += 1;
                if pos < text.len() && text[pos] == b'?' {
                    pos += 1;
                }
            } else {
                let mut value = hex_digit(byte);
                pos += 1;
                if pos < text.len() && !is_space(text[pos]) {
                    value = value << 4 | hex_digit(text[pos]);
                    pos += 1;
                }
                data[token] = value;
                mask[token] = 0xff;
            }

            // tokens are at most two characters
            if pos < text.len() {
                assert!(is_space(text[pos]), "malformed pattern token");
            }
            token += 1;
        }

        assert!(token == N, "pattern must have exactly N tokens");
        assert!(mask[0] != 0, "pattern must not start with a wildcard");
        assert!(mask[N - 1] != 0, "pattern must not end with a wildcard");

        Self { data, mask }
    }

    /// Build from raw data and mask arrays, validated at compile time.
    ///
    /// # Panics
    ///
    /// Panics if a data byte has bits outside its mask, or if the first or
    /// last mask byte is zero.
    pub const fn from_raw(data: [u8; N], mask: [u8; N]) -> Self {
        assert!(N > 0, "pattern must not be empty");
        assert!(mask[0] != 0, "pattern must not start with a wildcard");
        assert!(mask[N - 1] != 0, "pattern must not end with a wildcard");

        let mut j = 0;
        while j < N {
            assert!(
                data[j] & mask[j] == data[j],
                "pattern byte has bits set outside its mask"
            );
            j += 1;
        }

        Self { data, mask }
    }

    /// The pattern length in bytes.
    pub const fn len(&self) -> usize {
        N
    }

    /// Find the first occurrence in `haystack`, at any alignment, never
    /// reading outside the slice.
    pub fn find(&self, haystack: &[u8]) -> Option<usize> {
        backends::find_slice(Backend::Auto, haystack, &self.data, &self.mask, N, false)
    }

    /// Find the first occurrence in the `len` bytes at `ptr`, at full speed.
    ///
    /// # Safety
    ///
    /// Every [`LANE_ALIGN`](crate::LANE_ALIGN)-aligned block overlapping
    /// `ptr..ptr + len` must be valid for reads. Covering the buffer with
    /// aligned allocations (or scanning mapped memory whose pages enclose
    /// it) satisfies this.
    pub unsafe fn find_raw(&self, ptr: *const u8, len: usize) -> Option<usize> {
        // SAFETY: read contract forwarded to the backend
        unsafe { backends::find_raw(Backend::Auto, ptr, len, &self.data, &self.mask, N) }
    }
}

const fn is_space(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\r' | b'\n')
}

const fn hex_digit(byte: u8) -> u8 {
    match byte {
        b'0'..=b'9' => byte - b'0',
        b'a'..=b'f' => byte - b'a' + 0xa,
        b'A'..=b'F' => byte - b'A' + 0xa,
        _ => panic!("invalid hex digit in pattern"),
    }
}
