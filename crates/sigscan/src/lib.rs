//! SIMD first-occurrence scanner for masked byte patterns.
//!
//! A pattern is a pair of equal-length byte arrays `(data, mask)`: a buffer
//! byte `b` satisfies pattern position `j` iff `b & mask[j] == data[j]`. A
//! position with `mask[j] == 0` is a wildcard and matches anything. Patterns
//! are usually written in IDA notation, where hex tokens are fixed bytes and
//! `?`/`??` are wildcards:
//!
//! ```
//! let haystack = [0xab, 0xec, 0x48, 0x89, 0x5c, 0x24, 0xee, 0x48, 0x89, 0x6c];
//!
//! let offset = sigscan::scan_ida_unaligned(&haystack, "48 89 5c 24 ?? 48 89 6c").unwrap();
//! assert_eq!(offset, Some(2));
//! ```
//!
//! Two pattern shapes are offered: [`Pattern`] carries its length at runtime
//! and parses from text, while [`Signature`] bakes the bytes and length into
//! the type so the scan loops specialize per pattern and malformed literals
//! fail the build:
//!
//! ```
//! use sigscan::Signature;
//!
//! static CALL_SITE: Signature<7> = Signature::ida("E8 ? ? ? ? 48 8B");
//!
//! let mut haystack = vec![0u8; 256];
//! haystack[40..47].copy_from_slice(&[0xE8, 1, 2, 3, 4, 0x48, 0x8B]);
//! assert_eq!(CALL_SITE.find(&haystack), Some(40));
//! ```
//!
//! The scanner itself is stateless and infallible: every scan completes with
//! `Some(offset)` of the leftmost match or `None`. All errors are construction
//! errors, reported before any scanning happens.

#![deny(unsafe_op_in_unsafe_fn)]

pub mod scan;

pub use scan::{
    scan_ida, scan_ida_small, scan_ida_unaligned, scan_mask_match, scan_mask_match_small,
    scan_mask_match_unaligned, Backend, Pattern, PatternError, Scanner, ScannerError, Signature,
    LANE_ALIGN,
};
