//! Pattern scanning: compiled patterns, backend selection, and the scan
//! entry points

mod aligned_bytes;
pub(crate) mod backends;
mod kernel;
mod lane;
mod pattern;
mod signature;

pub use backends::Backend;
pub use pattern::{Pattern, PatternError};
pub use signature::Signature;

/// Alignment granularity of the vector backends: the widest lane the crate
/// can select. Buffers handed to the aligned entry points should be aligned
/// to this, and the raw entry points read whole `LANE_ALIGN`-sized blocks.
pub const LANE_ALIGN: usize = 64;

/// Scanner construction errors
#[derive(Debug, thiserror::Error)]
pub enum ScannerError {
    /// An error happened during pattern parsing
    #[error(transparent)]
    Pattern(#[from] PatternError),
}

/// Single result IDA-style pattern scanner
///
/// Compiles a pattern once and scans any number of buffers for the first
/// occurrence. Scanning is infallible and stateless; every call returns
/// either the leftmost match offset or `None`.
///
/// # Example
///
/// ```
/// use sigscan::Scanner;
///
/// let binary = [0xab, 0xec, 0x48, 0x89, 0x5c, 0x24, 0xee, 0x48, 0x89, 0x6c];
///
/// let scanner = Scanner::new("48 89 5c 24 ?? 48 89 6c").unwrap();
/// assert_eq!(scanner.find(&binary), Some(2));
/// ```
pub struct Scanner {
    pattern: Pattern,
    backend: Backend,
}

impl Scanner {
    /// Compile an IDA-style pattern into a [`Scanner`].
    pub fn new(pattern: &str) -> Result<Self, ScannerError> {
        let pattern = Pattern::ida(pattern)?;
        tracing::debug!(len = pattern.len(), "compiled scan pattern");

        Ok(Self {
            pattern,
            backend: Backend::Auto,
        })
    }

    /// Wrap an already-compiled [`Pattern`].
    pub fn from_pattern(pattern: Pattern) -> Self {
        Self {
            pattern,
            backend: Backend::Auto,
        }
    }

    /// Force a specific backend instead of runtime detection. Mostly useful
    /// for tests and benchmarks.
    pub fn with_backend(mut self, backend: Backend) -> Self {
        tracing::trace!(%backend, "scan backend selected");
        self.backend = backend;
        self
    }

    /// The compiled pattern.
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// Find the first occurrence of the pattern in `haystack`.
    ///
    /// Works at any alignment and never reads outside the slice: the
    /// unaligned head and the trailing partial lane are covered by the
    /// reference scanner, whole lanes by the vector backend.
    pub fn find(&self, haystack: &[u8]) -> Option<usize> {
        backends::find_slice(
            self.backend,
            haystack,
            self.pattern.data(),
            self.pattern.mask(),
            self.pattern.len(),
            false,
        )
    }

    /// Find the first occurrence in the `len` bytes at `ptr`, at full speed.
    ///
    /// Any alignment. The scan walks back to the previous lane boundary and
    /// probes the enclosing lane with a wildcard-widened pattern, then scans
    /// the rest aligned, reading whole lanes throughout (so up to
    /// [`LANE_ALIGN`]` - 1` bytes past `ptr + len`).
    ///
    /// # Safety
    ///
    /// Every [`LANE_ALIGN`]-aligned block overlapping `ptr..ptr + len` must
    /// be valid for reads. Mapped memory satisfies this for any buffer whose
    /// enclosing pages are readable, since an aligned block never straddles
    /// a page boundary.
    pub unsafe fn find_raw(&self, ptr: *const u8, len: usize) -> Option<usize> {
        // SAFETY: read contract forwarded to the backend
        unsafe {
            backends::find_raw(
                self.backend,
                ptr,
                len,
                self.pattern.data(),
                self.pattern.mask(),
                self.pattern.len(),
            )
        }
    }
}

/// Scan a [`LANE_ALIGN`]-aligned buffer for an IDA-style pattern.
///
/// The alignment requirement is a usage contract (checked in debug builds);
/// use [`scan_ida_unaligned`] for arbitrary slices.
pub fn scan_ida(haystack: &[u8], pattern: &str) -> Result<Option<usize>, PatternError> {
    debug_assert_eq!(
        haystack.as_ptr() as usize % LANE_ALIGN,
        0,
        "scan_ida requires a LANE_ALIGN-aligned buffer"
    );

    scan_ida_unaligned(haystack, pattern)
}

/// Scan a buffer of any alignment for an IDA-style pattern.
pub fn scan_ida_unaligned(haystack: &[u8], pattern: &str) -> Result<Option<usize>, PatternError> {
    let pattern = Pattern::ida(pattern)?;
    Ok(backends::find_slice(
        Backend::Auto,
        haystack,
        pattern.data(),
        pattern.mask(),
        pattern.len(),
        false,
    ))
}

/// Scan a [`LANE_ALIGN`]-aligned buffer for a pattern given as separate
/// match and mask hex texts.
pub fn scan_mask_match(
    haystack: &[u8],
    match_text: &str,
    mask_text: &str,
) -> Result<Option<usize>, PatternError> {
    debug_assert_eq!(
        haystack.as_ptr() as usize % LANE_ALIGN,
        0,
        "scan_mask_match requires a LANE_ALIGN-aligned buffer"
    );

    scan_mask_match_unaligned(haystack, match_text, mask_text)
}

/// Scan a buffer of any alignment for a pattern given as separate match and
/// mask hex texts.
pub fn scan_mask_match_unaligned(
    haystack: &[u8],
    match_text: &str,
    mask_text: &str,
) -> Result<Option<usize>, PatternError> {
    let pattern = Pattern::mask_match(match_text, mask_text)?;
    Ok(backends::find_slice(
        Backend::Auto,
        haystack,
        pattern.data(),
        pattern.mask(),
        pattern.len(),
        false,
    ))
}

/// [`scan_ida_unaligned`] with the compact kernel: the candidate filter is
/// reduced to the first-byte predicate, emitting less code at some cost in
/// scan speed on filter-friendly patterns.
pub fn scan_ida_small(haystack: &[u8], pattern: &str) -> Result<Option<usize>, PatternError> {
    let pattern = Pattern::ida(pattern)?;
    Ok(backends::find_slice(
        Backend::Auto,
        haystack,
        pattern.data(),
        pattern.mask(),
        pattern.len(),
        true,
    ))
}

/// [`scan_mask_match_unaligned`] with the compact kernel.
pub fn scan_mask_match_small(
    haystack: &[u8],
    match_text: &str,
    mask_text: &str,
) -> Result<Option<usize>, PatternError> {
    let pattern = Pattern::mask_match(match_text, mask_text)?;
    Ok(backends::find_slice(
        Backend::Auto,
        haystack,
        pattern.data(),
        pattern.mask(),
        pattern.len(),
        true,
    ))
}
