//! Backend selection and dispatch

#[cfg(target_arch = "x86_64")]
pub(crate) mod avx2;
pub(crate) mod scalar;
#[cfg(target_arch = "x86_64")]
pub(crate) mod sse2;

/// Which scan implementation to run.
///
/// [`Backend::Auto`] picks the widest implementation the CPU supports and is
/// the right choice outside of tests and benchmarks.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Backend {
    /// Runtime detection: AVX2 where available, otherwise the baseline
    /// vector tier, otherwise scalar.
    #[default]
    Auto,
    /// 32-byte lanes, requires AVX2.
    #[cfg(target_arch = "x86_64")]
    Avx2,
    /// 16-byte lanes, available on every x86_64.
    #[cfg(target_arch = "x86_64")]
    Sse2,
    /// The byte-at-a-time reference scanner.
    Scalar,
}

impl Backend {
    /// Resolve `Auto` to a concrete backend for this CPU.
    ///
    /// # Panics
    /// Panics when a forced backend needs an instruction set the CPU does
    /// not have.
    pub(crate) fn resolve(self) -> Backend {
        match self {
            Backend::Auto => detect(),
            #[cfg(target_arch = "x86_64")]
            Backend::Avx2 => {
                assert!(
                    is_x86_feature_detected!("avx2"),
                    "AVX2 backend selected on a CPU without AVX2"
                );
                Backend::Avx2
            }
            other => other,
        }
    }
}

cfg_if::cfg_if! {
    if #[cfg(target_arch = "x86_64")] {
        fn detect() -> Backend {
            if is_x86_feature_detected!("avx2") {
                Backend::Avx2
            } else {
                Backend::Sse2
            }
        }
    } else {
        fn detect() -> Backend {
            Backend::Scalar
        }
    }
}

/// Scan a slice without ever reading outside it.
pub(crate) fn find_slice(
    backend: Backend,
    haystack: &[u8],
    data: &[u8],
    mask: &[u8],
    pat_len: usize,
    compact: bool,
) -> Option<usize> {
    match backend.resolve() {
        #[cfg(target_arch = "x86_64")]
        // SAFETY: resolve() only yields Avx2 when the CPU supports it
        Backend::Avx2 => unsafe { avx2::find_slice(haystack, data, mask, pat_len, compact) },
        #[cfg(target_arch = "x86_64")]
        Backend::Sse2 => sse2::find_slice(haystack, data, mask, pat_len, compact),
        _ => scalar::find(haystack, data, mask, pat_len),
    }
}

/// Scan raw memory at full speed.
///
/// # Safety
/// Every [`LANE_ALIGN`](crate::LANE_ALIGN)-aligned block overlapping
/// `ptr..ptr + len` must be valid for reads.
pub(crate) unsafe fn find_raw(
    backend: Backend,
    ptr: *const u8,
    len: usize,
    data: &[u8],
    mask: &[u8],
    pat_len: usize,
) -> Option<usize> {
    match backend.resolve() {
        #[cfg(target_arch = "x86_64")]
        // SAFETY: resolve() only yields Avx2 when the CPU supports it; the
        // read contract covers every block a narrower lane can touch
        Backend::Avx2 => unsafe { avx2::find_raw(ptr, len, data, mask, pat_len) },
        #[cfg(target_arch = "x86_64")]
        // SAFETY: read contract forwarded
        Backend::Sse2 => unsafe { sse2::find_raw(ptr, len, data, mask, pat_len) },
        // SAFETY: ptr..ptr + len itself is readable per the contract
        _ => unsafe { scalar::find_raw(ptr, len, data, mask, pat_len) },
    }
}
