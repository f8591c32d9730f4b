//! Randomized properties, each checked against a naive reference matcher
//! and across every backend the host can run.

use quickcheck::{Arbitrary, Gen, TestResult};
use sigscan::{Backend, Pattern, Scanner};

/// Independent byte-at-a-time reference: the ground truth every scan result
/// is compared against.
fn oracle(haystack: &[u8], data: &[u8], mask: &[u8]) -> Option<usize> {
    let n = data.len();
    let last = haystack.len().checked_sub(n)?;
    (0..=last).find(|&i| (0..n).all(|j| mask[j] == 0 || haystack[i + j] & mask[j] == data[j]))
}

fn backends() -> Vec<Backend> {
    let mut all = vec![Backend::Auto, Backend::Scalar];
    #[cfg(target_arch = "x86_64")]
    {
        all.push(Backend::Sse2);
        if is_x86_feature_detected!("avx2") {
            all.push(Backend::Avx2);
        }
    }
    all
}

/// A random valid pattern: 1..=24 positions, wildcards anywhere except the
/// ends.
#[derive(Debug, Clone)]
struct PatternSpec {
    data: Vec<u8>,
    mask: Vec<u8>,
}

impl PatternSpec {
    fn len(&self) -> usize {
        self.data.len()
    }

    fn compile(&self) -> Pattern {
        Pattern::from_raw(&self.data, &self.mask).unwrap()
    }

    /// Overwrite `haystack[at..at + len]` so the pattern matches there.
    fn plant(&self, haystack: &mut [u8], at: usize) {
        for j in 0..self.len() {
            haystack[at + j] = (haystack[at + j] & !self.mask[j]) | self.data[j];
        }
    }
}

impl Arbitrary for PatternSpec {
    fn arbitrary(g: &mut Gen) -> Self {
        let len = usize::arbitrary(g) % 24 + 1;
        let mut data = Vec::with_capacity(len);
        let mut mask = Vec::with_capacity(len);

        for i in 0..len {
            let fixed = i == 0 || i == len - 1 || bool::arbitrary(g);
            if fixed {
                data.push(u8::arbitrary(g));
                mask.push(0xff);
            } else {
                data.push(0x00);
                mask.push(0x00);
            }
        }

        PatternSpec { data, mask }
    }
}

quickcheck::quickcheck! {
    /// Every backend agrees with the reference on arbitrary input.
    fn oracle_equivalence(haystack: Vec<u8>, spec: PatternSpec) -> bool {
        let expected = oracle(&haystack, &spec.data, &spec.mask);
        let scanner = Scanner::from_pattern(spec.compile());

        backends().into_iter().all(|backend| {
            let scanner = Scanner::from_pattern(spec.compile()).with_backend(backend);
            scanner.find(&haystack) == expected
        }) && scanner.find(&haystack) == scanner.find(&haystack)
    }

    /// Same, with a guaranteed occurrence planted somewhere.
    fn oracle_equivalence_planted(haystack: Vec<u8>, spec: PatternSpec, seed: usize) -> TestResult {
        let mut haystack = haystack;
        if haystack.len() < spec.len() {
            return TestResult::discard();
        }
        let at = seed % (haystack.len() - spec.len() + 1);
        spec.plant(&mut haystack, at);

        let expected = oracle(&haystack, &spec.data, &spec.mask);
        assert!(expected.is_some_and(|i| i <= at));

        TestResult::from_bool(backends().into_iter().all(|backend| {
            let scanner = Scanner::from_pattern(spec.compile()).with_backend(backend);
            scanner.find(&haystack) == expected
        }))
    }

    /// A reported match fits the buffer, satisfies every position, and is
    /// leftmost.
    fn definedness_and_leftmost(haystack: Vec<u8>, spec: PatternSpec, seed: usize) -> TestResult {
        let mut haystack = haystack;
        if haystack.len() < spec.len() {
            return TestResult::discard();
        }
        let at = seed % (haystack.len() - spec.len() + 1);
        spec.plant(&mut haystack, at);

        let scanner = Scanner::from_pattern(spec.compile());
        let Some(found) = scanner.find(&haystack) else {
            return TestResult::failed();
        };

        let fits = found + spec.len() <= haystack.len();
        let matches = (0..spec.len())
            .all(|j| spec.mask[j] == 0 || haystack[found + j] & spec.mask[j] == spec.data[j]);
        let leftmost = (0..found).all(|i| {
            (0..spec.len())
                .any(|j| spec.mask[j] != 0 && haystack[i + j] & spec.mask[j] != spec.data[j])
        });

        TestResult::from_bool(fits && matches && leftmost)
    }

    /// Bytes under a zero mask never influence the result: scrambling the
    /// wildcard positions of the only occurrence leaves it found.
    fn wildcards_ignore_buffer_bytes(spec: PatternSpec, at: usize, noise: Vec<u8>) -> TestResult {
        // one occurrence in match-free filler
        let filler = 0xcc;
        if spec.data[0] & spec.mask[0] == filler & spec.mask[0] {
            return TestResult::discard();
        }

        let mut haystack = vec![filler; 256];
        let at = at % (haystack.len() - spec.len() + 1);
        spec.plant(&mut haystack, at);

        let scanner = Scanner::from_pattern(spec.compile());
        if scanner.find(&haystack) != Some(at) {
            return TestResult::failed();
        }

        let mut noise = noise.into_iter().cycle();
        for j in 0..spec.len() {
            if spec.mask[j] == 0 {
                haystack[at + j] = noise.next().unwrap_or(0x5a);
            }
        }

        TestResult::from_bool(backends().into_iter().all(|backend| {
            let scanner = Scanner::from_pattern(spec.compile()).with_backend(backend);
            scanner.find(&haystack) == Some(at)
        }))
    }

    /// The raw pointer entry agrees with the slice entry at every
    /// misalignment.
    fn raw_agrees_with_slice(haystack: Vec<u8>, spec: PatternSpec, seed: usize) -> TestResult {
        #[repr(C, align(64))]
        struct Backing([u8; 1024]);

        if haystack.len() > 512 {
            return TestResult::discard();
        }

        let mut backing = Backing([0u8; 1024]);
        let offset = seed % 64;
        backing.0[offset..offset + haystack.len()].copy_from_slice(&haystack);

        let slice = &backing.0[offset..offset + haystack.len()];
        let expected = oracle(slice, &spec.data, &spec.mask);

        TestResult::from_bool(backends().into_iter().all(|backend| {
            let scanner = Scanner::from_pattern(spec.compile()).with_backend(backend);
            // SAFETY: the backing array is 64-aligned and padded well past
            // any lane the scan can touch
            let raw = unsafe { scanner.find_raw(slice.as_ptr(), slice.len()) };
            raw == expected && scanner.find(slice) == expected
        }))
    }

    /// The compact kernel is an implementation choice, not a semantic one.
    fn small_variant_agrees(haystack: Vec<u8>, spec: PatternSpec, seed: usize) -> TestResult {
        let mut haystack = haystack;
        if haystack.len() < spec.len() {
            return TestResult::discard();
        }
        let at = seed % (haystack.len() - spec.len() + 1);
        spec.plant(&mut haystack, at);

        let ida = spec_to_ida(&spec);
        let fast = sigscan::scan_ida_unaligned(&haystack, &ida).unwrap();
        let small = sigscan::scan_ida_small(&haystack, &ida).unwrap();

        TestResult::from_bool(fast == small && small == oracle(&haystack, &spec.data, &spec.mask))
    }
}

fn spec_to_ida(spec: &PatternSpec) -> String {
    spec.data
        .iter()
        .zip(&spec.mask)
        .map(|(&b, &m)| {
            if m == 0 {
                "?".to_owned()
            } else {
                format!("{b:02X}")
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
