//! Masked byte patterns and their textual formats

use std::fmt;

use super::aligned_bytes::AlignedBytes;
use super::LANE_ALIGN;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PatternError {
    /// The pattern has no bytes.
    #[error("pattern is empty")]
    Empty,
    /// Pattern and mask disagree on length.
    #[error("pattern has {data} bytes but the mask has {mask}")]
    LengthMismatch { data: usize, mask: usize },
    /// The first pattern byte is a wildcard. The scanner anchors on the
    /// first byte; slice the wildcard off and add it to the found offset
    /// instead.
    #[error("pattern starts with a wildcard")]
    LeadingWildcard,
    /// The last pattern byte is a wildcard; trim it, it matches nothing
    /// the shorter pattern would not.
    #[error("pattern ends with a wildcard")]
    TrailingWildcard,
    /// A data byte has bits set that its mask masks away, so it could never
    /// compare equal.
    #[error("pattern byte {index} has bits set outside its mask")]
    MaskMismatch { index: usize },
    /// A token that is neither 1-2 hex digits nor `?`/`??`.
    #[error("invalid pattern token {token:?}")]
    Token { token: String },
}

/// A compiled scan pattern: equal-length `data` and `mask` byte arrays where
/// a buffer byte `b` matches position `j` iff `b & mask[j] == data[j]`.
///
/// Storage is zero-padded to a multiple of [`LANE_ALIGN`] and aligned to it,
/// so the vector backends can treat the pattern as whole lanes; the padding
/// is all-wildcard and invisible to callers.
pub struct Pattern {
    data: AlignedBytes,
    mask: AlignedBytes,
    len: usize,
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Pattern({:x?})", &self.data()[..self.len])
    }
}

impl Pattern {
    /// Compile an IDA-style pattern: whitespace-separated tokens, each
    /// either 1-2 hex digits (a fixed byte) or `?`/`??` (a wildcard).
    ///
    /// # Example
    ///
    /// ```
    /// use sigscan::Pattern;
    ///
    /// Pattern::ida("48 89 5c 24 ?? 48 89 6c").unwrap();
    /// Pattern::ida("48 89 ? 24 ? 48 89 6c").unwrap();
    /// ```
    pub fn ida(pattern: &str) -> Result<Self, PatternError> {
        let mut data = Vec::new();
        let mut mask = Vec::new();

        for token in pattern.split_ascii_whitespace() {
            match token {
                "?" | "??" => {
                    data.push(0x00);
                    mask.push(0x00);
                }
                _ => {
                    data.push(parse_hex_byte(token)?);
                    mask.push(0xff);
                }
            }
        }

        Self::assemble(data, mask)
    }

    /// Compile from two whitespace-separated hex byte lists of equal token
    /// count. A mask byte of `00` is a wildcard; partial masks (for example
    /// `F0` to match only a high nibble) are allowed as long as the data
    /// byte has no bits outside the mask.
    ///
    /// # Example
    ///
    /// ```
    /// use sigscan::Pattern;
    ///
    /// Pattern::mask_match("E8 00 00 8B", "FF 00 00 FF").unwrap();
    /// ```
    pub fn mask_match(match_text: &str, mask_text: &str) -> Result<Self, PatternError> {
        let data = match_text
            .split_ascii_whitespace()
            .map(parse_hex_byte)
            .collect::<Result<Vec<_>, _>>()?;
        let mask = mask_text
            .split_ascii_whitespace()
            .map(parse_hex_byte)
            .collect::<Result<Vec<_>, _>>()?;

        Self::assemble(data, mask)
    }

    /// Compile from raw data and mask slices.
    pub fn from_raw(data: &[u8], mask: &[u8]) -> Result<Self, PatternError> {
        Self::assemble(data.to_vec(), mask.to_vec())
    }

    /// The pattern length in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn data(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn mask(&self) -> &[u8] {
        &self.mask
    }

    fn assemble(data: Vec<u8>, mask: Vec<u8>) -> Result<Self, PatternError> {
        if data.len() != mask.len() {
            return Err(PatternError::LengthMismatch {
                data: data.len(),
                mask: mask.len(),
            });
        }
        if data.is_empty() {
            return Err(PatternError::Empty);
        }
        if mask[0] == 0x00 {
            return Err(PatternError::LeadingWildcard);
        }
        if mask[mask.len() - 1] == 0x00 {
            return Err(PatternError::TrailingWildcard);
        }
        if let Some(index) = (0..data.len()).find(|&j| data[j] & mask[j] != data[j]) {
            return Err(PatternError::MaskMismatch { index });
        }

        let len = data.len();

        // SAFETY: LANE_ALIGN is a power of two, so the layout is valid
        let slf = unsafe {
            Self {
                data: AlignedBytes::padded(&data, LANE_ALIGN).unwrap_unchecked(),
                mask: AlignedBytes::padded(&mask, LANE_ALIGN).unwrap_unchecked(),
                len,
            }
        };

        Ok(slf)
    }
}

impl TryFrom<&str> for Pattern {
    type Error = PatternError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::ida(value)
    }
}

fn parse_hex_byte(token: &str) -> Result<u8, PatternError> {
    if token.is_empty() || token.len() > 2 || !token.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(PatternError::Token {
            token: token.to_owned(),
        });
    }

    u8::from_str_radix(token, 16).map_err(|_| PatternError::Token {
        token: token.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ida_roundtrip() {
        let pat = Pattern::ida("E8 ? ? ? ? 48 8B").unwrap();
        assert_eq!(pat.len(), 7);
        assert_eq!(&pat.data()[..7], &[0xe8, 0, 0, 0, 0, 0x48, 0x8b]);
        assert_eq!(&pat.mask()[..7], &[0xff, 0, 0, 0, 0, 0xff, 0xff]);
        // storage is padded to whole lanes
        assert_eq!(pat.data().len() % LANE_ALIGN, 0);
        assert!(pat.mask()[7..].iter().all(|&b| b == 0));
    }

    #[test]
    fn ida_accepts_tabs_and_single_digits() {
        let pat = Pattern::ida("e8\t?? \t 4").unwrap();
        assert_eq!(&pat.data()[..3], &[0xe8, 0x00, 0x04]);
    }

    #[test]
    fn ida_rejects_empty() {
        assert_eq!(Pattern::ida("   ").unwrap_err(), PatternError::Empty);
    }

    #[test]
    fn ida_rejects_bad_tokens() {
        assert!(matches!(
            Pattern::ida("E8 XY").unwrap_err(),
            PatternError::Token { .. }
        ));
        assert!(matches!(
            Pattern::ida("E8 123").unwrap_err(),
            PatternError::Token { .. }
        ));
        assert!(matches!(
            Pattern::ida("E8 ?A").unwrap_err(),
            PatternError::Token { .. }
        ));
    }

    #[test]
    fn ida_rejects_wildcard_ends() {
        assert_eq!(
            Pattern::ida("?? 48 8B").unwrap_err(),
            PatternError::LeadingWildcard
        );
        assert_eq!(
            Pattern::ida("48 8B ?").unwrap_err(),
            PatternError::TrailingWildcard
        );
    }

    #[test]
    fn mask_match_texts() {
        let pat = Pattern::mask_match("E8 00 8B", "FF 00 FF").unwrap();
        assert_eq!(&pat.mask()[..3], &[0xff, 0x00, 0xff]);
    }

    #[test]
    fn mask_match_rejects_token_count_mismatch() {
        assert_eq!(
            Pattern::mask_match("E8 00 8B", "FF 00").unwrap_err(),
            PatternError::LengthMismatch { data: 3, mask: 2 }
        );
    }

    #[test]
    fn partial_mask_requires_subset_data() {
        let ok = Pattern::mask_match("E0 8B", "F0 FF");
        assert!(ok.is_ok());

        assert_eq!(
            Pattern::mask_match("E8 8B", "F0 FF").unwrap_err(),
            PatternError::MaskMismatch { index: 0 }
        );
    }

    #[test]
    fn from_raw_validates() {
        assert!(Pattern::from_raw(&[0x12, 0x00, 0x56], &[0xff, 0x00, 0xff]).is_ok());
        assert_eq!(
            Pattern::from_raw(&[0x12], &[0xff, 0xff]).unwrap_err(),
            PatternError::LengthMismatch { data: 1, mask: 2 }
        );
        assert_eq!(Pattern::from_raw(&[], &[]).unwrap_err(), PatternError::Empty);
    }
}
