//! `Range` header parsing.
//!
//! One policy for every request: a single `bytes=<start>-[<end>]` range
//! with a mandatory start. A missing or oversized end is clamped to the
//! last byte. Everything else is unsatisfiable.

/// An inclusive byte range within a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes covered by the range.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Value of the `Content-Range` header for this range.
    pub fn content_range(&self, size: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, size)
    }
}

/// Why a `Range` header cannot be satisfied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    #[error("malformed Range header: {0:?}")]
    Malformed(String),

    #[error("multiple ranges are not supported")]
    MultipleRanges,

    #[error("range start {start} is beyond the end of a {size} byte file")]
    StartOutOfBounds { start: u64, size: u64 },

    #[error("range start {start} is after range end {end}")]
    Inverted { start: u64, end: u64 },
}

/// Parse a `Range` header against a file of `size` bytes.
///
/// # Examples
///
/// ```
/// use localflix::streaming::{parse_range, ByteRange};
///
/// assert_eq!(parse_range("bytes=0-99", 1000), Ok(ByteRange { start: 0, end: 99 }));
/// assert_eq!(parse_range("bytes=900-", 1000), Ok(ByteRange { start: 900, end: 999 }));
/// assert!(parse_range("bytes=1000-1000", 1000).is_err());
/// ```
pub fn parse_range(header: &str, size: u64) -> Result<ByteRange, RangeError> {
    let malformed = || RangeError::Malformed(header.to_string());

    let spec = header
        .trim()
        .strip_prefix("bytes=")
        .ok_or_else(malformed)?
        .trim();

    if spec.contains(',') {
        return Err(RangeError::MultipleRanges);
    }

    let (start, end) = spec.split_once('-').ok_or_else(malformed)?;
    let start = parse_position(start.trim()).ok_or_else(malformed)?;
    let end = match end.trim() {
        "" => None,
        end => Some(parse_position(end).ok_or_else(malformed)?),
    };

    if start >= size {
        return Err(RangeError::StartOutOfBounds { start, size });
    }

    let last = size - 1;
    let end = end.map_or(last, |end| end.min(last));

    if start > end {
        return Err(RangeError::Inverted { start, end });
    }

    Ok(ByteRange { start, end })
}

/// Digits only: rejects signs, which `u64::from_str` would accept.
fn parse_position(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_range() {
        let range = parse_range("bytes=0-99", 1000).unwrap();
        assert_eq!(range, ByteRange { start: 0, end: 99 });
        assert_eq!(range.len(), 100);
        assert_eq!(range.content_range(1000), "bytes 0-99/1000");
    }

    #[test]
    fn test_open_ended_and_clamped() {
        assert_eq!(
            parse_range("bytes=500-", 1000).unwrap(),
            ByteRange { start: 500, end: 999 }
        );
        assert_eq!(
            parse_range("bytes=10-5000", 1000).unwrap(),
            ByteRange { start: 10, end: 999 }
        );
    }

    #[test]
    fn test_last_byte() {
        let range = parse_range("bytes=999-999", 1000).unwrap();
        assert_eq!(range.len(), 1);
    }

    #[test]
    fn test_start_out_of_bounds() {
        assert_eq!(
            parse_range("bytes=1000-1000", 1000),
            Err(RangeError::StartOutOfBounds { start: 1000, size: 1000 })
        );
        assert!(parse_range("bytes=0-", 0).is_err());
    }

    #[test]
    fn test_inverted() {
        assert_eq!(
            parse_range("bytes=50-10", 1000),
            Err(RangeError::Inverted { start: 50, end: 10 })
        );
    }

    #[test]
    fn test_malformed() {
        for header in [
            "bytes=-500",
            "bytes=-",
            "bytes=abc-def",
            "bytes=+5-10",
            "bytes=5",
            "items=0-10",
            "",
        ] {
            assert!(
                matches!(parse_range(header, 1000), Err(RangeError::Malformed(_))),
                "expected malformed: {header:?}"
            );
        }
    }

    #[test]
    fn test_multiple_ranges() {
        assert_eq!(
            parse_range("bytes=0-10,20-30", 1000),
            Err(RangeError::MultipleRanges)
        );
    }
}
