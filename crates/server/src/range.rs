//! `Range` header parsing for single byte ranges.

/// An inclusive byte span inside an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// `Content-Range` value for a file of `size` bytes.
    pub fn content_range(&self, size: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, size)
    }
}

/// The header cannot be satisfied for the artifact's size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("range not satisfiable")]
pub struct RangeError;

/// Parses `bytes=start-end`, `bytes=start-` or `bytes=-suffix`.
///
/// An `end` past the file is clamped to the last byte. Multiple ranges,
/// other units, a `start` at or beyond `size`, and `start > end` are
/// rejected.
pub fn parse_range(header: &str, size: u64) -> Result<ByteRange, RangeError> {
    let (unit, spec) = header.trim().split_once('=').ok_or(RangeError)?;
    if !unit.trim().eq_ignore_ascii_case("bytes") || spec.contains(',') {
        return Err(RangeError);
    }
    let (start, end) = spec.split_once('-').ok_or(RangeError)?;
    let (start, end) = (start.trim(), end.trim());

    if size == 0 {
        return Err(RangeError);
    }
    let last = size - 1;

    if start.is_empty() {
        let suffix: u64 = end.parse().map_err(|_| RangeError)?;
        if suffix == 0 {
            return Err(RangeError);
        }
        return Ok(ByteRange {
            start: size.saturating_sub(suffix),
            end: last,
        });
    }

    let start: u64 = start.parse().map_err(|_| RangeError)?;
    let end = if end.is_empty() {
        last
    } else {
        end.parse::<u64>().map_err(|_| RangeError)?.min(last)
    };

    if start > last || start > end {
        return Err(RangeError);
    }
    Ok(ByteRange { start, end })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_range() {
        let r = parse_range("bytes=0-99", 1000).unwrap();
        assert_eq!(r, ByteRange { start: 0, end: 99 });
        assert_eq!(r.len(), 100);
        assert_eq!(r.content_range(1000), "bytes 0-99/1000");
    }

    #[test]
    fn open_ended_range_runs_to_eof() {
        assert_eq!(
            parse_range("bytes=500-", 1000).unwrap(),
            ByteRange { start: 500, end: 999 }
        );
    }

    #[test]
    fn suffix_range() {
        assert_eq!(
            parse_range("bytes=-100", 1000).unwrap(),
            ByteRange { start: 900, end: 999 }
        );
        assert_eq!(
            parse_range("bytes=-5000", 1000).unwrap(),
            ByteRange { start: 0, end: 999 }
        );
        assert_eq!(parse_range("bytes=-0", 1000), Err(RangeError));
    }

    #[test]
    fn end_is_clamped() {
        assert_eq!(
            parse_range("bytes=900-5000", 1000).unwrap(),
            ByteRange { start: 900, end: 999 }
        );
    }

    #[test]
    fn unsatisfiable_start() {
        assert_eq!(parse_range("bytes=1000-", 1000), Err(RangeError));
        assert_eq!(parse_range("bytes=50-10", 1000), Err(RangeError));
        assert_eq!(parse_range("bytes=0-", 0), Err(RangeError));
    }

    #[test]
    fn malformed_headers() {
        for header in ["", "bytes", "bytes=", "bytes=-", "bytes=a-b", "items=0-1", "bytes=0-1,5-6"] {
            assert_eq!(parse_range(header, 100), Err(RangeError), "{header:?}");
        }
    }

    #[test]
    fn tolerates_whitespace_and_case() {
        assert_eq!(
            parse_range(" Bytes= 10 - 19 ", 100).unwrap(),
            ByteRange { start: 10, end: 19 }
        );
    }
}
