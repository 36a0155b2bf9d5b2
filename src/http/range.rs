//! HTTP Range request parsing module
//!
//! Single byte-range support (RFC 9110 section 14). Multi-range requests are
//! answered with the whole file.

/// Outcome of evaluating a `Range` header against a file length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteRange {
    /// No usable range, send the whole file
    Full,
    /// Inclusive byte span within the file
    Partial { start: usize, end: usize },
    /// Syntactically valid but outside the file - 416
    Unsatisfiable,
}

impl ByteRange {
    /// Evaluate a `Range` header value
    ///
    /// Supported forms: `bytes=start-end`, `bytes=start-`, `bytes=-suffix`.
    ///
    /// # Examples
    /// ```
    /// use fileserve::http::range::ByteRange;
    ///
    /// assert_eq!(ByteRange::parse(Some("bytes=0-99"), 1000), ByteRange::Partial { start: 0, end: 99 });
    /// assert_eq!(ByteRange::parse(None, 1000), ByteRange::Full);
    /// ```
    pub fn parse(header: Option<&str>, len: usize) -> Self {
        let Some(range_set) = header.and_then(|h| h.trim().strip_prefix("bytes=")) else {
            return Self::Full;
        };
        if range_set.contains(',') {
            return Self::Full;
        }
        let Some((first, last)) = range_set.split_once('-') else {
            return Self::Full;
        };
        let (first, last) = (first.trim(), last.trim());

        if first.is_empty() {
            // Suffix: last N bytes
            return match last.parse::<usize>() {
                Ok(0) => Self::Unsatisfiable,
                Ok(_) if len == 0 => Self::Unsatisfiable,
                Ok(n) => Self::Partial {
                    start: len.saturating_sub(n),
                    end: len - 1,
                },
                Err(_) => Self::Full,
            };
        }

        let Ok(start) = first.parse::<usize>() else {
            return Self::Full;
        };
        let end = if last.is_empty() {
            None
        } else {
            match last.parse::<usize>() {
                Ok(e) => Some(e),
                Err(_) => return Self::Full,
            }
        };

        if matches!(end, Some(e) if e < start) {
            return Self::Full;
        }
        if start >= len {
            return Self::Unsatisfiable;
        }

        Self::Partial {
            start,
            end: end.map_or(len - 1, |e| e.min(len - 1)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_or_foreign_range() {
        assert_eq!(ByteRange::parse(None, 100), ByteRange::Full);
        assert_eq!(ByteRange::parse(Some("items=0-1"), 100), ByteRange::Full);
        assert_eq!(ByteRange::parse(Some("bytes=a-b"), 100), ByteRange::Full);
        assert_eq!(ByteRange::parse(Some("bytes=0-9,20-29"), 100), ByteRange::Full);
        assert_eq!(ByteRange::parse(Some("bytes=9-0"), 100), ByteRange::Full);
    }

    #[test]
    fn test_bounded_and_open_ranges() {
        assert_eq!(
            ByteRange::parse(Some("bytes=0-9"), 100),
            ByteRange::Partial { start: 0, end: 9 }
        );
        assert_eq!(
            ByteRange::parse(Some("bytes=50-"), 100),
            ByteRange::Partial { start: 50, end: 99 }
        );
        // End clamped to the last byte
        assert_eq!(
            ByteRange::parse(Some("bytes=90-500"), 100),
            ByteRange::Partial { start: 90, end: 99 }
        );
    }

    #[test]
    fn test_suffix_range() {
        assert_eq!(
            ByteRange::parse(Some("bytes=-20"), 100),
            ByteRange::Partial { start: 80, end: 99 }
        );
        assert_eq!(
            ByteRange::parse(Some("bytes=-500"), 100),
            ByteRange::Partial { start: 0, end: 99 }
        );
        assert_eq!(ByteRange::parse(Some("bytes=-0"), 100), ByteRange::Unsatisfiable);
    }

    #[test]
    fn test_unsatisfiable() {
        assert_eq!(ByteRange::parse(Some("bytes=200-"), 100), ByteRange::Unsatisfiable);
        assert_eq!(ByteRange::parse(Some("bytes=0-"), 0), ByteRange::Unsatisfiable);
        assert_eq!(ByteRange::parse(Some("bytes=-5"), 0), ByteRange::Unsatisfiable);
    }
}
