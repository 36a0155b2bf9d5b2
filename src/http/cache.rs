//! HTTP cache validator module
//!
//! Builds `ETag`/`Last-Modified` validators from file metadata and evaluates
//! conditional request headers against them.

use chrono::{DateTime, NaiveDateTime, Utc};
use std::time::{SystemTime, UNIX_EPOCH};

/// IMF-fixdate, the only date format servers may generate (RFC 9110)
const HTTP_DATE: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Generate an `ETag` from modification time and size
///
/// Rewriting a file through an upload changes at least one of the two.
///
/// # Returns
/// Quoted `ETag` string, e.g., `"65a1b2c3.1f-400"`
pub fn generate_etag(modified: Option<SystemTime>, len: u64) -> String {
    let (secs, nanos) = modified
        .and_then(|m| m.duration_since(UNIX_EPOCH).ok())
        .map_or((0, 0), |d| (d.as_secs(), d.subsec_nanos()));
    format!("\"{secs:x}.{nanos:x}-{len:x}\"")
}

/// Format a modification time as an HTTP date, `None` for pre-epoch times
pub fn format_http_date(time: SystemTime) -> Option<String> {
    time.duration_since(UNIX_EPOCH).ok()?;
    let dt: DateTime<Utc> = time.into();
    Some(dt.format(HTTP_DATE).to_string())
}

/// Parse an HTTP date into whole seconds since the epoch
fn parse_http_date(value: &str) -> Option<i64> {
    NaiveDateTime::parse_from_str(value.trim(), HTTP_DATE)
        .ok()
        .map(|dt| dt.and_utc().timestamp())
}

/// Check if client's `If-None-Match` header matches the server's `ETag`
///
/// Supports a single `ETag`, a comma separated list, and the `*` wildcard.
///
/// # Returns
/// Returns true if matched (should return 304), false otherwise
pub fn check_etag_match(if_none_match: Option<&str>, etag: &str) -> bool {
    if_none_match.is_some_and(|client_etag| {
        client_etag
            .split(',')
            .map(|e| e.trim().trim_start_matches("W/"))
            .any(|e| e == etag || e == "*")
    })
}

/// Check `If-Modified-Since` against the file's modification time
///
/// HTTP dates have one second resolution, so sub-second differences count as unmodified.
pub fn not_modified_since(if_modified_since: Option<&str>, modified: Option<SystemTime>) -> bool {
    let (Some(header), Some(modified)) = (if_modified_since, modified) else {
        return false;
    };
    let Some(since) = parse_http_date(header) else {
        return false;
    };
    let Ok(modified) = modified.duration_since(UNIX_EPOCH) else {
        return false;
    };
    i64::try_from(modified.as_secs()).is_ok_and(|secs| secs <= since)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[test]
    fn test_generate_etag() {
        let etag = generate_etag(Some(at(16)), 255);
        assert_eq!(etag, "\"10.0-ff\"");
        assert_ne!(etag, generate_etag(Some(at(16)), 256));
        assert_ne!(etag, generate_etag(Some(at(17)), 255));
        assert_eq!(generate_etag(None, 0), "\"0.0-0\"");
    }

    #[test]
    fn test_http_date_format() {
        assert_eq!(
            format_http_date(at(784_111_777)).unwrap(),
            "Sun, 06 Nov 1994 08:49:37 GMT"
        );
        assert_eq!(
            parse_http_date("Sun, 06 Nov 1994 08:49:37 GMT"),
            Some(784_111_777)
        );
        assert_eq!(parse_http_date("yesterday"), None);
    }

    #[test]
    fn test_check_etag_match() {
        let etag = "\"abc123\"";
        assert!(check_etag_match(Some("\"abc123\""), etag));
        assert!(check_etag_match(Some("\"xyz\", \"abc123\""), etag));
        assert!(check_etag_match(Some("W/\"abc123\""), etag));
        assert!(check_etag_match(Some("*"), etag));
        assert!(!check_etag_match(Some("\"different\""), etag));
        assert!(!check_etag_match(None, etag));
    }

    #[test]
    fn test_not_modified_since() {
        let header = "Sun, 06 Nov 1994 08:49:37 GMT";
        let exact = UNIX_EPOCH + Duration::new(784_111_777, 500);
        assert!(not_modified_since(Some(header), Some(exact)));
        assert!(not_modified_since(Some(header), Some(at(784_111_000))));
        assert!(!not_modified_since(Some(header), Some(at(784_111_778))));
        assert!(!not_modified_since(Some("garbage"), Some(exact)));
        assert!(!not_modified_since(None, Some(exact)));
        assert!(!not_modified_since(Some(header), None));
    }
}
