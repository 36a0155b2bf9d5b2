//! Write request signature module
//!
//! Verifies the `FileserveSignature` header carried by POST/PUT requests.
//! The header value is `<unix_timestamp>:<hex_digest>` where the digest is
//! `hex(SHA1(timestamp + secret + path + body))`.
//!
//! Verification runs three checks in order and stops at the first failure:
//! 1. Presence - the header must exist and be non-empty
//! 2. Freshness - the timestamp must be within [`FRESHNESS_WINDOW_SECS`] of the server clock
//! 3. Digest - the digest must match the one computed from the request

use sha1::{Digest, Sha1};
use thiserror::Error;

/// Name of the request header carrying the signature
pub const SIGNATURE_HEADER: &str = "FileserveSignature";

/// Maximum allowed distance (seconds) between client timestamp and server clock
pub const FRESHNESS_WINDOW_SECS: i64 = 180;

/// Reason a write request failed verification
///
/// The client always receives a bare 403; the variant only reaches the server log.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("unsigned request received")]
    Missing,
    #[error("request timestamp too old")]
    Expired,
    #[error("invalid signature")]
    Invalid,
}

/// Parsed `<timestamp>:<digest>` header value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureToken<'a> {
    /// First field exactly as sent, used verbatim in the digest input
    pub timestamp_field: &'a str,
    /// First field parsed as Unix seconds, 0 when unparseable
    pub timestamp: i64,
    /// Second field, `None` when the header has no colon
    pub digest: Option<&'a str>,
}

impl<'a> SignatureToken<'a> {
    /// Split a header value into its fields
    ///
    /// Fields past the second are ignored.
    pub fn parse(value: &'a str) -> Self {
        let mut fields = value.split(':');
        let timestamp_field = fields.next().unwrap_or_default();
        Self {
            timestamp_field,
            timestamp: timestamp_field.parse().unwrap_or(0),
            digest: fields.next(),
        }
    }
}

/// Verifies signed writes against a shared secret
#[derive(Clone)]
pub struct SignatureVerifier {
    secret: Vec<u8>,
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl SignatureVerifier {
    /// Build a verifier, or `None` when the secret is empty (signing disabled)
    pub fn new(secret: &str) -> Option<Self> {
        if secret.is_empty() {
            None
        } else {
            Some(Self {
                secret: secret.as_bytes().to_vec(),
            })
        }
    }

    /// Check a write request
    ///
    /// # Arguments
    /// * `header` - Raw `FileserveSignature` value, if present
    /// * `path` - Request path as used for the filesystem mapping
    /// * `body` - Complete request body
    /// * `now` - Server clock in Unix seconds
    pub fn verify(
        &self,
        header: Option<&str>,
        path: &str,
        body: &[u8],
        now: i64,
    ) -> Result<(), SignatureError> {
        let value = match header {
            Some(v) if !v.is_empty() => v,
            _ => return Err(SignatureError::Missing),
        };

        let token = SignatureToken::parse(value);

        let delta = now.saturating_sub(token.timestamp);
        if !(-FRESHNESS_WINDOW_SECS..=FRESHNESS_WINDOW_SECS).contains(&delta) {
            return Err(SignatureError::Expired);
        }

        let expected = compute_digest(token.timestamp_field, &self.secret, path, body);
        match token.digest {
            Some(digest) if constant_time_eq(expected.as_bytes(), digest.as_bytes()) => Ok(()),
            _ => Err(SignatureError::Invalid),
        }
    }
}

/// Compute the lower-case hex SHA-1 over `timestamp + secret + path + body`
pub fn compute_digest(timestamp_field: &str, secret: &[u8], path: &str, body: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(timestamp_field.as_bytes());
    hasher.update(secret);
    hasher.update(path.as_bytes());
    hasher.update(body);
    hex::encode(hasher.finalize())
}

/// Build a header value that [`SignatureVerifier::verify`] accepts at time `now`
///
/// # Examples
/// ```
/// use fileserve::signature::{sign, SignatureVerifier};
///
/// let header = sign("s3cr3t", "/a.txt", b"hello", 1_700_000_000);
/// let verifier = SignatureVerifier::new("s3cr3t").unwrap();
/// assert!(verifier.verify(Some(&header), "/a.txt", b"hello", 1_700_000_000).is_ok());
/// ```
pub fn sign(secret: &str, path: &str, body: &[u8], now: i64) -> String {
    let timestamp = now.to_string();
    let digest = compute_digest(&timestamp, secret.as_bytes(), path, body);
    format!("{timestamp}:{digest}")
}

// Byte-for-byte equality without an early exit on the first mismatch
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn verifier() -> SignatureVerifier {
        SignatureVerifier::new("s3cr3t").unwrap()
    }

    #[test]
    fn test_empty_secret_disables_signing() {
        assert!(SignatureVerifier::new("").is_none());
        assert!(SignatureVerifier::new("x").is_some());
    }

    #[test]
    fn test_known_digest() {
        // sha1("1700000000s3cr3t/a.txthello")
        let mut hasher = Sha1::new();
        hasher.update(b"1700000000s3cr3t/a.txthello");
        let expected = hex::encode(hasher.finalize());

        assert_eq!(
            compute_digest("1700000000", b"s3cr3t", "/a.txt", b"hello"),
            expected
        );
        assert_eq!(expected.len(), 40);
        assert!(expected.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_valid_signature() {
        let header = sign("s3cr3t", "/a.txt", b"hello", NOW);
        assert_eq!(verifier().verify(Some(&header), "/a.txt", b"hello", NOW), Ok(()));
    }

    #[test]
    fn test_missing_header() {
        assert_eq!(
            verifier().verify(None, "/a.txt", b"hello", NOW),
            Err(SignatureError::Missing)
        );
        assert_eq!(
            verifier().verify(Some(""), "/a.txt", b"hello", NOW),
            Err(SignatureError::Missing)
        );
    }

    #[test]
    fn test_window_edges() {
        let v = verifier();
        for offset in [-180, -1, 0, 1, 180] {
            let header = sign("s3cr3t", "/a.txt", b"hello", NOW + offset);
            assert_eq!(
                v.verify(Some(&header), "/a.txt", b"hello", NOW),
                Ok(()),
                "offset {offset} should be accepted"
            );
        }
        for offset in [-181, 181, -200, 3600] {
            let header = sign("s3cr3t", "/a.txt", b"hello", NOW + offset);
            assert_eq!(
                v.verify(Some(&header), "/a.txt", b"hello", NOW),
                Err(SignatureError::Expired),
                "offset {offset} should be rejected"
            );
        }
    }

    #[test]
    fn test_stale_timestamp_with_reused_digest() {
        let header = sign("s3cr3t", "/a.txt", b"hello", NOW);
        let digest = header.split(':').nth(1).unwrap();
        let stale = format!("{}:{digest}", NOW - 200);
        assert_eq!(
            verifier().verify(Some(&stale), "/a.txt", b"hello", NOW),
            Err(SignatureError::Expired)
        );
    }

    #[test]
    fn test_wrong_digest() {
        let v = verifier();
        let header = sign("other", "/a.txt", b"hello", NOW);
        assert_eq!(
            v.verify(Some(&header), "/a.txt", b"hello", NOW),
            Err(SignatureError::Invalid)
        );

        // Signed for a different path or body
        let header = sign("s3cr3t", "/b.txt", b"hello", NOW);
        assert_eq!(
            v.verify(Some(&header), "/a.txt", b"hello", NOW),
            Err(SignatureError::Invalid)
        );
        let header = sign("s3cr3t", "/a.txt", b"hellO", NOW);
        assert_eq!(
            v.verify(Some(&header), "/a.txt", b"hello", NOW),
            Err(SignatureError::Invalid)
        );
    }

    #[test]
    fn test_digest_is_case_sensitive() {
        let header = sign("s3cr3t", "/a.txt", b"hello", NOW).to_uppercase();
        assert_eq!(
            verifier().verify(Some(&header), "/a.txt", b"hello", NOW),
            Err(SignatureError::Invalid)
        );
    }

    #[test]
    fn test_unparseable_timestamp_counts_as_zero() {
        let token = SignatureToken::parse("abc:deadbeef");
        assert_eq!(token.timestamp, 0);
        assert_eq!(token.timestamp_field, "abc");

        let digest = compute_digest("abc", b"s3cr3t", "/a.txt", b"");
        let header = format!("abc:{digest}");
        assert_eq!(
            verifier().verify(Some(&header), "/a.txt", b"", NOW),
            Err(SignatureError::Expired)
        );
        // Near the epoch the same header is fresh, and the raw field feeds the digest
        assert_eq!(verifier().verify(Some(&header), "/a.txt", b"", 10), Ok(()));
    }

    #[test]
    fn test_header_without_digest() {
        let header = NOW.to_string();
        let token = SignatureToken::parse(&header);
        assert_eq!(token.digest, None);
        assert_eq!(
            verifier().verify(Some(&header), "/a.txt", b"", NOW),
            Err(SignatureError::Invalid)
        );
    }

    #[test]
    fn test_extra_fields_ignored() {
        let header = format!("{}:trailing", sign("s3cr3t", "/a.txt", b"x", NOW));
        assert_eq!(verifier().verify(Some(&header), "/a.txt", b"x", NOW), Ok(()));
    }

    #[test]
    fn test_extreme_timestamps_do_not_overflow() {
        let v = verifier();
        for ts in [i64::MIN.to_string(), i64::MAX.to_string(), "99999999999999999999".into()] {
            let header = format!("{ts}:00");
            assert_eq!(
                v.verify(Some(&header), "/a.txt", b"", NOW),
                Err(SignatureError::Expired)
            );
        }
    }

    #[test]
    fn test_debug_redacts_secret() {
        let out = format!("{:?}", verifier());
        assert!(!out.contains("s3cr3t"));
    }
}
