//! Request path mapping module
//!
//! Turns the request target into the filesystem path it addresses:
//! decode the percent-encoded path, require it to be canonical, then append
//! it verbatim to the root directory.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use std::path::PathBuf;

/// Characters re-encoded when a cleaned path is sent back in `Location`
const PATH_ENCODE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Percent-decode a request path, `None` if the result is not UTF-8
pub fn decode(raw: &str) -> Option<String> {
    percent_decode_str(raw)
        .decode_utf8()
        .ok()
        .map(std::borrow::Cow::into_owned)
}

/// Canonical form of an absolute URL path
///
/// Collapses repeated slashes, drops `.` segments and resolves `..` lexically
/// without ever climbing above `/`. A trailing slash is kept.
pub fn clean(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }

    let mut cleaned = String::with_capacity(path.len() + 1);
    cleaned.push('/');
    cleaned.push_str(&segments.join("/"));
    if path.ends_with('/') && cleaned.len() > 1 {
        cleaned.push('/');
    }
    cleaned
}

/// Build the `Location` target for a redirect to `path`, keeping the query
pub fn redirect_target(path: &str, query: Option<&str>) -> String {
    let encoded = utf8_percent_encode(path, PATH_ENCODE).to_string();
    match query {
        Some(q) => format!("{encoded}?{q}"),
        None => encoded,
    }
}

/// Map a canonical request path onto the filesystem: `root + path`
pub fn to_filesystem(root: &str, path: &str) -> PathBuf {
    PathBuf::from(format!("{root}{path}"))
}
