//! Static file serving module
//!
//! GET/HEAD side of the server: resolves a mapped path, applies conditional
//! and range headers, and builds the response.

use crate::handler::path;
use crate::handler::router::RequestContext;
use crate::http::response::{build_file_response, build_partial_response, FileHeaders};
use crate::http::{self, cache, mime, ByteRange};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

/// File served for a directory request ending in `/`
const INDEX_FILE: &str = "index.html";

/// Serve the file at `fs_path`
pub async fn serve(ctx: &RequestContext<'_>, fs_path: &Path) -> Response<Full<Bytes>> {
    let metadata = match fs::metadata(fs_path).await {
        Ok(m) => m,
        Err(e) => return open_error_response(&e),
    };

    let (file_path, metadata) = if metadata.is_dir() {
        if !ctx.path.ends_with('/') {
            let target = path::redirect_target(&format!("{}/", ctx.path), ctx.query);
            return http::build_moved_permanently(&target);
        }
        let index: PathBuf = fs_path.join(INDEX_FILE);
        match fs::metadata(&index).await {
            Ok(m) if m.is_file() => (index, m),
            // No directory listings
            _ => return http::build_404_response(),
        }
    } else {
        (fs_path.to_path_buf(), metadata)
    };

    let modified = metadata.modified().ok();
    let etag = cache::generate_etag(modified, metadata.len());
    let last_modified = modified.and_then(cache::format_http_date);

    // If-None-Match takes precedence over If-Modified-Since
    let not_modified = if ctx.if_none_match.is_some() {
        cache::check_etag_match(ctx.if_none_match.as_deref(), &etag)
    } else {
        cache::not_modified_since(ctx.if_modified_since.as_deref(), modified)
    };
    if not_modified {
        return http::build_304_response(&etag, last_modified.as_deref());
    }

    let content = match fs::read(&file_path).await {
        Ok(c) => Bytes::from(c),
        Err(e) => {
            logger::log_error(&format!(
                "Failed to read file '{}': {e}",
                file_path.display()
            ));
            return read_error_response(&e);
        }
    };

    let headers = FileHeaders {
        content_type: mime::get_content_type(&file_path),
        etag: &etag,
        last_modified: last_modified.as_deref(),
    };

    match ByteRange::parse(ctx.range_header.as_deref(), content.len()) {
        ByteRange::Full => build_file_response(content, &headers, ctx.is_head),
        ByteRange::Partial { start, end } => build_partial_response(
            content.slice(start..=end),
            &headers,
            start,
            end,
            content.len(),
            ctx.is_head,
        ),
        ByteRange::Unsatisfiable => http::build_416_response(content.len()),
    }
}

/// Map a failed lookup to a status; anything but a permission problem is "not found"
fn open_error_response(err: &io::Error) -> Response<Full<Bytes>> {
    match err.kind() {
        io::ErrorKind::PermissionDenied => http::build_403_response(),
        _ => http::build_404_response(),
    }
}

fn read_error_response(err: &io::Error) -> Response<Full<Bytes>> {
    match err.kind() {
        io::ErrorKind::PermissionDenied => http::build_403_response(),
        io::ErrorKind::NotFound => http::build_404_response(),
        _ => http::build_500_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use hyper::StatusCode;

    fn ctx(path: &str) -> RequestContext<'_> {
        RequestContext {
            path,
            query: None,
            is_head: false,
            if_none_match: None,
            if_modified_since: None,
            range_header: None,
        }
    }

    async fn body_of(resp: Response<Full<Bytes>>) -> Bytes {
        resp.into_body().collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn test_serves_file_with_headers() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"hello").unwrap();

        let resp = serve(&ctx("/a.txt"), &dir.path().join("a.txt")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["content-type"], "text/plain; charset=utf-8");
        assert_eq!(resp.headers()["content-length"], "5");
        assert!(resp.headers().contains_key("etag"));
        assert!(resp.headers().contains_key("last-modified"));
        assert_eq!(body_of(resp).await, Bytes::from_static(b"hello"));
    }

    #[tokio::test]
    async fn test_missing_file_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let resp = serve(&ctx("/nope"), &dir.path().join("nope")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        // A file used as a directory component is not found either
        std::fs::write(dir.path().join("f"), b"x").unwrap();
        let resp = serve(&ctx("/f/g"), &dir.path().join("f/g")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_head_has_no_body() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"hello").unwrap();

        let mut c = ctx("/a.txt");
        c.is_head = true;
        let resp = serve(&c, &dir.path().join("a.txt")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["content-length"], "5");
        assert!(body_of(resp).await.is_empty());
    }

    #[tokio::test]
    async fn test_conditional_get() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, b"hello").unwrap();

        let first = serve(&ctx("/a.txt"), &file).await;
        let etag = first.headers()["etag"].to_str().unwrap().to_string();
        let last_modified = first.headers()["last-modified"].to_str().unwrap().to_string();

        let mut c = ctx("/a.txt");
        c.if_none_match = Some(etag);
        assert_eq!(serve(&c, &file).await.status(), StatusCode::NOT_MODIFIED);

        let mut c = ctx("/a.txt");
        c.if_modified_since = Some(last_modified);
        assert_eq!(serve(&c, &file).await.status(), StatusCode::NOT_MODIFIED);

        let mut c = ctx("/a.txt");
        c.if_none_match = Some("\"stale\"".to_string());
        assert_eq!(serve(&c, &file).await.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_range_requests() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("digits.bin");
        std::fs::write(&file, b"0123456789").unwrap();

        let mut c = ctx("/digits.bin");
        c.range_header = Some("bytes=2-4".to_string());
        let resp = serve(&c, &file).await;
        assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(resp.headers()["content-range"], "bytes 2-4/10");
        assert_eq!(body_of(resp).await, Bytes::from_static(b"234"));

        c.range_header = Some("bytes=50-".to_string());
        let resp = serve(&c, &file).await;
        assert_eq!(resp.status(), StatusCode::RANGE_NOT_SATISFIABLE);
    }

    #[tokio::test]
    async fn test_directory_handling() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("docs")).unwrap();

        // Missing trailing slash redirects
        let resp = serve(&ctx("/docs"), &dir.path().join("docs")).await;
        assert_eq!(resp.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(resp.headers()["location"], "/docs/");

        // No index, no listing
        let resp = serve(&ctx("/docs/"), &dir.path().join("docs/")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        std::fs::write(dir.path().join("docs/index.html"), b"<p>hi</p>").unwrap();
        let resp = serve(&ctx("/docs/"), &dir.path().join("docs/")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["content-type"], "text/html; charset=utf-8");
        assert_eq!(body_of(resp).await, Bytes::from_static(b"<p>hi</p>"));
    }
}
