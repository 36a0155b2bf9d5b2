//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: a single catch-all route where the
//! method decides what happens.
//!
//! | Method     | Action                                   |
//! |------------|------------------------------------------|
//! | GET, HEAD  | serve `root + path`                      |
//! | POST, PUT  | (verify signature) write `root + path`   |
//! | other      | 200 with empty body                      |

use crate::config::AppState;
use crate::handler::{path, static_files, upload};
use crate::http;
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response, StatusCode};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Request context encapsulating information needed for serving files
pub struct RequestContext<'a> {
    /// Decoded, canonical request path
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub is_head: bool,
    pub if_none_match: Option<String>,
    pub if_modified_since: Option<String>,
    pub range_header: Option<String>,
}

/// Main entry point for HTTP request handling
///
/// Generic over the body so the same handler serves hyper connections and
/// in-memory requests.
pub async fn handle_request<B>(
    req: Request<B>,
    remote_addr: SocketAddr,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    let started = Instant::now();
    let method = req.method().clone();
    let raw_path = req.uri().path().to_string();
    let query = req.uri().query().map(ToString::to_string);
    let version = req.version();
    let user_agent = header_string(&req, "user-agent");

    let Some(url_path) = path::decode(&raw_path) else {
        logger::log_request(&method, &raw_path);
        logger::log_warning(&format!("Request path is not valid UTF-8: {raw_path}"));
        return Ok(http::build_empty_response(StatusCode::BAD_REQUEST));
    };

    logger::log_request(&method, &url_path);

    let (response, body_bytes) =
        dispatch(req, &method, &url_path, query.as_deref(), remote_addr, &state).await;

    if state.config.logging.access_log {
        let mut entry = AccessLogEntry::new(remote_addr.to_string(), method.to_string(), url_path);
        entry.http_version = version_label(version).to_string();
        entry.status = response.status().as_u16();
        entry.body_bytes = body_bytes;
        entry.user_agent = user_agent;
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Canonicalize the path, then route by method
async fn dispatch<B>(
    req: Request<B>,
    method: &Method,
    url_path: &str,
    query: Option<&str>,
    remote_addr: SocketAddr,
    state: &AppState,
) -> (Response<Full<Bytes>>, usize)
where
    B: Body,
    B::Error: std::fmt::Display,
{
    // Asterisk-form target names the server, not a file
    if url_path == "*" {
        let status = if *method == Method::OPTIONS {
            StatusCode::OK
        } else {
            StatusCode::BAD_REQUEST
        };
        return (http::build_empty_response(status), 0);
    }

    // Non-canonical paths never reach the filesystem
    let cleaned = path::clean(url_path);
    if cleaned != url_path {
        let target = path::redirect_target(&cleaned, query);
        return (http::build_moved_permanently(&target), 0);
    }

    let fs_path = path::to_filesystem(state.root(), url_path);

    match *method {
        Method::GET | Method::HEAD => {
            let ctx = RequestContext {
                path: url_path,
                query,
                is_head: *method == Method::HEAD,
                if_none_match: header_string(&req, "if-none-match"),
                if_modified_since: header_string(&req, "if-modified-since"),
                range_header: header_string(&req, "range"),
            };
            let response = static_files::serve(&ctx, &fs_path).await;
            let sent = if ctx.is_head { 0 } else { content_length(&response) };
            (response, sent)
        }
        Method::POST | Method::PUT => {
            let outcome = upload::handle_upload(req, url_path, &fs_path, remote_addr, state).await;
            (http::build_empty_response(outcome.status), outcome.body_bytes)
        }
        _ => (http::build_empty_response(StatusCode::OK), 0),
    }
}

fn header_string<B>(req: &Request<B>, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

fn content_length(response: &Response<Full<Bytes>>) -> usize {
    response
        .headers()
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

const fn version_label(version: hyper::Version) -> &'static str {
    match version {
        hyper::Version::HTTP_09 => "0.9",
        hyper::Version::HTTP_10 => "1.0",
        hyper::Version::HTTP_2 => "2",
        hyper::Version::HTTP_3 => "3",
        _ => "1.1",
    }
}
