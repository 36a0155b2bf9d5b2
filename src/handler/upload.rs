//! Upload module
//!
//! POST/PUT side of the server: collect the body, verify the signature when
//! signing is enabled, then replace the target file.
//!
//! The body is written to a uniquely named sibling file and renamed over the
//! target, so concurrent writers race on the rename and a reader sees either
//! the old or one complete new body.

use crate::config::AppState;
use crate::logger;
use crate::signature::SIGNATURE_HEADER;
use http_body_util::BodyExt;
use hyper::body::{Body, Bytes};
use hyper::{Request, StatusCode};
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Mode for written files
#[cfg(unix)]
const FILE_MODE: u32 = 0o644;

/// Failures that abort a write before the file is touched
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("failed to read request body: {0}")]
    Body(String),
    #[error("{0}: is a directory")]
    IsDirectory(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Result of a write request: status plus the number of body bytes received
pub struct UploadOutcome {
    pub status: StatusCode,
    pub body_bytes: usize,
}

/// Handle a POST/PUT request whose canonical path is `url_path`
pub async fn handle_upload<B>(
    req: Request<B>,
    url_path: &str,
    fs_path: &Path,
    remote_addr: SocketAddr,
    state: &AppState,
) -> UploadOutcome
where
    B: Body,
    B::Error: std::fmt::Display,
{
    let signature = req
        .headers()
        .get(SIGNATURE_HEADER)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());

    let body = match read_body(req).await {
        Ok(b) => b,
        Err(e) => {
            logger::log_write_failed(url_path, &e);
            return UploadOutcome {
                status: StatusCode::BAD_REQUEST,
                body_bytes: 0,
            };
        }
    };

    if let Some(verifier) = &state.verifier {
        let now = chrono::Utc::now().timestamp();
        if let Err(reason) = verifier.verify(signature.as_deref(), url_path, &body, now) {
            logger::log_rejected(&reason, &remote_addr, url_path);
            return UploadOutcome {
                status: StatusCode::FORBIDDEN,
                body_bytes: body.len(),
            };
        }
    }

    let status = match write_file(url_path, fs_path, &body).await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            logger::log_write_failed(url_path, &e);
            StatusCode::BAD_REQUEST
        }
    };

    UploadOutcome {
        status,
        body_bytes: body.len(),
    }
}

async fn read_body<B>(req: Request<B>) -> Result<Bytes, UploadError>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    req.into_body()
        .collect()
        .await
        .map(http_body_util::Collected::to_bytes)
        .map_err(|e| UploadError::Body(e.to_string()))
}

/// Replace `fs_path` with `body`
///
/// The parent directory must already exist.
pub async fn write_file(url_path: &str, fs_path: &Path, body: &[u8]) -> Result<(), UploadError> {
    if url_path.ends_with('/') {
        return Err(UploadError::IsDirectory(url_path.to_string()));
    }

    let temp_path = temp_path_for(fs_path);
    if let Err(e) = write_and_rename(&temp_path, fs_path, body).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(e.into());
    }
    Ok(())
}

async fn write_and_rename(temp_path: &Path, fs_path: &Path, body: &[u8]) -> io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(FILE_MODE);

    let mut file = options.open(temp_path).await?;
    file.write_all(body).await?;
    file.sync_all().await?;
    drop(file);

    fs::rename(temp_path, fs_path).await
}

/// Hidden sibling of `fs_path`
///
/// The name has a fixed length, so it fits wherever the target's name does.
fn temp_path_for(fs_path: &Path) -> PathBuf {
    fs_path.with_file_name(format!(".tmp.{}", Uuid::new_v4()))
}
