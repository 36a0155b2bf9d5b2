//! Request handler module
//!
//! Method dispatch, path mapping, static file reads and signed uploads.

pub mod path;
pub mod router;
pub mod static_files;
pub mod upload;

// Re-export main entry point
pub use router::handle_request;
