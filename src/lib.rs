//! fileserve
//!
//! A small HTTP file server: GET/HEAD serve files below a root directory,
//! POST/PUT store the request body at the request path. Writes can be
//! guarded by a shared-secret signature carried in the `FileserveSignature`
//! header.

pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
pub mod signature;
