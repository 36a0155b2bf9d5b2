//! HTTP protocol layer module
//!
//! Protocol helpers (validators, ranges, content types, response builders)
//! kept apart from the request handling that uses them.

pub mod cache;
pub mod mime;
pub mod range;
pub mod response;

// Re-export commonly used types
pub use range::ByteRange;
pub use response::{
    build_304_response, build_403_response, build_404_response, build_416_response,
    build_500_response, build_empty_response, build_moved_permanently,
};
