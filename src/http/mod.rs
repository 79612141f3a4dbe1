//! HTTP protocol layer module
//!
//! Protocol-level helpers shared by the handlers, independent of upload logic.

pub mod cache;
pub mod mime;
pub mod response;

// Re-export commonly used types
pub use response::{
    build_304_response, build_403_response, build_404_response, build_405_response,
    build_413_response, build_error_response, build_file_response, build_json_response,
    build_preflight_response, HttpResponse,
};
