//! Request handler module
//!
//! Routing dispatch plus the upload endpoint, stored image serving and the
//! embedded front-end pages.

pub mod cors;
pub mod frontend;
pub mod router;
pub mod static_files;
pub mod upload;

// Re-export main entry point
pub use router::handle_request;
