//! Request handler module
//!
//! Routing dispatch, the two relay routes and static file serving.

pub mod chat;
pub mod outfit;
pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
