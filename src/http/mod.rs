//! HTTP protocol layer module
//!
//! Response builders, CORS headers, MIME detection and cache validation,
//! decoupled from the relay routes.

pub mod cache;
pub mod mime;
pub mod response;

// Re-export commonly used items
pub use response::{
    apply_cors, apply_server_name, build_304_response, build_403_response, build_404_response,
    build_413_response, build_501_response, build_empty_response, build_file_response,
    build_json_response, build_redirect_response_with_code, build_text_response, HttpResponse,
};
