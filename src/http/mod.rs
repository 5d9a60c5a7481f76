//! HTTP protocol layer module
//!
//! Content types, cache validators and plain response builders, kept apart
//! from site storage and API logic.

pub mod cache;
pub mod mime;
pub mod response;

// Re-export commonly used builders
pub use response::{
    build_304_response, build_404_response, build_405_response, build_file_response,
    build_options_response, build_redirect_response, build_text_response,
};
