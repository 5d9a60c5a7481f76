//! Request handler module
//!
//! Routes every request to the health probe, the management API or the
//! hosted sites.

pub mod router;
pub mod sites;

// Re-export main entry point
pub use router::handle_request;
