//! Server module
//!
//! Listener setup, the accept loop and per-connection HTTP/1 serving.

pub mod connection;
pub mod listener;
pub mod signal;

// `loop` is a keyword, so the file is mounted under another name
#[path = "loop.rs"]
pub mod server_loop;

pub use listener::create_listener;
pub use server_loop::run_server;
pub use signal::wait_for_shutdown;
