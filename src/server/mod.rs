// Server module entry
// Listener setup, the accept loop, per-connection tasks and shutdown signals

pub mod connection;
pub mod listener;
pub mod serve;
pub mod signal;

pub use listener::bind_listener;
pub use serve::serve;
pub use signal::start_signal_handler;
