//! Logger module
//!
//! Provides logging utilities for the relay including:
//! - Server lifecycle logging (banner, shutdown)
//! - Access logging with multiple formats
//! - Relay progress lines for the outfit and chat routes
//! - Error and warning logging, optionally to files

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use crate::config::Config;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Level {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
}

impl Level {
    /// Unknown names fall back to `Info`
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "debug" | "trace" => Self::Debug,
            "warn" | "warning" => Self::Warn,
            "error" => Self::Error,
            _ => Self::Info,
        }
    }
}

static MIN_LEVEL: AtomicU8 = AtomicU8::new(Level::Info as u8);

fn enabled(level: Level) -> bool {
    level as u8 >= MIN_LEVEL.load(Ordering::Relaxed)
}

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    MIN_LEVEL.store(Level::parse(&config.logging.level) as u8, Ordering::Relaxed);
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

fn write_info(message: &str) {
    match writer::get() {
        Some(w) => w.write_info(message),
        None => println!("{message}"),
    }
}

fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

/// First `max` characters of `text`, with an ellipsis when cut
pub fn preview(text: &str, max: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    write_info("==================================================");
    write_info("AI Outfit Assistant (Groq relay)");
    write_info("==================================================");
    write_info(&format!("Listening on: http://{addr}"));
    write_info(&format!(
        "Open in browser: http://{addr}{}",
        config.static_files.index_redirect
    ));
    write_info(&format!("Document root: {}", config.static_files.root));
    write_info(&format!(
        "Upstream: {} ({})",
        config.upstream.url, config.upstream.model
    ));
    write_info(&format!("Log level: {}", config.logging.level));
    if let Some(workers) = config.server.workers {
        write_info(&format!("Worker threads: {workers}"));
    }
    if let Some(ref path) = config.logging.access_log_file {
        write_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(&format!("Error log: {path}"));
    }
    write_info("Press Ctrl+C to stop");
    write_info("==================================================\n");
}

pub fn log_shutdown() {
    write_info("\n[Shutdown] Server stopped");
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    if enabled(Level::Error) {
        write_error(&format!("[ERROR] Failed to serve connection: {err:?}"));
    }
}

pub fn log_error(message: &str) {
    if enabled(Level::Error) {
        write_error(&format!("[ERROR] {message}"));
    }
}

pub fn log_warning(message: &str) {
    if enabled(Level::Warn) {
        write_error(&format!("[WARN] {message}"));
    }
}

pub fn log_info(message: &str) {
    if enabled(Level::Info) {
        write_info(&format!("[INFO] {message}"));
    }
}

pub fn log_debug(message: &str) {
    if enabled(Level::Debug) {
        write_info(&format!("[DEBUG] {message}"));
    }
}

pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_info(&entry.format(format));
}

pub fn log_outfit_request(temp: &str, description: &str) {
    log_info(&format!("[Outfit] Weather: {temp}°C, {description}"));
}

pub fn log_outfit_ready() {
    log_info("[Outfit] Recommendations received");
}

pub fn log_chat_message(message: &str) {
    log_info(&format!("[Chat] User: {}", preview(message, 50)));
}

pub fn log_chat_reply(reply: &str) {
    log_info(&format!("[Chat] Bot: {}", preview(reply, 60)));
}

pub fn log_route_failure(route: &str, err: &crate::error::RelayError) {
    log_error(&format!("[{route}] {err}"));
}
