//! Logger module
//!
//! Provides logging utilities for the HTTP server including:
//! - Server lifecycle logging
//! - Access logging with multiple formats
//! - Error and warning logging
//! - File-based logging support

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use crate::config::Config;
use std::net::SocketAddr;

/// Minimum severity a message needs to be written
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    /// Parse a level name, defaulting to `Info` for unknown values
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "error" => Self::Error,
            "warn" | "warning" => Self::Warn,
            "debug" | "trace" => Self::Debug,
            _ => Self::Info,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
        };
        f.write_str(name)
    }
}

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(
        LogLevel::parse(&config.logging.level),
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

fn enabled(level: LogLevel) -> bool {
    writer::get().map_or(level <= LogLevel::Info, |w| level <= w.level())
}

/// Write to info/access log
fn write_info(level: LogLevel, message: &str) {
    if !enabled(level) {
        return;
    }
    match writer::get() {
        Some(w) => w.write_info(message),
        None => println!("{message}"),
    }
}

/// Write to error log
fn write_error(level: LogLevel, message: &str) {
    if !enabled(level) {
        return;
    }
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

/// Startup line naming the port actually bound
pub fn startup_banner(addr: &SocketAddr) -> String {
    format!("Running on http://localhost:{}", addr.port())
}

/// Announce the listening address; always printed regardless of level
pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    let banner = startup_banner(addr);
    match writer::get() {
        Some(w) => w.write_info(&banner),
        None => println!("{banner}"),
    }

    write_info(LogLevel::Debug, &format!("[Server] Bound to {addr}"));
    write_info(LogLevel::Debug, &format!("[Server] Log level: {}", config.logging.level));
    if let Some(workers) = config.server.workers {
        write_info(LogLevel::Debug, &format!("[Server] Worker threads: {workers}"));
    }
    if let Some(ref path) = config.logging.access_log_file {
        write_info(LogLevel::Debug, &format!("[Server] Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(LogLevel::Debug, &format!("[Server] Error log: {path}"));
    }
}

pub fn log_route_registered(method: &str, pattern: &str, handler: &str) {
    write_info(LogLevel::Debug, &format!("[Route] {method:<6} {pattern} -> {handler}"));
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    write_info(LogLevel::Debug, &format!("[Connection] Accepted from: {peer_addr}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(LogLevel::Error, &format!("[ERROR] Failed to serve connection: {err:?}"));
}

pub fn log_error(message: &str) {
    write_error(LogLevel::Error, &format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(LogLevel::Warn, &format!("[WARN] {message}"));
}

pub fn log_debug(message: &str) {
    write_info(LogLevel::Debug, &format!("[DEBUG] {message}"));
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    if !enabled(LogLevel::Info) {
        return;
    }
    let line = entry.format(format);
    match writer::get() {
        Some(w) => w.write_access(&line),
        None => println!("{line}"),
    }
}

pub fn log_shutdown(signal: &str) {
    write_info(LogLevel::Info, &format!("[Shutdown] {signal} received, no longer accepting connections"));
}
