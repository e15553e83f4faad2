// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub http: HttpConfig,
    pub static_files: StaticFilesConfig,
    pub upstream: UpstreamConfig,
    pub chat: ChatConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
    pub max_body_size: u64,
}

/// Static front-end files
#[derive(Debug, Deserialize, Clone)]
pub struct StaticFilesConfig {
    /// Document root
    pub root: String,
    /// Target of the `GET /` redirect
    pub index_redirect: String,
    #[serde(default = "default_index_files")]
    pub index_files: Vec<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_index_files() -> Vec<String> {
    vec!["index.html".to_string(), "index.htm".to_string()]
}

/// Chat-completions endpoint the API routes relay to
#[derive(Debug, Deserialize, Clone)]
pub struct UpstreamConfig {
    pub url: String,
    pub model: String,
    pub timeout_secs: u64,
    /// Name of the environment variable holding the bearer token
    pub api_key_env: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    /// Number of trailing history entries forwarded upstream
    pub history_limit: usize,
    /// Append the request's `message` after the history.
    /// Off by default: only the history is forwarded.
    pub append_user_message: bool,
}
