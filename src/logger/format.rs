//! Access log line rendering
//!
//! `combined` and `common` follow the Apache/Nginx layouts, `json` emits one
//! object per line, anything else is treated as a `$variable` pattern.

use chrono::{DateTime, Local};
use std::time::Duration;

/// One served request, as it appears in the access log
#[derive(Debug, Clone)]
pub struct AccessLogEntry {
    pub remote_addr: String,
    pub time: DateTime<Local>,
    pub method: String,
    /// Path plus query string, as received
    pub target: String,
    pub http_version: String,
    pub status: u16,
    pub body_bytes: usize,
    pub referer: Option<String>,
    pub user_agent: Option<String>,
    pub elapsed: Duration,
}

impl AccessLogEntry {
    pub fn new(remote_addr: String, method: String, target: String) -> Self {
        Self {
            remote_addr,
            time: Local::now(),
            method,
            target,
            http_version: "1.1".to_string(),
            status: 200,
            body_bytes: 0,
            referer: None,
            user_agent: None,
            elapsed: Duration::ZERO,
        }
    }

    pub fn format(&self, format: &str) -> String {
        match format {
            "combined" => format!(
                "{} \"{}\" \"{}\"",
                self.common_line(),
                self.referer.as_deref().unwrap_or("-"),
                self.user_agent.as_deref().unwrap_or("-"),
            ),
            "common" => self.common_line(),
            "json" => self.json_line(),
            pattern => self.pattern_line(pattern),
        }
    }

    fn request_line(&self) -> String {
        format!("{} {} HTTP/{}", self.method, self.target, self.http_version)
    }

    fn time_local(&self) -> String {
        self.time.format("%d/%b/%Y:%H:%M:%S %z").to_string()
    }

    fn common_line(&self) -> String {
        format!(
            "{} - - [{}] \"{}\" {} {}",
            self.remote_addr,
            self.time_local(),
            self.request_line(),
            self.status,
            self.body_bytes,
        )
    }

    fn json_line(&self) -> String {
        serde_json::json!({
            "remote_addr": self.remote_addr,
            "time": self.time.to_rfc3339(),
            "method": self.method,
            "target": self.target,
            "http_version": self.http_version,
            "status": self.status,
            "body_bytes": self.body_bytes,
            "referer": self.referer,
            "user_agent": self.user_agent,
            "request_time_ms": self.elapsed.as_millis(),
        })
        .to_string()
    }

    /// Supported variables: `$remote_addr`, `$time_local`, `$time_iso8601`,
    /// `$request`, `$request_method`, `$request_uri`, `$status`,
    /// `$body_bytes_sent`, `$http_referer`, `$http_user_agent`,
    /// `$request_time` (seconds, 3 decimals).
    fn pattern_line(&self, pattern: &str) -> String {
        // $request_time and $request_* before $request
        let vars = [
            ("$remote_addr", self.remote_addr.clone()),
            ("$time_local", self.time_local()),
            ("$time_iso8601", self.time.to_rfc3339()),
            (
                "$request_time",
                format!("{:.3}", self.elapsed.as_secs_f64()),
            ),
            ("$request_method", self.method.clone()),
            ("$request_uri", self.target.clone()),
            ("$request", self.request_line()),
            ("$status", self.status.to_string()),
            ("$body_bytes_sent", self.body_bytes.to_string()),
            (
                "$http_referer",
                self.referer.clone().unwrap_or_else(|| "-".to_string()),
            ),
            (
                "$http_user_agent",
                self.user_agent.clone().unwrap_or_else(|| "-".to_string()),
            ),
        ];

        vars.iter()
            .fold(pattern.to_string(), |line, (var, value)| {
                line.replace(var, value)
            })
    }
}
