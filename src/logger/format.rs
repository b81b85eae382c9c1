//! Access log line rendering
//!
//! One line per served connection, in one of:
//! - `combined`: CLF plus `"-" "-"` for referer and agent, which are never parsed
//! - `common`: NCSA Common Log Format
//! - `json`: one object per line
//! - anything else: a pattern with `$variable` substitution

use chrono::Local;
use serde_json::json;

/// Placeholder for values a request did not provide
const MISSING: &str = "-";

/// Access log entry for one served connection
#[derive(Debug, Clone)]
pub struct AccessLogEntry {
    /// Client address
    pub remote_addr: String,
    /// Time the request was received
    pub time: chrono::DateTime<Local>,
    /// HTTP method, `-` when the request line was malformed
    pub method: String,
    /// Request target as sent, `-` when the request line was malformed
    pub path: String,
    /// Response status code
    pub status: u16,
    /// Response body size in bytes
    pub body_bytes: usize,
    /// Request processing time in microseconds
    pub request_time_us: u64,
}

impl AccessLogEntry {
    /// Entry stamped with the current time; request fields start as `-`
    pub fn new(remote_addr: String) -> Self {
        Self {
            remote_addr,
            time: Local::now(),
            method: MISSING.to_string(),
            path: MISSING.to_string(),
            status: 0,
            body_bytes: 0,
            request_time_us: 0,
        }
    }

    /// Render in `format` (`combined`, `common`, `json`, or a custom pattern)
    pub fn format(&self, format: &str) -> String {
        match format {
            "combined" => self.format_combined(),
            "common" => self.format_common(),
            "json" => self.format_json(),
            custom => self.format_custom(custom),
        }
    }

    fn request_line(&self) -> String {
        format!("{} {} HTTP/1.1", self.method, self.path)
    }

    fn time_local(&self) -> String {
        self.time.format("%d/%b/%Y:%H:%M:%S %z").to_string()
    }

    /// `$remote_addr - - [$time_local] "$request" $status $body_bytes_sent "-" "-"`
    fn format_combined(&self) -> String {
        format!("{} \"{MISSING}\" \"{MISSING}\"", self.format_common())
    }

    /// `$remote_addr - - [$time_local] "$request" $status $body_bytes_sent`
    fn format_common(&self) -> String {
        format!(
            "{} - - [{}] \"{}\" {} {}",
            self.remote_addr,
            self.time_local(),
            self.request_line(),
            self.status,
            self.body_bytes,
        )
    }

    fn format_json(&self) -> String {
        json!({
            "remote_addr": self.remote_addr,
            "time": self.time.to_rfc3339(),
            "method": self.method,
            "path": self.path,
            "status": self.status,
            "body_bytes": self.body_bytes,
            "request_time_us": self.request_time_us,
        })
        .to_string()
    }

    /// Custom format with variable substitution
    ///
    /// Supported variables:
    /// - `$remote_addr` - Client address
    /// - `$time_local` - Local time in Common Log Format
    /// - `$time_iso8601` - ISO 8601 timestamp
    /// - `$request` - Full request line ("METHOD /path HTTP/1.1")
    /// - `$request_method` - HTTP method
    /// - `$request_uri` - Request target
    /// - `$status` - Response status code
    /// - `$body_bytes_sent` - Response body size
    /// - `$request_time` - Processing time in seconds (3 decimal places)
    fn format_custom(&self, pattern: &str) -> String {
        // $request_time and $request_method before $request to avoid partial replacement
        #[allow(clippy::cast_precision_loss)]
        let request_time = self.request_time_us as f64 / 1_000_000.0;

        pattern
            .replace("$remote_addr", &self.remote_addr)
            .replace("$time_local", &self.time_local())
            .replace("$time_iso8601", &self.time.to_rfc3339())
            .replace("$request_time", &format!("{request_time:.3}"))
            .replace("$request_method", &self.method)
            .replace("$request_uri", &self.path)
            .replace("$request", &self.request_line())
            .replace("$status", &self.status.to_string())
            .replace("$body_bytes_sent", &self.body_bytes.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_entry() -> AccessLogEntry {
        let mut entry = AccessLogEntry::new("192.168.1.1:50432".to_string());
        entry.method = "GET".to_string();
        entry.path = "/docs/readme.txt".to_string();
        entry.status = 200;
        entry.body_bytes = 1234;
        entry.request_time_us = 12_000;
        entry
    }

    #[test]
    fn test_format_combined() {
        let log = create_test_entry().format("combined");
        assert!(log.starts_with("192.168.1.1:50432 - - ["));
        assert!(log.contains("\"GET /docs/readme.txt HTTP/1.1\""));
        assert!(log.contains("200 1234"));
        assert!(log.ends_with("\"-\" \"-\""));
    }

    #[test]
    fn test_format_common() {
        let log = create_test_entry().format("common");
        assert!(log.contains("\"GET /docs/readme.txt HTTP/1.1\" 200 1234"));
        assert!(!log.ends_with("\"-\""));
    }

    #[test]
    fn test_format_json() {
        let log = create_test_entry().format("json");
        let value: serde_json::Value = serde_json::from_str(&log).unwrap();
        assert_eq!(value["method"], "GET");
        assert_eq!(value["path"], "/docs/readme.txt");
        assert_eq!(value["status"], 200);
        assert_eq!(value["body_bytes"], 1234);
    }

    #[test]
    fn test_format_custom() {
        let log = create_test_entry().format("$request_method $request_uri -> $status in $request_time");
        assert_eq!(log, "GET /docs/readme.txt -> 200 in 0.012");
    }

    #[test]
    fn test_malformed_request_placeholders() {
        let mut entry = AccessLogEntry::new("10.0.0.1:1".to_string());
        entry.status = 400;
        assert!(entry.format("common").contains("\"- - HTTP/1.1\" 400 0"));
    }
}
