// Server options module
// Engine tunables, usually derived from `Config::server_options`

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

/// Options the listener and connection handlers run with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerOptions {
    /// Interface to bind; the port is chosen per `start` call
    pub host: IpAddr,
    /// Idle window before a connection that never completed its request is dropped
    pub idle_timeout: Duration,
    /// Upper bound for a single socket read
    pub read_buffer_size: usize,
    /// Bytes accumulated before dispatching even without a line terminator
    pub max_request_size: usize,
    pub access_log: bool,
    pub access_log_format: String,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            idle_timeout: Duration::from_secs(60),
            read_buffer_size: 1024,
            max_request_size: 8192,
            access_log: true,
            access_log_format: "combined".to_string(),
        }
    }
}
