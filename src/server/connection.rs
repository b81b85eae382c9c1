// Connection handling module
// One accepted connection: receive, dispatch, respond, close

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

use super::ServerOptions;
use crate::handler;
use crate::logger::{self, AccessLogEntry};
use crate::mount::MountTable;

/// Time allowed for the peer to close after our response before dropping it
const LINGER_TIMEOUT: Duration = Duration::from_secs(1);

/// Everything a connection task needs, shared across all of them
pub struct ConnectionContext {
    pub mounts: Arc<MountTable>,
    pub options: Arc<ServerOptions>,
}

/// Serve exactly one request on `stream`, then close it.
///
/// Phases: Connected -> Receiving -> Dispatching -> Responding -> Closed.
/// The idle timeout covers Connected and Receiving only; once a request has
/// arrived it is always answered.
pub async fn serve_connection(
    mut stream: TcpStream,
    peer_addr: SocketAddr,
    ctx: Arc<ConnectionContext>,
) {
    let started = Instant::now();
    let mut entry = AccessLogEntry::new(peer_addr.to_string());
    let options = &ctx.options;

    let received = tokio::time::timeout(
        options.idle_timeout,
        receive_request(&mut stream, options.read_buffer_size, options.max_request_size),
    )
    .await;

    let raw = match received {
        Ok(Ok(Some(raw))) => raw,
        Ok(Ok(None)) => {
            debug!(peer = %peer_addr, "Connection closed before a request arrived");
            return;
        }
        Ok(Err(e)) => {
            logger::log_connection_error(&peer_addr, &e);
            return;
        }
        Err(_) => {
            logger::log_connection_timeout(&peer_addr, options.idle_timeout.as_secs());
            return;
        }
    };

    let dispatched = handler::handle_request(&raw, &ctx.mounts).await;

    if let Err(e) = send_response(&mut stream, &dispatched.response.to_bytes()).await {
        logger::log_connection_error(&peer_addr, &e);
    }

    if options.access_log {
        if let Some(request) = &dispatched.request {
            entry.method.clone_from(&request.method);
            entry.path.clone_from(&request.path);
        }
        entry.status = dispatched.response.status.code();
        entry.body_bytes = dispatched.response.body.len();
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &options.access_log_format);
    }

    linger(&mut stream).await;
}

/// Accumulate bytes until the request line is complete.
///
/// Stops at the first `\n`, at EOF, or once `max_request_size` bytes are
/// buffered. Returns `None` if the peer closed without sending anything.
pub async fn receive_request<R>(
    reader: &mut R,
    read_buffer_size: usize,
    max_request_size: usize,
) -> std::io::Result<Option<Vec<u8>>>
where
    R: AsyncRead + Unpin,
{
    let mut chunk = vec![0u8; read_buffer_size.max(1)];
    let mut request = Vec::new();

    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        request.extend_from_slice(&chunk[..n]);
        if chunk[..n].contains(&b'\n') || request.len() >= max_request_size {
            break;
        }
    }

    Ok(if request.is_empty() { None } else { Some(request) })
}

/// Write the whole response in one call and half-close.
async fn send_response(stream: &mut TcpStream, bytes: &[u8]) -> std::io::Result<()> {
    stream.write_all(bytes).await?;
    stream.shutdown().await
}

/// Drain unread request bytes until the peer closes or `LINGER_TIMEOUT` passes.
///
/// Closing with unread data makes the kernel send a reset, which can discard
/// a response the peer has not read yet.
async fn linger(stream: &mut TcpStream) {
    let mut sink = [0u8; 512];
    let _ = tokio::time::timeout(LINGER_TIMEOUT, async {
        while let Ok(n) = stream.read(&mut sink).await {
            if n == 0 {
                break;
            }
        }
    })
    .await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_receive_stops_at_line_end() {
        let mut input: &[u8] = b"GET /a HTTP/1.1\r\nHost: x\r\n\r\n";
        let raw = receive_request(&mut input, 1024, 8192).await.unwrap().unwrap();
        assert!(raw.starts_with(b"GET /a HTTP/1.1\r\n"));
    }

    #[tokio::test]
    async fn test_receive_accumulates_small_reads() {
        let mut input: &[u8] = b"GET /a/long/path.txt HTTP/1.1\r\n";
        let raw = receive_request(&mut input, 4, 8192).await.unwrap().unwrap();
        assert_eq!(raw, b"GET /a/long/path.txt HTTP/1.1\r\n");
    }

    #[tokio::test]
    async fn test_receive_eof_without_terminator() {
        let mut input: &[u8] = b"POST /x";
        let raw = receive_request(&mut input, 1024, 8192).await.unwrap().unwrap();
        assert_eq!(raw, b"POST /x");
    }

    #[tokio::test]
    async fn test_receive_empty_connection() {
        let mut input: &[u8] = b"";
        assert!(receive_request(&mut input, 1024, 8192).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_receive_caps_request_size() {
        let long = vec![b'a'; 100];
        let mut input: &[u8] = &long;
        let raw = receive_request(&mut input, 16, 32).await.unwrap().unwrap();
        assert_eq!(raw.len(), 32);
    }
}
