//! End-to-end tests against a real listener on an ephemeral loopback port.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use mountserve::{FileServer, ServerError, ServerEvent, ServerOptions};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

fn test_server(idle_timeout: Duration) -> FileServer {
    FileServer::new(ServerOptions {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        idle_timeout,
        access_log: false,
        ..ServerOptions::default()
    })
}

/// Start on port 0 and wait until the accept loop reports ready
async fn start(server: &FileServer) -> SocketAddr {
    let mut running = server.watch_running();
    let addr = server.start(0).expect("Failed to start server");
    timeout(WAIT, running.wait_for(|r| *r))
        .await
        .expect("Server never reported running")
        .unwrap();
    addr
}

/// Send raw bytes and read until the server closes the connection
async fn exchange(addr: SocketAddr, request: &[u8]) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request).await.unwrap();

    let mut response = Vec::new();
    timeout(WAIT, stream.read_to_end(&mut response))
        .await
        .expect("Server did not close the connection")
        .unwrap();
    String::from_utf8_lossy(&response).into_owned()
}

async fn get(addr: SocketAddr, path: &str) -> String {
    exchange(addr, format!("GET {path} HTTP/1.1\r\nHost: localhost\r\n\r\n").as_bytes()).await
}

fn extract_body(response: &str) -> &str {
    response.split_once("\r\n\r\n").map_or("", |(_, body)| body)
}

fn site() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>hello</h1>").unwrap();
    std::fs::create_dir(dir.path().join("css")).unwrap();
    std::fs::write(dir.path().join("css/site.css"), "body {}").unwrap();
    dir
}

#[tokio::test]
async fn test_start_and_stop_transitions() {
    let server = test_server(Duration::from_secs(60));
    assert!(!server.is_running());

    let addr = start(&server).await;
    assert!(server.is_running());
    assert_eq!(server.local_addr(), Some(addr));

    server.stop().await;
    assert!(!server.is_running());
    assert!(TcpStream::connect(addr).await.is_err());

    // Restart after stop is allowed
    start(&server).await;
    server.stop().await;
}

#[tokio::test]
async fn test_already_running_leaves_mounts() {
    let dir = site();
    let server = test_server(Duration::from_secs(60));
    server.mount(dir.path(), "/site");
    let addr = start(&server).await;

    assert!(matches!(server.start(0), Err(ServerError::AlreadyRunning)));
    assert!(server.is_running());
    assert_eq!(
        server.mounted_directories().get("/site"),
        Some(&dir.path().to_path_buf())
    );
    assert!(get(addr, "/site/index.html").await.starts_with("HTTP/1.1 200 OK"));

    server.stop().await;
}

#[tokio::test]
async fn test_port_unavailable() {
    let holder = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = holder.local_addr().unwrap().port();

    let server = test_server(Duration::from_secs(60));
    let err = server.start(port).unwrap_err();
    assert!(matches!(err, ServerError::PortUnavailable { .. }), "{err}");
    assert!(!server.is_running());
    assert!(server.local_addr().is_none());
}

#[tokio::test]
async fn test_serves_mounted_files() {
    let dir = site();
    let server = test_server(Duration::from_secs(60));
    server.mount(dir.path(), "/site");
    let addr = start(&server).await;

    let response = get(addr, "/site/index.html").await;
    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"), "{response}");
    assert!(response.contains("Content-Type: text/html\r\n"));
    assert!(response.contains("Content-Length: 14\r\n"));
    assert!(response.contains("Connection: close\r\n"));
    assert_eq!(extract_body(&response), "<h1>hello</h1>");

    let response = get(addr, "/site/css/site.css").await;
    assert!(response.contains("Content-Type: text/css\r\n"));
    assert_eq!(extract_body(&response), "body {}");

    server.stop().await;
}

#[tokio::test]
async fn test_root_mount_serves_top_level_files() {
    let dir = site();
    let server = test_server(Duration::from_secs(60));
    server.mount(dir.path(), "/");
    let addr = start(&server).await;

    let response = get(addr, "/index.html").await;
    assert!(response.starts_with("HTTP/1.1 200 OK"), "{response}");
    assert_eq!(extract_body(&response), "<h1>hello</h1>");

    server.stop().await;
}

#[tokio::test]
async fn test_not_found() {
    let dir = site();
    let server = test_server(Duration::from_secs(60));
    server.mount(dir.path(), "/site");
    let addr = start(&server).await;

    for path in ["/site/missing.txt", "/elsewhere/index.html", "/site/css"] {
        let response = get(addr, path).await;
        assert!(response.starts_with("HTTP/1.1 404 Not Found"), "{path}: {response}");
        assert!(response.contains("Content-Type: text/plain\r\n"));
        assert_eq!(extract_body(&response), "File not found");
    }

    server.stop().await;
}

#[tokio::test]
async fn test_traversal_is_not_served() {
    let outer = tempfile::tempdir().unwrap();
    let inner = outer.path().join("public");
    std::fs::create_dir(&inner).unwrap();
    std::fs::write(outer.path().join("secret.txt"), "secret").unwrap();

    let server = test_server(Duration::from_secs(60));
    server.mount(&inner, "/pub");
    let addr = start(&server).await;

    for path in ["/pub/../secret.txt", "/pub/%2e%2e/secret.txt"] {
        let response = get(addr, path).await;
        assert!(response.starts_with("HTTP/1.1 404"), "{path}: {response}");
        assert!(!response.contains("secret"));
    }

    server.stop().await;
}

#[tokio::test]
async fn test_rejects_non_get_and_malformed() {
    let server = test_server(Duration::from_secs(60));
    let addr = start(&server).await;

    let response = exchange(addr, b"POST /x HTTP/1.1\r\n\r\n").await;
    assert!(response.starts_with("HTTP/1.1 405 Method Not Allowed"), "{response}");
    assert!(response.contains("Allow: GET\r\n"));

    let response = exchange(addr, b"GARBAGE\r\n").await;
    assert!(response.starts_with("HTTP/1.1 400 Bad Request"), "{response}");

    server.stop().await;
}

#[tokio::test]
async fn test_mount_and_unmount_while_running() {
    let dir = site();
    let server = test_server(Duration::from_secs(60));
    let addr = start(&server).await;

    assert!(get(addr, "/live/index.html").await.contains("404"));
    server.mount(dir.path(), "/live");
    assert!(get(addr, "/live/index.html").await.contains("200 OK"));
    server.unmount("/live");
    assert!(get(addr, "/live/index.html").await.contains("404"));

    server.stop().await;
}

#[tokio::test]
async fn test_idle_connection_is_closed() {
    let server = test_server(Duration::from_millis(200));
    let addr = start(&server).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    let mut buf = Vec::new();
    let n = timeout(WAIT, stream.read_to_end(&mut buf))
        .await
        .expect("Idle connection was never closed")
        .unwrap();
    assert_eq!(n, 0);

    // The listener keeps serving after a timed-out connection
    assert!(get(addr, "/").await.starts_with("HTTP/1.1 404"));

    server.stop().await;
}

#[tokio::test]
async fn test_concurrent_requests() {
    let dir = site();
    let server = test_server(Duration::from_secs(60));
    server.mount(dir.path(), "/site");
    let addr = start(&server).await;

    // An idle client must not hold up the others
    let _idle = TcpStream::connect(addr).await.unwrap();

    let requests: Vec<_> = (0..16)
        .map(|_| tokio::spawn(get(addr, "/site/index.html")))
        .collect();
    for request in requests {
        let response = request.await.unwrap();
        assert_eq!(extract_body(&response), "<h1>hello</h1>");
    }

    server.stop().await;
}

#[tokio::test]
async fn test_events_are_published() {
    let dir = site();
    let server = test_server(Duration::from_secs(60));
    let mut events = server.subscribe();

    server.mount(dir.path(), "/site");
    let addr = start(&server).await;
    server.unmount("/site");
    server.stop().await;

    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    assert_eq!(
        seen,
        vec![
            ServerEvent::Mounted {
                virtual_path: "/site".to_string(),
                location: PathBuf::from(dir.path()),
            },
            ServerEvent::Started { addr },
            ServerEvent::Unmounted {
                virtual_path: "/site".to_string(),
            },
            ServerEvent::Stopped { addr },
        ]
    );
}
