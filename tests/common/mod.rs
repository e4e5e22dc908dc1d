//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};

use webhook_relay::config::RelayConfig;
use webhook_relay::{RelayServer, Shutdown};

/// A request as seen by the mock destination.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    /// Header names lowercased; first value wins.
    pub headers: HashMap<String, String>,
    pub body: String,
}

/// Mock destination: records every request and answers with a programmable status and body.
pub struct MockDestination {
    pub addr: SocketAddr,
    requests: Arc<Mutex<mpsc::UnboundedReceiver<CapturedRequest>>>,
}

impl MockDestination {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Next captured request, waiting up to two seconds.
    pub async fn next_request(&self) -> CapturedRequest {
        let mut rx = self.requests.lock().await;
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("destination received no request")
            .expect("destination closed")
    }
}

/// Start a destination that always answers `status` with `body`.
pub async fn start_destination(status: u16, body: &'static str) -> MockDestination {
    start_bytes_destination(status, body.as_bytes()).await
}

/// Start a destination that answers with raw bytes, not necessarily UTF-8.
pub async fn start_bytes_destination(status: u16, body: &'static [u8]) -> MockDestination {
    start_programmable_destination(move |_| async move { (status, body.to_vec()) }).await
}

/// Start a programmable destination on an ephemeral port.
pub async fn start_programmable_destination<F, Fut>(f: F) -> MockDestination
where
    F: Fn(CapturedRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, Vec<u8>)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        let Some(request) = read_request(&mut socket).await else {
                            return;
                        };
                        let _ = tx.send(request.clone());
                        let (status, body) = f(request).await;

                        let head = format!(
                            "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                            status,
                            reason(status),
                            body.len(),
                        );
                        let mut response = head.into_bytes();
                        response.extend_from_slice(&body);
                        let _ = socket.write_all(&response).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    MockDestination {
        addr,
        requests: Arc::new(Mutex::new(rx)),
    }
}

/// Start a destination that accepts connections but never answers.
pub async fn start_silent_destination() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    addr
}

/// An address on which nothing is listening.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// A running relay under test.
pub struct TestRelay {
    pub addr: SocketAddr,
    pub server_registry: webhook_relay::SubscriptionRegistry,
    shutdown: Shutdown,
}

impl TestRelay {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn stop(&self) {
        self.shutdown.trigger();
    }
}

/// Config suitable for tests: ephemeral port, short forwarding timeouts.
pub fn test_config() -> RelayConfig {
    let mut config = RelayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.forwarding.connect_timeout_ms = 1_000;
    config.forwarding.read_timeout_ms = 1_000;
    config.timeouts.request_secs = 10;
    config
}

/// Start a relay with `config` and wait for it to accept connections.
pub async fn start_relay(config: RelayConfig) -> TestRelay {
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = RelayServer::new(config).unwrap();
    let server_registry = server.registry().clone();

    let shutdown = Shutdown::new();
    let (_, config_updates) = mpsc::unbounded_channel();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });

    wait_until_listening(addr).await;

    TestRelay {
        addr,
        server_registry,
        shutdown,
    }
}

/// Poll until a TCP connection to `addr` succeeds.
pub async fn wait_until_listening(addr: SocketAddr) {
    for _ in 0..50 {
        if TcpStream::connect(addr).await.is_ok() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("nothing listening on {}", addr);
}

/// HTTP client that never goes through a system proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

async fn read_request(socket: &mut TcpStream) -> Option<CapturedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split(' ');
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();

    let mut headers = HashMap::new();
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            headers
                .entry(name.trim().to_ascii_lowercase())
                .or_insert_with(|| value.trim().to_string());
        }
    }

    let content_length: usize = headers
        .get("content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);

    let mut body = buf[header_end + 4..].to_vec();
    while body.len() < content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    Some(CapturedRequest {
        method,
        path,
        headers,
        body: String::from_utf8_lossy(&body).to_string(),
    })
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        302 => "Found",
        400 => "Bad Request",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}
