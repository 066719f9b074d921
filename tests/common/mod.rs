//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anki_bridge::config::BridgeConfig;
use anki_bridge::http::HttpServer;
use anki_bridge::lifecycle::Shutdown;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

pub type ClientSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A request as seen by the mock AnkiConnect.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub head: String,
    pub body: String,
}

impl RecordedRequest {
    pub fn method(&self) -> &str {
        self.head.split_whitespace().next().unwrap_or("")
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<String> {
        self.head.lines().skip(1).find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case(name)
                .then(|| value.trim().to_string())
        })
    }
}

/// Mock AnkiConnect that records every request it receives.
#[derive(Clone)]
pub struct MockUpstream {
    pub addr: SocketAddr,
    calls: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockUpstream {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

/// Start a mock AnkiConnect answering every request with `status` and `body`.
pub async fn start_mock_upstream(status: u16, body: &'static str) -> MockUpstream {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let upstream = MockUpstream {
        addr: listener.local_addr().unwrap(),
        calls: Arc::new(AtomicUsize::new(0)),
        requests: Arc::new(Mutex::new(Vec::new())),
    };

    let state = upstream.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let state = state.clone();
                    tokio::spawn(async move {
                        let Some(request) = read_request(&mut socket).await else {
                            return;
                        };
                        state.calls.fetch_add(1, Ordering::SeqCst);
                        state.requests.lock().unwrap().push(request);

                        let status_text = match status {
                            200 => "200 OK",
                            400 => "400 Bad Request",
                            500 => "500 Internal Server Error",
                            _ => "200 OK",
                        };
                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nX-Upstream: anki\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    upstream
}

/// Read one HTTP/1.1 request (head plus Content-Length body).
async fn read_request(socket: &mut TcpStream) -> Option<RecordedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = buf[head_end + 4..].to_vec();
    while body.len() < content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    Some(RecordedRequest {
        head,
        body: String::from_utf8_lossy(&body).to_string(),
    })
}

/// A running bridge bound to an ephemeral port.
pub struct Bridge {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
}

impl Bridge {
    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Config pointing at `upstream` with a short reply timeout.
pub fn test_config(upstream: &MockUpstream) -> BridgeConfig {
    let mut config = BridgeConfig::default();
    config.listener.host = "127.0.0.1".into();
    config.upstream.url = upstream.url();
    config.upstream.timeout_secs = 5;
    config.correlation.reply_timeout_ms = 300;
    config.timeouts.request_secs = 10;
    config
}

pub async fn start_bridge(config: BridgeConfig) -> Bridge {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config).unwrap();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    Bridge { addr, shutdown }
}

pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Poll the status endpoint until `expected` clients are registered.
pub async fn wait_for_clients(bridge: &Bridge, expected: usize) {
    let client = http_client();
    for _ in 0..100 {
        if let Ok(res) = client.get(bridge.http_url("/bridge/status")).send().await {
            if let Ok(status) = res.json::<Value>().await {
                if status["clients"] == json!(expected) {
                    return;
                }
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("bridge never reached {} connected clients", expected);
}

pub async fn connect_client(bridge: &Bridge) -> ClientSocket {
    let (socket, _) = connect_async(bridge.ws_url()).await.expect("WebSocket connect failed");
    socket
}

/// Next text frame from the bridge, parsed as JSON.
pub async fn next_command(socket: &mut ClientSocket) -> Value {
    loop {
        let message = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("timed out waiting for a command")
            .expect("socket closed")
            .expect("socket error");
        if let Message::Text(text) = message {
            return serde_json::from_str(text.as_str()).expect("command is JSON");
        }
    }
}

pub async fn send_reply(socket: &mut ClientSocket, message_id: &str, body: Value) {
    let reply = json!({ "command": "response", "messageId": message_id, "body": body });
    socket
        .send(Message::Text(reply.to_string().into()))
        .await
        .unwrap();
}

/// Simulated asbplayer: answers every command with `body` until the socket closes.
pub fn spawn_auto_reply(mut socket: ClientSocket, body: Value) -> tokio::task::JoinHandle<Vec<Value>> {
    tokio::spawn(async move {
        let mut seen = Vec::new();
        while let Some(Ok(message)) = socket.next().await {
            if let Message::Text(text) = message {
                let command: Value = match serde_json::from_str(text.as_str()) {
                    Ok(command) => command,
                    Err(_) => continue,
                };
                let id = command["messageId"].as_str().unwrap_or_default().to_string();
                seen.push(command);
                send_reply(&mut socket, &id, body.clone()).await;
            }
        }
        seen
    })
}
