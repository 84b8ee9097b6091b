//! In-process HTTP server with canned responses, for client tests.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

#[derive(Debug, Clone)]
pub(crate) struct CannedResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
    /// Held back this long before the response starts.
    pub delay: Duration,
    /// When set, the body is ignored and these pieces are sent with
    /// chunked encoding, each after waiting the given interval.
    pub trickle: Option<(Vec<String>, Duration)>,
}

impl CannedResponse {
    fn canned(status: u16, content_type: &'static str, body: String) -> Self {
        Self {
            status,
            content_type,
            body,
            delay: Duration::ZERO,
            trickle: None,
        }
    }

    pub fn html(body: &str) -> Self {
        Self::canned(200, "text/html; charset=utf-8", body.to_string())
    }

    pub fn json(body: serde_json::Value) -> Self {
        Self::canned(200, "application/json", body.to_string())
    }

    pub fn event_stream(body: &str) -> Self {
        Self::canned(200, "text/event-stream", body.to_string())
    }

    /// Event stream that sends one piece per `interval`.
    pub fn trickled_event_stream(pieces: Vec<String>, interval: Duration) -> Self {
        Self {
            trickle: Some((pieces, interval)),
            ..Self::canned(200, "text/event-stream", String::new())
        }
    }

    pub fn status(status: u16, body: &str) -> Self {
        Self::canned(status, "text/plain", body.to_string())
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl RecordedRequest {
    pub fn json_body(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

/// Serves one canned response per path; unknown paths get a 404.
pub(crate) struct TestServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    shutdown: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    pub async fn start(routes: Vec<(&str, CannedResponse)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let routes: Arc<HashMap<String, CannedResponse>> = Arc::new(
            routes
                .into_iter()
                .map(|(path, response)| (path.to_string(), response))
                .collect(),
        );
        let requests = Arc::new(Mutex::new(Vec::new()));
        let (shutdown_tx, mut shutdown_rx) = tokio::sync::oneshot::channel();

        let recorded = requests.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    accept = listener.accept() => {
                        if let Ok((socket, _)) = accept {
                            let routes = routes.clone();
                            let recorded = recorded.clone();
                            tokio::spawn(async move {
                                serve_connection(socket, routes, recorded).await;
                            });
                        }
                    }
                }
            }
        });

        Self {
            addr,
            requests,
            shutdown: Some(shutdown_tx),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

async fn serve_connection(
    mut socket: TcpStream,
    routes: Arc<HashMap<String, CannedResponse>>,
    recorded: Arc<Mutex<Vec<RecordedRequest>>>,
) {
    let Some(request) = read_request(&mut socket).await else {
        return;
    };

    let response = routes
        .get(&request.path)
        .cloned()
        .unwrap_or_else(|| CannedResponse::status(404, "not found"));

    recorded.lock().unwrap().push(request);

    tokio::time::sleep(response.delay).await;

    let reason = if response.status < 400 { "OK" } else { "Error" };

    match &response.trickle {
        None => {
            let head = format!(
                "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                response.status,
                reason,
                response.content_type,
                response.body.len()
            );
            let _ = socket.write_all(head.as_bytes()).await;
            let _ = socket.write_all(response.body.as_bytes()).await;
        }
        Some((pieces, interval)) => {
            let head = format!(
                "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n",
                response.status, reason, response.content_type
            );
            let _ = socket.write_all(head.as_bytes()).await;
            let _ = socket.flush().await;
            for piece in pieces {
                tokio::time::sleep(*interval).await;
                let chunk = format!("{:x}\r\n{}\r\n", piece.len(), piece);
                if socket.write_all(chunk.as_bytes()).await.is_err() {
                    return;
                }
                let _ = socket.flush().await;
            }
            let _ = socket.write_all(b"0\r\n\r\n").await;
        }
    }

    let _ = socket.flush().await;
    let _ = socket.shutdown().await;
}

async fn read_request(socket: &mut TcpStream) -> Option<RecordedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();

    let headers: HashMap<String, String> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();

    let content_length = headers
        .get("content-length")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let body_end = buf.len().min(header_end + content_length);
    let body = String::from_utf8_lossy(&buf[header_end..body_end]).to_string();

    Some(RecordedRequest {
        method,
        path,
        headers,
        body,
    })
}

/// Settings pointing nowhere in particular, with proxies disabled so
/// requests to the local test server go direct.
pub(crate) fn test_settings() -> crate::config::Settings {
    let mut settings = crate::config::Settings::new("test-serper-key", "test-openai-key");
    settings.no_proxy = true;
    settings.http_timeout = Duration::from_secs(5);
    settings
}
