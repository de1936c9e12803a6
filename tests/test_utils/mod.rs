//! Shared test helpers: a minimal webhook mock.
//!
//! Binds a `TcpListener` on an ephemeral port, answers each HTTP request
//! with a canned status, and hands the captured requests back over a
//! channel so tests can assert on method, headers, and body.

#![allow(dead_code)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use rstest::fixture;

/// One request as received by the mock webhook.
#[derive(Debug)]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    /// Header names lower-cased, values trimmed.
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl CapturedRequest {
    fn read_from(stream: &mut TcpStream) -> CapturedRequest {
        let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
        let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));

        let mut request_line = String::new();
        reader
            .read_line(&mut request_line)
            .expect("read request line");
        let mut parts = request_line.split_whitespace();
        let method = parts.next().unwrap_or_default().to_string();
        let path = parts.next().unwrap_or_default().to_string();

        let mut headers = Vec::new();
        let mut content_length = 0usize;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).expect("read header");
            // The blank line ending the header block has no colon.
            let Some((key, value)) = line.trim().split_once(':') else {
                break;
            };
            let (key, value) = (key.trim().to_lowercase(), value.trim().to_string());
            if key == "content-length" {
                content_length = value.parse().unwrap_or(0);
            }
            headers.push((key, value));
        }

        let mut body = vec![0u8; content_length];
        if content_length > 0 {
            reader.read_exact(&mut body).expect("read body");
        }

        CapturedRequest {
            method,
            path,
            headers,
            body: String::from_utf8_lossy(&body).to_string(),
        }
    }

    /// Look up a header by its lower-case name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Parse the body as JSON.
    pub fn body_json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("request body is JSON")
    }
}

#[fixture]
pub fn tcp_listener() -> TcpListener {
    TcpListener::bind(("127.0.0.1", 0)).expect("bind ephemeral listener")
}

/// Spawn a mock webhook answering one request with `status`.
pub fn spawn_webhook(
    listener: TcpListener,
    status: u16,
) -> (SocketAddr, mpsc::Receiver<CapturedRequest>) {
    spawn_webhook_with_statuses(listener, vec![status])
}

/// Spawn a mock webhook answering successive requests with `statuses`,
/// then stopping.
pub fn spawn_webhook_with_statuses(
    listener: TcpListener,
    statuses: Vec<u16>,
) -> (SocketAddr, mpsc::Receiver<CapturedRequest>) {
    let addr = listener.local_addr().expect("listener has address");
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        for status in statuses {
            let Ok((mut stream, _)) = listener.accept() else {
                break;
            };
            let captured = CapturedRequest::read_from(&mut stream);
            // Connection: close keeps the client from pooling a socket this
            // mock is about to drop.
            let response = format!(
                "HTTP/1.1 {} {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                status,
                status_text(status)
            );
            let _ = stream.write_all(response.as_bytes());
            let _ = tx.send(captured);
        }
    });

    (addr, rx)
}

fn status_text(code: u16) -> &'static str {
    match code {
        200 => "OK",
        201 => "Created",
        400 => "Bad Request",
        404 => "Not Found",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}
