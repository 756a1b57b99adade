//! One-shot HTTP server on a loopback port for exercising real requests.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::time::Duration;

pub(crate) struct CapturedRequest {
    pub method: String,
    pub target: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

pub(crate) struct CannedResponse {
    pub status: u16,
    pub content_type: Option<&'static str>,
    pub body: Vec<u8>,
}

impl CannedResponse {
    pub fn new(status: u16, content_type: Option<&'static str>, body: &[u8]) -> Self {
        Self {
            status,
            content_type,
            body: body.to_vec(),
        }
    }
}

/// Serve a single request with `response`. Returns the base URL and the
/// request as the server saw it.
pub(crate) fn spawn_test_server(
    response: CannedResponse,
) -> (String, mpsc::Receiver<CapturedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind test server");
    let addr = listener.local_addr().expect("local addr");
    let (tx, rx) = mpsc::channel();

    std::thread::spawn(move || {
        let (mut socket, _) = listener.accept().expect("accept");
        socket
            .set_read_timeout(Some(Duration::from_secs(2)))
            .expect("set read timeout");

        let mut bytes = Vec::new();
        let mut chunk = [0_u8; 4096];
        while !bytes.windows(4).any(|window| window == b"\r\n\r\n") {
            match socket.read(&mut chunk) {
                Ok(0) | Err(_) => break,
                Ok(n) => bytes.extend_from_slice(&chunk[..n]),
            }
        }

        let header_end = bytes
            .windows(4)
            .position(|window| window == b"\r\n\r\n")
            .expect("request header boundary");
        let header_text = String::from_utf8_lossy(&bytes[..header_end]).to_string();
        let mut lines = header_text.split("\r\n");
        let mut request_line = lines.next().unwrap_or_default().split(' ');
        let method = request_line.next().unwrap_or_default().to_string();
        let target = request_line.next().unwrap_or_default().to_string();
        let headers: HashMap<String, String> = lines
            .filter_map(|line| line.split_once(':'))
            .map(|(name, value)| (name.trim().to_ascii_lowercase(), value.trim().to_string()))
            .collect();

        let mut body = bytes[header_end + 4..].to_vec();
        let content_length = headers
            .get("content-length")
            .and_then(|value| value.parse::<usize>().ok())
            .unwrap_or(0);
        while body.len() < content_length {
            match socket.read(&mut chunk) {
                Ok(0) | Err(_) => break,
                Ok(n) => body.extend_from_slice(&chunk[..n]),
            }
        }

        tx.send(CapturedRequest {
            method,
            target,
            headers,
            body,
        })
        .expect("send captured request");

        let mut head = format!(
            "HTTP/1.1 {} Test\r\nContent-Length: {}\r\nConnection: close\r\n",
            response.status,
            response.body.len()
        );
        if let Some(content_type) = response.content_type {
            head.push_str(&format!("Content-Type: {}\r\n", content_type));
        }
        head.push_str("\r\n");

        let _ = socket.write_all(head.as_bytes());
        let _ = socket.write_all(&response.body);
        let _ = socket.flush();
    });

    (format!("http://{}", addr), rx)
}

/// Accepts a connection and never answers.
pub(crate) fn spawn_silent_server(hold: Duration) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind test server");
    let addr = listener.local_addr().expect("local addr");

    std::thread::spawn(move || {
        if let Ok((socket, _)) = listener.accept() {
            std::thread::sleep(hold);
            drop(socket);
        }
    });

    format!("http://{}", addr)
}
