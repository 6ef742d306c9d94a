//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Start a programmable mock upstream. The responder receives the raw
/// request body and returns `(status, content_type, body)`.
pub async fn start_upstream<F>(respond: F) -> SocketAddr
where
    F: Fn(String) -> (u16, &'static str, String) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let respond = Arc::new(respond);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let respond = respond.clone();
                    tokio::spawn(async move {
                        let _ = serve_one(socket, respond).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Handle a single HTTP/1.1 exchange: read head + body, write response.
async fn serve_one<F>(mut socket: TcpStream, respond: Arc<F>) -> std::io::Result<()>
where
    F: Fn(String) -> (u16, &'static str, String) + Send + Sync + 'static,
{
    let mut raw = Vec::new();
    let mut chunk = [0u8; 4096];

    // Read until the end of headers.
    let head_end = loop {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        raw.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find_head_end(&raw) {
            break pos;
        }
    };

    // Read the declared body.
    let content_length = parse_content_length(&raw[..head_end]);
    while raw.len() < head_end + 4 + content_length {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        raw.extend_from_slice(&chunk[..n]);
    }
    let body = String::from_utf8_lossy(&raw[head_end + 4..]).into_owned();

    let (status, content_type, response_body) = respond(body);
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_line(status),
        content_type,
        response_body.len(),
        response_body
    );
    socket.write_all(response.as_bytes()).await?;
    socket.shutdown().await?;
    Ok(())
}

fn find_head_end(raw: &[u8]) -> Option<usize> {
    raw.windows(4).position(|w| w == b"\r\n\r\n")
}

fn parse_content_length(head: &[u8]) -> usize {
    let head = String::from_utf8_lossy(head);
    head.lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse().ok())
        .unwrap_or(0)
}

fn status_line(status: u16) -> &'static str {
    match status {
        200 => "200 OK",
        201 => "201 Created",
        400 => "400 Bad Request",
        404 => "404 Not Found",
        429 => "429 Too Many Requests",
        500 => "500 Internal Server Error",
        503 => "503 Service Unavailable",
        _ => "200 OK",
    }
}
