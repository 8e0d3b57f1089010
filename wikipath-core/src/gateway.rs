//! Search RPC over TCP: one JSON request per line, one JSON response per line.

use crate::error::SearchError;
use crate::pathfinder::{Pathfinder, SearchPath};
use serde::{Deserialize, Serialize};
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

/// Lines longer than this are rejected without being parsed.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

static CONNECTION_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindRequest {
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FindResponse {
    Found { path: Vec<String>, length: usize },
    Failed { error: ErrorBody },
}

impl FindResponse {
    fn invalid_input(message: impl Into<String>) -> Self {
        FindResponse::Failed {
            error: ErrorBody {
                kind: "invalid_input".to_string(),
                message: message.into(),
            },
        }
    }
}

impl From<Result<SearchPath, SearchError>> for FindResponse {
    fn from(result: Result<SearchPath, SearchError>) -> Self {
        match result {
            Ok(path) => FindResponse::Found {
                length: path.length(),
                path: path.into_pages(),
            },
            Err(e) => FindResponse::Failed {
                error: ErrorBody {
                    kind: e.kind().to_string(),
                    message: e.to_string(),
                },
            },
        }
    }
}

pub struct Gateway {
    pathfinder: Arc<Pathfinder>,
}

impl Gateway {
    pub fn new(pathfinder: Arc<Pathfinder>) -> Self {
        Self { pathfinder }
    }

    /// Answer one request line.
    pub async fn handle_line(&self, line: &str) -> FindResponse {
        match serde_json::from_str::<FindRequest>(line) {
            Ok(request) => self
                .pathfinder
                .find(&request.source, &request.target)
                .await
                .into(),
            Err(e) => FindResponse::invalid_input(format!("Malformed request: {}", e)),
        }
    }

    /// Accept connections forever, one task per client.
    pub async fn serve(self: Arc<Self>, listener: TcpListener) -> io::Result<()> {
        info!("Listening on {}", listener.local_addr()?);
        loop {
            let (stream, peer_addr) = match listener.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    // Most accept errors are transient
                    error!("Failed to accept TCP connection: {}", e);
                    continue;
                }
            };

            let conn_tag = format!("C{:03}", CONNECTION_COUNTER.fetch_add(1, Ordering::Relaxed));
            let gateway = self.clone();
            tokio::spawn(async move {
                debug!(conn = %conn_tag, "Client connected from {}", peer_addr);
                if let Err(e) = gateway.handle_connection(stream).await {
                    warn!(conn = %conn_tag, "Connection error: {}", e);
                }
                debug!(conn = %conn_tag, "Client disconnected");
            });
        }
    }

    async fn handle_connection(&self, stream: TcpStream) -> io::Result<()> {
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);
        let mut line = String::new();

        loop {
            line.clear();
            let response = match read_line_bounded(&mut reader, &mut line, MAX_LINE_BYTES).await {
                Ok(0) => return Ok(()),
                Ok(_) if line.trim().is_empty() => continue,
                Ok(_) => self.handle_line(line.trim()).await,
                Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                    FindResponse::invalid_input(e.to_string())
                }
                Err(e) => return Err(e),
            };

            let mut out = serde_json::to_vec(&response)?;
            out.push(b'\n');
            writer.write_all(&out).await?;
            writer.flush().await?;
        }
    }
}

/// Read one newline-terminated line of at most `max_bytes` into `buf`.
///
/// An oversized line is skipped up to its newline and reported as
/// `InvalidData` with its size; so is a line that is not UTF-8. Either way the
/// reader is left at the start of the next line.
pub async fn read_line_bounded<R: AsyncBufRead + Unpin>(
    reader: &mut R,
    buf: &mut String,
    max_bytes: usize,
) -> io::Result<usize> {
    let mut raw = Vec::new();
    let read = (&mut *reader)
        .take((max_bytes as u64).saturating_add(1))
        .read_until(b'\n', &mut raw)
        .await?;

    if read > max_bytes {
        let mut rejected = read;
        if raw.last() != Some(&b'\n') {
            rejected += skip_line(reader).await?;
        }
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Line of {} bytes exceeds the {} byte limit", rejected, max_bytes),
        ));
    }

    let line = String::from_utf8(raw).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Line is not valid UTF-8: {}", e.utf8_error()),
        )
    })?;
    buf.push_str(&line);
    Ok(read)
}

/// Discard input up to and including the next newline; returns bytes skipped.
async fn skip_line<R: AsyncBufRead + Unpin>(reader: &mut R) -> io::Result<usize> {
    let mut skipped = 0;
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(skipped);
        }
        let (len, done) = match available.iter().position(|&b| b == b'\n') {
            Some(pos) => (pos + 1, true),
            None => (available.len(), false),
        };
        reader.consume(len);
        skipped += len;
        if done {
            return Ok(skipped);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_line_bounded_rejects_long_lines() {
        let input = format!("{}\nnext\n", "x".repeat(100));
        let mut reader = BufReader::new(input.as_bytes());
        let mut line = String::new();

        let err = read_line_bounded(&mut reader, &mut line, 10).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(err.to_string().contains("101 bytes"), "{}", err);

        line.clear();
        read_line_bounded(&mut reader, &mut line, 10).await.unwrap();
        assert_eq!(line, "next\n");
    }

    #[tokio::test]
    async fn test_read_line_bounded_accepts_line_at_limit() {
        let mut reader = BufReader::new(&b"123456789\n"[..]);
        let mut line = String::new();

        assert_eq!(read_line_bounded(&mut reader, &mut line, 10).await.unwrap(), 10);
        assert_eq!(line, "123456789\n");
        assert_eq!(read_line_bounded(&mut reader, &mut line, 10).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_read_line_bounded_rejects_invalid_utf8() {
        let mut reader = BufReader::new(&b"ab\xff\xfe\nok\n"[..]);
        let mut line = String::new();

        let err = read_line_bounded(&mut reader, &mut line, 64).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(line.is_empty());

        read_line_bounded(&mut reader, &mut line, 64).await.unwrap();
        assert_eq!(line, "ok\n");
    }

    #[test]
    fn test_response_wire_format() {
        let found = FindResponse::Found {
            path: vec!["a".into(), "b".into()],
            length: 1,
        };
        assert_eq!(
            serde_json::to_string(&found).unwrap(),
            r#"{"path":["a","b"],"length":1}"#
        );

        let failed = FindResponse::from(Err::<SearchPath, _>(SearchError::NoPath));
        let json: serde_json::Value = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["error"]["kind"], "no_path");
    }
}
