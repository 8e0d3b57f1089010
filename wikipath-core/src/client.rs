use crate::error::ClientError;
use crate::gateway::{FindRequest, FindResponse, MAX_LINE_BYTES, read_line_bounded};
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::{TcpStream, ToSocketAddrs};
use tracing::debug;

/// Send one search request to a running server and wait for its answer.
pub async fn find<A: ToSocketAddrs>(
    addr: A,
    source: &str,
    target: &str,
) -> Result<FindResponse, ClientError> {
    let stream = TcpStream::connect(addr).await?;
    debug!("Connected to {}", stream.peer_addr()?);
    let (reader, mut writer) = stream.into_split();

    let request = FindRequest {
        source: source.to_string(),
        target: target.to_string(),
    };
    let mut line = serde_json::to_vec(&request)?;
    line.push(b'\n');
    writer.write_all(&line).await?;
    writer.flush().await?;

    let mut reader = BufReader::new(reader);
    let mut response = String::new();
    if read_line_bounded(&mut reader, &mut response, MAX_LINE_BYTES).await? == 0 {
        return Err(ClientError::NoResponse);
    }
    Ok(serde_json::from_str(response.trim())?)
}
