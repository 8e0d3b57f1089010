//! Startup dependency check: poll an endpoint until it accepts TCP connections.

use crate::config::deadline_after;
use crate::error::StartupError;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::{error, info};
use url::Url;

/// Turn `scheme://host:port/...` into `host:port`, using the scheme's default
/// port when none is given.
pub fn endpoint_addr(endpoint: &str) -> Result<String, StartupError> {
    let url = Url::parse(endpoint).map_err(|_| StartupError::InvalidEndpoint(endpoint.to_string()))?;
    let host = url
        .host_str()
        .ok_or_else(|| StartupError::InvalidEndpoint(endpoint.to_string()))?;
    let port = url
        .port_or_known_default()
        .or_else(|| default_port(url.scheme()))
        .ok_or_else(|| StartupError::InvalidEndpoint(endpoint.to_string()))?;
    Ok(format!("{}:{}", host, port))
}

fn default_port(scheme: &str) -> Option<u16> {
    match scheme {
        "amqp" => Some(5672),
        "amqps" => Some(5671),
        _ => None,
    }
}

/// Retry a TCP connect to `endpoint` every `interval` until it succeeds or
/// `timeout` elapses.
pub async fn wait_for(
    endpoint: &str,
    timeout: Duration,
    interval: Duration,
) -> Result<(), StartupError> {
    let addr = endpoint_addr(endpoint)?;
    info!(addr = %addr, "Waiting for address");

    let deadline = deadline_after(timeout);
    loop {
        let attempt = tokio::time::timeout_at(deadline, TcpStream::connect(&addr)).await;
        match attempt {
            Ok(Ok(_)) => {
                info!(addr = %addr, "Target is up");
                return Ok(());
            }
            Ok(Err(e)) => info!(addr = %addr, "Target is not up, retrying: {}", e),
            Err(_) => {}
        }

        if deadline_after(interval) >= deadline {
            error!(addr = %addr, "Wait timed out");
            return Err(StartupError::Unreachable {
                addr,
                after: timeout,
            });
        }
        tokio::time::sleep(interval).await;
    }
}
