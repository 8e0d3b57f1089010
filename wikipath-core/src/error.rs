use crate::protocol::RequestId;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BrokerError {
    #[error("Queue '{0}' is full")]
    QueueFull(&'static str),

    #[error("Queue '{0}' is closed")]
    Closed(&'static str),

    #[error("Message codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CorrelationError {
    #[error("No pending discovery for request {0} (unknown or already fulfilled)")]
    Unknown(RequestId),

    #[error("Request {0} is already registered")]
    Duplicate(RequestId),

    #[error("Waiter for request {0} is gone")]
    WaiterGone(RequestId),
}

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Transport failure: {0}")]
    Transport(#[from] BrokerError),

    #[error("Correlation failure: {0}")]
    Correlation(#[from] CorrelationError),

    #[error("No reply for {page} within {after:?}")]
    TimedOut { page: String, after: Duration },

    #[error("Crawl of {page} failed: {reason}")]
    Crawl { page: String, reason: String },

    #[error("Reply channel for {0} closed before a reply arrived")]
    Abandoned(String),
}

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Request took too long (deadline {0:?})")]
    Timeout(Duration),

    #[error("No path exists between the given pages")]
    NoPath,

    #[error("Discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("Expansion task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl SearchError {
    /// Stable machine-readable kind, used on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            SearchError::InvalidUrl { .. } => "invalid_input",
            SearchError::Timeout(_) => "timeout",
            SearchError::NoPath => "no_path",
            SearchError::Discovery(_) | SearchError::Task(_) => "discovery_failed",
        }
    }
}

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Invalid endpoint '{0}'")]
    InvalidEndpoint(String),

    #[error("Endpoint {addr} still unreachable after {after:?}")]
    Unreachable { addr: String, after: Duration },
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Malformed response: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("Server closed the connection without answering")]
    NoResponse,
}
