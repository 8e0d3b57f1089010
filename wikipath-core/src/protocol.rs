//! Messages exchanged with crawl workers over the broker.

use crate::error::BrokerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Queue carrying discovery requests to crawl workers.
pub const DISCOVERY_QUEUE: &str = "discovery";
/// Queue carrying discovery replies back to the reply listeners.
pub const RESULTS_QUEUE: &str = "results";

/// Opaque correlation token linking a discovery request to its reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryRequest {
    pub request_id: RequestId,
    pub source_page: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryReply {
    pub request_id: RequestId,
    #[serde(default)]
    pub neighbor_urls: Vec<String>,
    /// Set by a worker that gave up on the page after repeated failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DiscoveryRequest {
    pub fn new(source_page: impl Into<String>) -> Self {
        Self {
            request_id: RequestId::new(),
            source_page: source_page.into(),
        }
    }
}

impl DiscoveryReply {
    pub fn links(request_id: RequestId, neighbor_urls: Vec<String>) -> Self {
        Self {
            request_id,
            neighbor_urls,
            error: None,
        }
    }

    pub fn failed(request_id: RequestId, error: impl Into<String>) -> Self {
        Self {
            request_id,
            neighbor_urls: Vec::new(),
            error: Some(error.into()),
        }
    }
}

pub fn encode<T: Serialize>(message: &T) -> Result<Vec<u8>, BrokerError> {
    Ok(serde_json::to_vec(message)?)
}

pub fn decode<'a, T: Deserialize<'a>>(payload: &'a [u8]) -> Result<T, BrokerError> {
    Ok(serde_json::from_slice(payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_wire_format() {
        let id = RequestId::new();
        let reply = DiscoveryReply::links(id, vec!["https://en.wikipedia.org/wiki/B".into()]);
        let json: serde_json::Value = serde_json::from_slice(&encode(&reply).unwrap()).unwrap();

        assert_eq!(json["request_id"], id.to_string());
        assert_eq!(json["neighbor_urls"][0], "https://en.wikipedia.org/wiki/B");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_reply_without_neighbors_field() {
        let id = RequestId::new();
        let raw = format!(r#"{{"request_id":"{}","error":"boom"}}"#, id);
        let reply: DiscoveryReply = decode(raw.as_bytes()).unwrap();

        assert_eq!(reply.request_id, id);
        assert!(reply.neighbor_urls.is_empty());
        assert_eq!(reply.error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_decode_garbage() {
        let err = decode::<DiscoveryRequest>(b"not json").unwrap_err();
        assert!(matches!(err, BrokerError::Codec(_)));
    }
}
