use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Outbound links discovered on a single page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageLinks {
    pub url: String,
    pub status_code: u16,
    pub response_time: Duration,
    pub links: Vec<String>,
}

impl PageLinks {
    pub fn new(url: String) -> Self {
        Self {
            url,
            status_code: 0,
            response_time: Duration::from_secs(0),
            links: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}
