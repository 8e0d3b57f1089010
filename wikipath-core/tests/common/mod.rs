// Scripted link source shared by the integration tests

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;
use wikipath_core::ServiceConfig;
use wikipath_core::worker::LinkSource;
use wikipath_scanner::ScanError;

pub fn page(name: &str) -> String {
    format!("https://en.wikipedia.org/wiki/{}", name)
}

pub fn test_config() -> ServiceConfig {
    ServiceConfig::default()
        .with_reply_listeners(4)
        .with_crawl_workers(8)
        .with_search_deadline(Duration::from_secs(10))
        .with_discovery_timeout(Duration::from_secs(5))
        .with_max_crawl_attempts(2)
}

/// An in-memory web: page name -> linked page names. Counts every lookup.
pub struct ScriptedWeb {
    links: HashMap<String, Vec<String>>,
    failing: HashSet<String>,
    delay: Duration,
    calls: Mutex<HashMap<String, usize>>,
}

impl ScriptedWeb {
    pub fn new(edges: &[(&str, &str)]) -> Self {
        let mut links: HashMap<String, Vec<String>> = HashMap::new();
        for (from, to) in edges {
            links.entry(page(from)).or_default().push(page(to));
        }
        Self {
            links,
            failing: HashSet::new(),
            delay: Duration::ZERO,
            calls: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_failing(mut self, name: &str) -> Self {
        self.failing.insert(page(name));
        self
    }

    pub fn calls(&self, name: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(&page(name))
            .copied()
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

impl LinkSource for ScriptedWeb {
    async fn links(&self, url: &str) -> Result<Vec<String>, ScanError> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_insert(0) += 1;

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if self.failing.contains(url) {
            return Err(ScanError::Status {
                url: url.to_string(),
                status: 500,
            });
        }

        Ok(self.links.get(url).cloned().unwrap_or_default())
    }
}
