//! Discovery cache: the lazily discovered link graph shared by every search.
//!
//! Two-level locking. The map lock guards insertion of page keys and is never
//! held across an await. Each node carries its own discovery lock, held by a
//! spawned discovery task for the network round-trip of its first discovery,
//! so a page is dispatched at most once no matter how many searches reach it
//! or give up on it.

use crate::dispatcher::Dispatcher;
use crate::error::DiscoveryError;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, warn};

#[derive(Default)]
struct GraphNode {
    neighbors: OnceLock<Arc<[String]>>,
    discovery: Arc<Mutex<()>>,
}

impl GraphNode {
    fn cached(&self) -> Option<Arc<[String]>> {
        self.neighbors.get().cloned()
    }
}

pub struct DiscoveryCache {
    nodes: RwLock<HashMap<String, Arc<GraphNode>>>,
    dispatcher: Dispatcher,
    discovery_timeout: Duration,
}

impl DiscoveryCache {
    pub fn new(dispatcher: Dispatcher, discovery_timeout: Duration) -> Self {
        Self {
            nodes: RwLock::new(HashMap::new()),
            dispatcher,
            discovery_timeout,
        }
    }

    /// Outbound links of `page`, discovering them through the crawl layer on
    /// first use. A failed discovery leaves the page undiscovered so a later
    /// caller can retry it.
    pub async fn neighbors(&self, page: &str) -> Result<Arc<[String]>, DiscoveryError> {
        let existing = self.nodes.read().get(page).cloned();
        if let Some(cached) = existing.as_ref().and_then(|node| node.cached()) {
            return Ok(cached);
        }

        let (node, fresh_guard) = match existing {
            Some(node) => (node, None),
            None => {
                let mut nodes = self.nodes.write();
                let node = nodes.entry(page.to_string()).or_default().clone();
                // Lock a newly created node before anyone else can look it up.
                let guard = node.discovery.clone().try_lock_owned().ok();
                (node, guard)
            }
        };

        let guard: OwnedMutexGuard<()> = match fresh_guard {
            Some(guard) => guard,
            None => node.discovery.clone().lock_owned().await,
        };

        if let Some(cached) = node.cached() {
            debug!(page, "Neighbors discovered by a concurrent caller");
            return Ok(cached);
        }

        // The discovery task owns the node lock until the reply lands, so a
        // caller that gives up does not abandon the request it dispatched.
        let discovery = tokio::spawn(discover(
            self.dispatcher.clone(),
            self.discovery_timeout,
            node,
            page.to_string(),
            guard,
        ));
        match discovery.await {
            Ok(result) => result,
            Err(e) => {
                warn!(page, "Discovery task failed: {}", e);
                Err(DiscoveryError::Abandoned(page.to_string()))
            }
        }
    }

    pub fn is_discovered(&self, page: &str) -> bool {
        self.nodes
            .read()
            .get(page)
            .is_some_and(|node| node.neighbors.get().is_some())
    }

    /// Number of pages known to the graph, discovered or not.
    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.read().is_empty()
    }

    /// Number of pages whose neighbours are cached.
    pub fn discovered(&self) -> usize {
        self.nodes
            .read()
            .values()
            .filter(|node| node.neighbors.get().is_some())
            .count()
    }

    /// Whether the discovery lock of `page` is currently free.
    pub fn is_idle(&self, page: &str) -> bool {
        self.nodes
            .read()
            .get(page)
            .is_none_or(|node| node.discovery.try_lock().is_ok())
    }
}

async fn discover(
    dispatcher: Dispatcher,
    timeout: Duration,
    node: Arc<GraphNode>,
    page: String,
    _guard: OwnedMutexGuard<()>,
) -> Result<Arc<[String]>, DiscoveryError> {
    let pending = dispatcher.dispatch(&page).await?;
    match pending.wait(timeout).await {
        Ok(links) => {
            let neighbors: Arc<[String]> = links.into();
            // Only the holder of the discovery lock ever sets the value.
            let _ = node.neighbors.set(neighbors.clone());
            Ok(neighbors)
        }
        Err(e) => {
            warn!(page = %page, "Discovery failed: {}", e);
            Err(e)
        }
    }
}
