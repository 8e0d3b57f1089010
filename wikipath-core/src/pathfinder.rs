//! Level-synchronised breadth-first search over the discovery cache.
//!
//! Each breadth level fans out one expansion task per frontier path and fans
//! in exactly as many results before the next level starts, so the first path
//! reaching the target has the minimum number of edges.

use crate::config::deadline_after;
use crate::error::SearchError;
use crate::graph::DiscoveryCache;
use crate::validate::UrlPolicy;
use crate::visited::VisitedSet;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(120);

/// Pages from source to target; `length()` counts edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPath {
    pages: Vec<String>,
}

impl SearchPath {
    pub fn pages(&self) -> &[String] {
        &self.pages
    }

    pub fn length(&self) -> usize {
        self.pages.len().saturating_sub(1)
    }

    pub fn into_pages(self) -> Vec<String> {
        self.pages
    }
}

pub struct Pathfinder {
    cache: Arc<DiscoveryCache>,
    policy: UrlPolicy,
    deadline: Duration,
}

impl Pathfinder {
    pub fn new(cache: Arc<DiscoveryCache>, policy: UrlPolicy) -> Self {
        Self {
            cache,
            policy,
            deadline: DEFAULT_DEADLINE,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    pub fn cache(&self) -> &Arc<DiscoveryCache> {
        &self.cache
    }

    /// Find a shortest link path from `source` to `target` within the deadline.
    pub async fn find(&self, source: &str, target: &str) -> Result<SearchPath, SearchError> {
        let search_id = Uuid::new_v4();
        info!(%search_id, source, target, "Processing request");

        let source = self.policy.check(source).inspect_err(|e| {
            info!(%search_id, "Source validation failed: {}", e);
        })?;
        let target = self.policy.check(target).inspect_err(|e| {
            info!(%search_id, "Target validation failed: {}", e);
        })?;

        if source == target {
            info!(%search_id, "Finished processing request");
            return Ok(SearchPath {
                pages: vec![source],
            });
        }

        let deadline = deadline_after(self.deadline);
        let result = match tokio::time::timeout_at(
            deadline,
            self.search(search_id, source, target, deadline),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(SearchError::Timeout(self.deadline)),
        };

        match &result {
            Ok(path) => info!(%search_id, length = path.length(), "Finished processing request"),
            Err(e) => info!(%search_id, "Search failed: {}", e),
        }
        result
    }

    async fn search(
        &self,
        search_id: Uuid,
        source: String,
        target: String,
        deadline: Instant,
    ) -> Result<SearchPath, SearchError> {
        let visited = Arc::new(VisitedSet::new());
        visited.insert(&source);

        let mut frontier = vec![vec![source]];
        let mut breadth = 0usize;

        while !frontier.is_empty() {
            let mut tasks = JoinSet::new();
            let spawned = frontier.len();
            for path in frontier.drain(..) {
                let expansion = Expansion {
                    cache: self.cache.clone(),
                    visited: visited.clone(),
                    deadline,
                    budget: self.deadline,
                };
                tasks.spawn(expansion.expand(path));
            }
            info!(%search_id, breadth, spawned, "Started fetching for new breadth level");

            let mut next = Vec::new();
            while let Some(joined) = tasks.join_next().await {
                for candidate in joined?? {
                    let Some(last) = candidate.last() else {
                        continue;
                    };
                    if *last == target {
                        return Ok(SearchPath { pages: candidate });
                    }
                    if visited.insert(last) {
                        next.push(candidate);
                    }
                }
            }

            debug!(%search_id, breadth, next = next.len(), visited = visited.len(), "Level complete");
            frontier = next;
            breadth += 1;
        }

        Err(SearchError::NoPath)
    }
}

/// Everything one expansion task needs, owned so the task can be spawned.
struct Expansion {
    cache: Arc<DiscoveryCache>,
    visited: Arc<VisitedSet>,
    deadline: Instant,
    budget: Duration,
}

impl Expansion {
    async fn expand(self, path: Vec<String>) -> Result<Vec<Vec<String>>, SearchError> {
        let Some(last) = path.last() else {
            return Ok(Vec::new());
        };
        self.visited.insert(last);

        self.check_deadline()?;
        let neighbors = self.cache.neighbors(last).await?;
        self.check_deadline()?;

        Ok(neighbors
            .iter()
            .filter(|link| !self.visited.contains(link))
            .map(|link| {
                let mut candidate = Vec::with_capacity(path.len() + 1);
                candidate.extend_from_slice(&path);
                candidate.push(link.clone());
                candidate
            })
            .collect())
    }

    fn check_deadline(&self) -> Result<(), SearchError> {
        if Instant::now() >= self.deadline {
            Err(SearchError::Timeout(self.budget))
        } else {
            Ok(())
        }
    }
}
