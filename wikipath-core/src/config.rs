use std::str::FromStr;
use std::time::Duration;
use tokio::time::Instant;

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:51075";
pub const DEFAULT_SERVER_ADDR: &str = "127.0.0.1:51075";
pub const DEFAULT_ALLOWED_DOMAIN: &str = "wikipedia.org";

/// Deadlines further out than this are treated as never expiring.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// `now + budget`, saturating instead of overflowing for huge budgets.
pub fn deadline_after(budget: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(budget)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

/// What a publisher does when a queue is at capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Wait until the queue has room.
    #[default]
    Block,
    /// Fail the publish with `BrokerError::QueueFull`.
    Reject,
}

impl OverflowPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverflowPolicy::Block => "block",
            OverflowPolicy::Reject => "reject",
        }
    }
}

impl FromStr for OverflowPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "block" => Ok(OverflowPolicy::Block),
            "reject" => Ok(OverflowPolicy::Reject),
            other => Err(format!(
                "unknown overflow policy '{}' (expected 'block' or 'reject')",
                other
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BrokerConfig {
    pub queue_capacity: usize,
    pub overflow: OverflowPolicy,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 100_000,
            overflow: OverflowPolicy::Block,
        }
    }
}

/// Options for running the pathfinder service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub listen_addr: String,
    pub reply_listeners: usize,
    pub crawl_workers: usize,
    pub search_deadline: Duration,
    pub discovery_timeout: Duration,
    pub max_crawl_attempts: u32,
    pub allowed_domain: String,
    pub broker: BrokerConfig,
    /// Endpoint probed for reachability before serving.
    pub wait_for: Option<String>,
    pub startup_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            reply_listeners: 32,
            crawl_workers: 8,
            search_deadline: Duration::from_secs(120),
            discovery_timeout: Duration::from_secs(30),
            max_crawl_attempts: 3,
            allowed_domain: DEFAULT_ALLOWED_DOMAIN.to_string(),
            broker: BrokerConfig::default(),
            wait_for: None,
            startup_timeout: Duration::from_secs(30),
        }
    }
}

impl ServiceConfig {
    pub fn with_listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.listen_addr = addr.into();
        self
    }

    pub fn with_reply_listeners(mut self, listeners: usize) -> Self {
        self.reply_listeners = listeners.max(1);
        self
    }

    pub fn with_crawl_workers(mut self, workers: usize) -> Self {
        self.crawl_workers = workers.max(1);
        self
    }

    pub fn with_search_deadline(mut self, deadline: Duration) -> Self {
        self.search_deadline = deadline;
        self
    }

    pub fn with_discovery_timeout(mut self, timeout: Duration) -> Self {
        self.discovery_timeout = timeout;
        self
    }

    pub fn with_max_crawl_attempts(mut self, attempts: u32) -> Self {
        self.max_crawl_attempts = attempts.max(1);
        self
    }

    pub fn with_allowed_domain(mut self, domain: impl Into<String>) -> Self {
        self.allowed_domain = domain.into();
        self
    }

    pub fn with_broker(mut self, broker: BrokerConfig) -> Self {
        self.broker = broker;
        self
    }

    pub fn with_wait_for(mut self, endpoint: Option<String>) -> Self {
        self.wait_for = endpoint;
        self
    }

    pub fn with_startup_timeout(mut self, timeout: Duration) -> Self {
        self.startup_timeout = timeout;
        self
    }
}
