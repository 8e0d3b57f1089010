//! Wires broker, reply listeners, discovery cache, pathfinder and crawl
//! workers into one running service.

use crate::broker::Broker;
use crate::config::ServiceConfig;
use crate::correlation::CorrelationTable;
use crate::dispatcher::Dispatcher;
use crate::graph::DiscoveryCache;
use crate::pathfinder::Pathfinder;
use crate::validate::UrlPolicy;
use crate::worker::{CrawlWorker, LinkSource};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

pub struct Service {
    broker: Arc<Broker>,
    dispatcher: Dispatcher,
    pathfinder: Arc<Pathfinder>,
    tasks: Vec<JoinHandle<()>>,
}

impl Service {
    /// Start reply listeners and `config.crawl_workers` workers backed by `source`.
    pub fn start<S: LinkSource>(config: &ServiceConfig, source: Arc<S>) -> Self {
        let broker = Arc::new(Broker::new(&config.broker));
        let dispatcher = Dispatcher::new(broker.clone(), Arc::new(CorrelationTable::new()));

        let mut tasks = dispatcher.start_listeners(config.reply_listeners);
        tasks.extend(
            CrawlWorker::new(broker.clone(), source)
                .with_max_attempts(config.max_crawl_attempts)
                .spawn_pool(config.crawl_workers),
        );

        let cache = Arc::new(DiscoveryCache::new(
            dispatcher.clone(),
            config.discovery_timeout,
        ));
        let pathfinder = Arc::new(
            Pathfinder::new(cache, UrlPolicy::new(config.allowed_domain.clone()))
                .with_deadline(config.search_deadline),
        );

        info!(
            "Service started ({} reply listeners, {} crawl workers, queue capacity {} / {})",
            config.reply_listeners,
            config.crawl_workers,
            config.broker.queue_capacity,
            config.broker.overflow.as_str()
        );

        Self {
            broker,
            dispatcher,
            pathfinder,
            tasks,
        }
    }

    pub fn pathfinder(&self) -> &Arc<Pathfinder> {
        &self.pathfinder
    }

    pub fn broker(&self) -> &Arc<Broker> {
        &self.broker
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Close the broker and wait for listeners and workers to finish.
    pub async fn shutdown(self) {
        self.broker.close();
        for task in self.tasks {
            let _ = task.await;
        }
        info!(
            "Service stopped ({} pages discovered)",
            self.pathfinder.cache().discovered()
        );
    }
}
