//! Crawl workers: consume discovery requests, answer with a page's links.

use crate::broker::{Broker, Delivery, Queue};
use crate::error::BrokerError;
use crate::protocol::{DiscoveryReply, DiscoveryRequest, decode, encode};
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use wikipath_scanner::{Grabber, ScanError};

/// Anything that can list the outbound links of a page.
pub trait LinkSource: Send + Sync + 'static {
    fn links(&self, page: &str) -> impl Future<Output = Result<Vec<String>, ScanError>> + Send;
}

impl LinkSource for Grabber {
    async fn links(&self, page: &str) -> Result<Vec<String>, ScanError> {
        Ok(self.fetch_links(page).await?.links)
    }
}

pub struct CrawlWorker<S> {
    broker: Arc<Broker>,
    source: Arc<S>,
    max_attempts: u32,
}

impl<S> Clone for CrawlWorker<S> {
    fn clone(&self) -> Self {
        Self {
            broker: self.broker.clone(),
            source: self.source.clone(),
            max_attempts: self.max_attempts,
        }
    }
}

impl<S: LinkSource> CrawlWorker<S> {
    pub fn new(broker: Arc<Broker>, source: Arc<S>) -> Self {
        Self {
            broker,
            source,
            max_attempts: 3,
        }
    }

    /// Deliveries failing this many times are answered with an error reply.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn spawn_pool(&self, workers: usize) -> Vec<JoinHandle<()>> {
        (0..workers)
            .map(|worker_id| {
                let worker = self.clone();
                tokio::spawn(async move { worker.run(worker_id).await })
            })
            .collect()
    }

    /// Process discovery requests until the broker closes.
    pub async fn run(&self, worker_id: usize) {
        debug!("Crawl worker {} started", worker_id);
        let mut consumer = self.broker.consumer(Queue::Discovery);
        while let Some(delivery) = consumer.next().await {
            self.handle(worker_id, delivery).await;
        }
        debug!("Crawl worker {} finished", worker_id);
    }

    async fn handle(&self, worker_id: usize, delivery: Delivery) {
        let request: DiscoveryRequest = match decode(delivery.payload()) {
            Ok(request) => request,
            Err(e) => {
                warn!("Worker {} dropped undecodable request: {}", worker_id, e);
                delivery.ack();
                return;
            }
        };

        let request_id = request.request_id;
        let attempt = delivery.attempt();
        info!(%request_id, page = %request.source_page, attempt, "Got task from queue");

        let reply = match self.source.links(&request.source_page).await {
            Ok(links) => DiscoveryReply::links(request_id, links),
            Err(e) if attempt < self.max_attempts => {
                warn!(%request_id, attempt, "Could not grab {}: {}", request.source_page, e);
                if let Err(e) = delivery.nack(true) {
                    error!(%request_id, "Could not requeue request: {}", e);
                }
                return;
            }
            Err(e) => {
                warn!(%request_id, attempt, "Giving up on {}: {}", request.source_page, e);
                DiscoveryReply::failed(request_id, e.to_string())
            }
        };

        match self.publish(&reply).await {
            Ok(()) => {
                delivery.ack();
                debug!(%request_id, "Put results to queue");
            }
            Err(e) => {
                error!(%request_id, "Could not publish reply: {}", e);
                if let Err(e) = delivery.nack(true) {
                    error!(%request_id, "Could not requeue request: {}", e);
                }
            }
        }
    }

    async fn publish(&self, reply: &DiscoveryReply) -> Result<(), BrokerError> {
        self.broker.publish(Queue::Results, encode(reply)?).await
    }
}
