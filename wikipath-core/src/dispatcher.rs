//! Publishes discovery requests and routes replies back to their waiters.

use crate::broker::{Broker, Consumer, Queue};
use crate::correlation::CorrelationTable;
use crate::error::{CorrelationError, DiscoveryError};
use crate::protocol::{DiscoveryReply, DiscoveryRequest, RequestId, decode, encode};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct Dispatcher {
    broker: Arc<Broker>,
    table: Arc<CorrelationTable>,
}

impl Dispatcher {
    pub fn new(broker: Arc<Broker>, table: Arc<CorrelationTable>) -> Self {
        Self { broker, table }
    }

    pub fn table(&self) -> &Arc<CorrelationTable> {
        &self.table
    }

    /// Register a slot for a fresh request id, then publish the request.
    pub async fn dispatch(&self, page: &str) -> Result<PendingDiscovery, DiscoveryError> {
        let request = DiscoveryRequest::new(page);
        let rx = self.table.register(request.request_id)?;
        let pending = PendingDiscovery {
            id: request.request_id,
            page: page.to_string(),
            rx,
            table: self.table.clone(),
        };

        // On failure `pending` drops here and takes its slot with it.
        self.broker
            .publish(Queue::Discovery, encode(&request)?)
            .await?;

        info!(request_id = %request.request_id, page, "Put discovery task to queue");
        Ok(pending)
    }

    /// Spawn `count` reply listeners competing on the results queue.
    pub fn start_listeners(&self, count: usize) -> Vec<JoinHandle<()>> {
        (0..count)
            .map(|listener_id| {
                let consumer = self.broker.consumer(Queue::Results);
                let table = self.table.clone();
                tokio::spawn(listen(listener_id, consumer, table))
            })
            .collect()
    }
}

async fn listen(listener_id: usize, mut consumer: Consumer, table: Arc<CorrelationTable>) {
    debug!("Reply listener {} started", listener_id);

    while let Some(delivery) = consumer.next().await {
        let reply: DiscoveryReply = match decode(delivery.payload()) {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Listener {} dropped undecodable reply: {}", listener_id, e);
                continue;
            }
        };

        let request_id = reply.request_id;
        match table.fulfill(reply) {
            Ok(()) => debug!(%request_id, "Got results from queue"),
            Err(CorrelationError::WaiterGone(_)) => {
                debug!(%request_id, "Reply arrived after its waiter gave up")
            }
            Err(e) => warn!(%request_id, "Discarding reply: {}", e),
        }
    }

    debug!("Reply listener {} finished", listener_id);
}

/// A published discovery request awaiting its reply.
///
/// Dropping it before the reply arrives removes the correlation slot.
pub struct PendingDiscovery {
    id: RequestId,
    page: String,
    rx: oneshot::Receiver<DiscoveryReply>,
    table: Arc<CorrelationTable>,
}

impl PendingDiscovery {
    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn page(&self) -> &str {
        &self.page
    }

    /// Wait at most `timeout` for the reply and return the page's neighbours.
    pub async fn wait(mut self, timeout: Duration) -> Result<Vec<String>, DiscoveryError> {
        let reply = match tokio::time::timeout(timeout, &mut self.rx).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(_)) => return Err(DiscoveryError::Abandoned(self.page.clone())),
            Err(_) => {
                return Err(DiscoveryError::TimedOut {
                    page: self.page.clone(),
                    after: timeout,
                });
            }
        };

        match reply.error {
            Some(reason) => Err(DiscoveryError::Crawl {
                page: self.page.clone(),
                reason,
            }),
            None => Ok(reply.neighbor_urls),
        }
    }
}

impl Drop for PendingDiscovery {
    fn drop(&mut self) {
        if self.table.cancel(self.id) {
            debug!(request_id = %self.id, page = %self.page, "Cancelled pending discovery");
        }
    }
}
