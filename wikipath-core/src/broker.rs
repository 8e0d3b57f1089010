//! In-process message broker with a discovery work queue and a results queue.
//!
//! Discovery deliveries must be settled explicitly: `ack` removes the message,
//! `nack(true)` (or dropping an unsettled delivery) puts it back with its attempt
//! counter bumped. Results deliveries are acknowledged on receipt.

use crate::config::{BrokerConfig, OverflowPolicy};
use crate::error::BrokerError;
use crate::protocol::{DISCOVERY_QUEUE, RESULTS_QUEUE};
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Mutex, mpsc, watch};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Queue {
    Discovery,
    Results,
}

impl Queue {
    pub fn name(&self) -> &'static str {
        match self {
            Queue::Discovery => DISCOVERY_QUEUE,
            Queue::Results => RESULTS_QUEUE,
        }
    }

    fn requires_ack(&self) -> bool {
        matches!(self, Queue::Discovery)
    }
}

#[derive(Debug)]
struct Envelope {
    payload: Vec<u8>,
    attempt: u32,
}

struct QueueHandle {
    tx: mpsc::Sender<Envelope>,
    rx: Arc<Mutex<mpsc::Receiver<Envelope>>>,
}

impl QueueHandle {
    fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        Self {
            tx,
            rx: Arc::new(Mutex::new(rx)),
        }
    }
}

pub struct Broker {
    discovery: QueueHandle,
    results: QueueHandle,
    overflow: OverflowPolicy,
    shutdown: watch::Sender<bool>,
}

impl Broker {
    pub fn new(config: &BrokerConfig) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            discovery: QueueHandle::new(config.queue_capacity),
            results: QueueHandle::new(config.queue_capacity),
            overflow: config.overflow,
            shutdown,
        }
    }

    fn handle(&self, queue: Queue) -> &QueueHandle {
        match queue {
            Queue::Discovery => &self.discovery,
            Queue::Results => &self.results,
        }
    }

    pub fn is_closed(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Publish a message, honouring the configured overflow policy.
    pub async fn publish(&self, queue: Queue, payload: Vec<u8>) -> Result<(), BrokerError> {
        if self.is_closed() {
            return Err(BrokerError::Closed(queue.name()));
        }

        let handle = self.handle(queue);
        let envelope = Envelope {
            payload,
            attempt: 1,
        };

        match self.overflow {
            OverflowPolicy::Block => handle
                .tx
                .send(envelope)
                .await
                .map_err(|_| BrokerError::Closed(queue.name())),
            OverflowPolicy::Reject => handle.tx.try_send(envelope).map_err(|e| match e {
                TrySendError::Full(_) => BrokerError::QueueFull(queue.name()),
                TrySendError::Closed(_) => BrokerError::Closed(queue.name()),
            }),
        }
    }

    /// Register a competing consumer on `queue`.
    pub fn consumer(&self, queue: Queue) -> Consumer {
        let handle = self.handle(queue);
        Consumer {
            queue,
            rx: handle.rx.clone(),
            requeue: queue.requires_ack().then(|| handle.tx.clone()),
            shutdown: self.shutdown.subscribe(),
        }
    }

    /// Number of messages currently waiting on `queue`.
    pub fn depth(&self, queue: Queue) -> usize {
        let tx = &self.handle(queue).tx;
        tx.max_capacity() - tx.capacity()
    }

    /// Refuse further publications and wake every consumer with end of stream.
    pub fn close(&self) {
        self.shutdown.send_replace(true);
        debug!("Broker closed");
    }
}

pub struct Consumer {
    queue: Queue,
    rx: Arc<Mutex<mpsc::Receiver<Envelope>>>,
    requeue: Option<mpsc::Sender<Envelope>>,
    shutdown: watch::Receiver<bool>,
}

impl Consumer {
    pub fn queue(&self) -> Queue {
        self.queue
    }

    /// Wait for the next delivery. `None` once the broker is closed.
    pub async fn next(&mut self) -> Option<Delivery> {
        let rx = self.rx.clone();
        let envelope = tokio::select! {
            envelope = async move { rx.lock().await.recv().await } => envelope?,
            _ = self.shutdown.wait_for(|closed| *closed) => return None,
        };

        Some(Delivery {
            queue: self.queue,
            payload: envelope.payload,
            attempt: envelope.attempt,
            requeue: self.requeue.clone(),
            settled: self.requeue.is_none(),
        })
    }
}

pub struct Delivery {
    queue: Queue,
    payload: Vec<u8>,
    attempt: u32,
    requeue: Option<mpsc::Sender<Envelope>>,
    settled: bool,
}

impl Delivery {
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// 1 for the first delivery, incremented on every redelivery.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn ack(mut self) {
        self.settled = true;
    }

    /// Reject the delivery; with `requeue` it is redelivered to some consumer.
    pub fn nack(mut self, requeue: bool) -> Result<(), BrokerError> {
        self.settled = true;
        if requeue {
            self.redeliver()
        } else {
            Ok(())
        }
    }

    fn redeliver(&mut self) -> Result<(), BrokerError> {
        let Some(tx) = self.requeue.as_ref() else {
            return Ok(());
        };
        let envelope = Envelope {
            payload: std::mem::take(&mut self.payload),
            attempt: self.attempt + 1,
        };
        tx.try_send(envelope).map_err(|e| match e {
            TrySendError::Full(_) => BrokerError::QueueFull(self.queue.name()),
            TrySendError::Closed(_) => BrokerError::Closed(self.queue.name()),
        })
    }
}

impl Drop for Delivery {
    fn drop(&mut self) {
        if !self.settled {
            self.settled = true;
            if let Err(e) = self.redeliver() {
                warn!("Lost unsettled {} delivery: {}", self.queue.name(), e);
            }
        }
    }
}
