//! Correlation table: request id -> single-use delivery slot.
//!
//! A slot is registered before its request is published, so a fast reply can
//! never arrive ahead of its waiter. Fulfilling a slot removes it, which makes
//! a second reply for the same id an `Unknown` error instead of an overwrite.

use crate::error::CorrelationError;
use crate::protocol::{DiscoveryReply, RequestId};
use parking_lot::RwLock;
use std::collections::HashMap;
use tokio::sync::oneshot;

#[derive(Default)]
pub struct CorrelationTable {
    slots: RwLock<HashMap<RequestId, oneshot::Sender<DiscoveryReply>>>,
}

impl CorrelationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &self,
        id: RequestId,
    ) -> Result<oneshot::Receiver<DiscoveryReply>, CorrelationError> {
        let mut slots = self.slots.write();
        if slots.contains_key(&id) {
            return Err(CorrelationError::Duplicate(id));
        }
        let (tx, rx) = oneshot::channel();
        slots.insert(id, tx);
        Ok(rx)
    }

    /// Deliver `reply` to the waiter registered under its request id.
    pub fn fulfill(&self, reply: DiscoveryReply) -> Result<(), CorrelationError> {
        let id = reply.request_id;
        let slot = self
            .slots
            .write()
            .remove(&id)
            .ok_or(CorrelationError::Unknown(id))?;
        slot.send(reply)
            .map_err(|_| CorrelationError::WaiterGone(id))
    }

    /// Drop the slot for a waiter that stopped waiting. Returns whether it was present.
    pub fn cancel(&self, id: RequestId) -> bool {
        self.slots.write().remove(&id).is_some()
    }

    pub fn contains(&self, id: RequestId) -> bool {
        self.slots.read().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fulfill_reaches_waiter_and_reclaims_slot() {
        let table = CorrelationTable::new();
        let id = RequestId::new();
        let rx = table.register(id).unwrap();
        assert!(table.contains(id));

        table
            .fulfill(DiscoveryReply::links(id, vec!["b".into()]))
            .unwrap();

        assert_eq!(rx.await.unwrap().neighbor_urls, vec!["b".to_string()]);
        assert!(table.is_empty());
    }

    #[test]
    fn test_duplicate_reply_is_rejected() {
        let table = CorrelationTable::new();
        let id = RequestId::new();
        let _rx = table.register(id).unwrap();

        table.fulfill(DiscoveryReply::links(id, Vec::new())).unwrap();
        assert_eq!(
            table.fulfill(DiscoveryReply::links(id, Vec::new())),
            Err(CorrelationError::Unknown(id))
        );
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let table = CorrelationTable::new();
        let id = RequestId::new();
        let _rx = table.register(id).unwrap();
        assert!(matches!(
            table.register(id),
            Err(CorrelationError::Duplicate(_))
        ));
    }

    #[test]
    fn test_reply_after_waiter_left() {
        let table = CorrelationTable::new();
        let id = RequestId::new();
        drop(table.register(id).unwrap());

        assert_eq!(
            table.fulfill(DiscoveryReply::links(id, Vec::new())),
            Err(CorrelationError::WaiterGone(id))
        );
        assert!(table.is_empty());
    }

    #[test]
    fn test_cancel() {
        let table = CorrelationTable::new();
        let id = RequestId::new();
        let _rx = table.register(id).unwrap();

        assert!(table.cancel(id));
        assert!(!table.cancel(id));
        assert_eq!(table.len(), 0);
    }
}
