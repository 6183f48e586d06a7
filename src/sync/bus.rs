use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};
use uuid::Uuid;

use super::SyncError;

/// Event as it travels on the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaisedEvent {
    pub event_id: Uuid,
    /// Identity of the instance that raised the event.
    pub raiser_id: Uuid,
    pub payload: serde_json::Value,
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &RaisedEvent) -> Result<(), SyncError>;
}

/// Broadcast channel shared by every instance. Delivery is at-least-once, so
/// handlers must be idempotent.
#[async_trait]
pub trait EventBus: Send + Sync {
    async fn raise(&self, event: RaisedEvent) -> Result<(), SyncError>;

    fn subscribe(&self, event_id: Uuid, handler: Arc<dyn EventHandler>);
}

/// Bus for instances living in the same process. Subscribers are awaited in
/// registration order before `raise` returns.
#[derive(Default)]
pub struct InProcessEventBus {
    handlers: DashMap<Uuid, Vec<Arc<dyn EventHandler>>>,
}

impl InProcessEventBus {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventBus for InProcessEventBus {
    async fn raise(&self, event: RaisedEvent) -> Result<(), SyncError> {
        // Clone out of the map so no shard lock is held across awaits.
        let handlers = self
            .handlers
            .get(&event.event_id)
            .map(|handlers| handlers.clone())
            .unwrap_or_default();

        trace!(
            event_id = %event.event_id,
            raiser_id = %event.raiser_id,
            subscribers = handlers.len(),
            "Dispatching event"
        );

        for handler in handlers {
            if let Err(err) = handler.handle(&event).await {
                warn!(
                    event_id = %event.event_id,
                    error = %err,
                    "Event handler failed"
                );
            }
        }
        Ok(())
    }

    fn subscribe(&self, event_id: Uuid, handler: Arc<dyn EventHandler>) {
        self.handlers.entry(event_id).or_default().push(handler);
    }
}
