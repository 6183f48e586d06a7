use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::SyncError;
use super::bus::{EventBus, EventHandler, RaisedEvent};

/// Event id every favicon change is raised under.
pub const FAVICONS_EVENT_ID: Uuid = Uuid::from_u128(0x9a3f_5c1e_2b7d_4e80_a6c4_1f0d_8b2e_7c55);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// Icons were regenerated.
    Created,
    /// Icons were removed.
    Deleted,
}

impl ChangeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeKind::Created => "created",
            ChangeKind::Deleted => "deleted",
        }
    }
}

/// JSON payload carried by a favicon change event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeMessage {
    pub kind: ChangeKind,
}

/// Reaction to a change announced by a peer instance.
#[async_trait]
pub trait ChangeHandler: Send + Sync {
    async fn on_change(&self, kind: ChangeKind) -> Result<(), SyncError>;
}

/// Announces local favicon changes and relays peer announcements.
pub struct ChangeNotifier {
    raiser_id: Uuid,
    bus: Arc<dyn EventBus>,
}

impl ChangeNotifier {
    /// A notifier with a fresh raiser id.
    pub fn new(bus: Arc<dyn EventBus>) -> Self {
        Self {
            raiser_id: Uuid::new_v4(),
            bus,
        }
    }

    pub fn raiser_id(&self) -> Uuid {
        self.raiser_id
    }

    pub async fn announce(&self, kind: ChangeKind) -> Result<(), SyncError> {
        let payload = serde_json::to_value(ChangeMessage { kind })?;
        info!(
            target = "favicons::sync",
            raiser_id = %self.raiser_id,
            kind = kind.as_str(),
            "Announcing favicon change"
        );
        self.bus
            .raise(RaisedEvent {
                event_id: FAVICONS_EVENT_ID,
                raiser_id: self.raiser_id,
                payload,
            })
            .await
    }

    /// Register `handler` for announcements raised by other instances.
    pub fn on_announce(&self, handler: Arc<dyn ChangeHandler>) {
        self.bus.subscribe(
            FAVICONS_EVENT_ID,
            Arc::new(PeerFilter {
                own_id: self.raiser_id,
                inner: handler,
            }),
        );
    }
}

struct PeerFilter {
    own_id: Uuid,
    inner: Arc<dyn ChangeHandler>,
}

#[async_trait]
impl EventHandler for PeerFilter {
    async fn handle(&self, event: &RaisedEvent) -> Result<(), SyncError> {
        if event.raiser_id == self.own_id {
            debug!(raiser_id = %event.raiser_id, "Ignoring own announcement");
            return Ok(());
        }

        let message: ChangeMessage = serde_json::from_value(event.payload.clone())?;
        debug!(
            raiser_id = %event.raiser_id,
            kind = message.kind.as_str(),
            "Received peer announcement"
        );
        self.inner.on_change(message.kind).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::sync::bus::InProcessEventBus;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<ChangeKind>>,
    }

    #[async_trait]
    impl ChangeHandler for Recorder {
        async fn on_change(&self, kind: ChangeKind) -> Result<(), SyncError> {
            self.seen.lock().expect("recorder lock").push(kind);
            Ok(())
        }
    }

    impl Recorder {
        fn seen(&self) -> Vec<ChangeKind> {
            self.seen.lock().expect("recorder lock").clone()
        }
    }

    #[test]
    fn raiser_ids_are_unique_per_instance() {
        let bus: Arc<dyn EventBus> = Arc::new(InProcessEventBus::new());
        let a = ChangeNotifier::new(bus.clone());
        let b = ChangeNotifier::new(bus);
        assert_ne!(a.raiser_id(), b.raiser_id());
    }

    #[tokio::test]
    async fn own_announcements_are_ignored() {
        let bus: Arc<dyn EventBus> = Arc::new(InProcessEventBus::new());
        let notifier = ChangeNotifier::new(bus);
        let recorder = Arc::new(Recorder::default());
        notifier.on_announce(recorder.clone());

        notifier
            .announce(ChangeKind::Created)
            .await
            .expect("announce");

        assert!(recorder.seen().is_empty());
    }

    #[tokio::test]
    async fn peers_receive_announcements() {
        let bus: Arc<dyn EventBus> = Arc::new(InProcessEventBus::new());
        let local = ChangeNotifier::new(bus.clone());
        let peer = ChangeNotifier::new(bus);
        let local_seen = Arc::new(Recorder::default());
        let peer_seen = Arc::new(Recorder::default());
        local.on_announce(local_seen.clone());
        peer.on_announce(peer_seen.clone());

        local
            .announce(ChangeKind::Deleted)
            .await
            .expect("announce");

        assert!(local_seen.seen().is_empty());
        assert_eq!(peer_seen.seen(), vec![ChangeKind::Deleted]);
    }

    #[test]
    fn payload_is_json() {
        let value = serde_json::to_value(ChangeMessage {
            kind: ChangeKind::Created,
        })
        .expect("json payload");
        assert_eq!(value, serde_json::json!({ "kind": "created" }));
    }
}
