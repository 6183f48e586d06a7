//! Cross-instance change notification.
//!
//! Instances share an [`EventBus`]. Each instance tags what it raises with
//! its own raiser id and ignores events carrying that id, so only peers react.

mod bus;
mod handler;
mod notifier;

use std::error::Error as StdError;

use thiserror::Error;

pub use bus::{EventBus, EventHandler, InProcessEventBus, RaisedEvent};
pub use handler::FaviconSync;
pub use notifier::{ChangeHandler, ChangeKind, ChangeMessage, ChangeNotifier, FAVICONS_EVENT_ID};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("invalid change payload")]
    Payload(#[from] serde_json::Error),
    #[error("change handler failed")]
    Handler {
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl SyncError {
    pub fn handler(err: impl StdError + Send + Sync + 'static) -> Self {
        Self::Handler {
            source: Box::new(err),
        }
    }
}
