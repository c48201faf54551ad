//! Broadcasting deployment status changes.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::deploy::DeploymentStatus;

/// Messages published when a deployment changes state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum DeploymentEvent {
    /// A deployment entered `building`
    Started {
        id: Uuid,
        app_id: String,
        /// Source deployment when this is a rollback
        rollback_of: Option<Uuid>,
    },

    /// A deployment reached a terminal state
    Finished {
        id: Uuid,
        app_id: String,
        status: DeploymentStatus,
        error: Option<String>,
    },
}

impl DeploymentEvent {
    /// The deployment this event is about.
    pub fn deployment_id(&self) -> Uuid {
        match self {
            DeploymentEvent::Started { id, .. } | DeploymentEvent::Finished { id, .. } => *id,
        }
    }
}

/// Hub for broadcasting deployment events to all subscribers.
#[derive(Debug, Clone)]
pub struct DeploymentHub {
    sender: broadcast::Sender<DeploymentEvent>,
}

impl DeploymentHub {
    /// Create a new hub.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(100);
        Self { sender }
    }

    /// Send an event to all subscribers.
    pub fn send(&self, event: DeploymentEvent) {
        // No subscribers is fine
        let _ = self.sender.send(event);
    }

    /// Subscribe to deployment events.
    pub fn subscribe(&self) -> broadcast::Receiver<DeploymentEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for DeploymentHub {
    fn default() -> Self {
        Self::new()
    }
}
