use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::warn;

pub mod types;

use types::RelationshipEvent;

/// Sender half handed to the mutation services. A committed transition
/// publishes and moves on; delivery problems only ever log.
#[derive(Clone)]
pub struct EventPublisher {
    tx: UnboundedSender<RelationshipEvent>,
}

impl EventPublisher {
    pub fn channel() -> (Self, UnboundedReceiver<RelationshipEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn publish(&self, event: RelationshipEvent) {
        if let Err(e) = self.tx.send(event) {
            warn!("Dropping relationship event, no consumer attached: {}", e);
        }
    }
}
