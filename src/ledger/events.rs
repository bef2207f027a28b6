// Notifications emitted by the ledger after each committed write

use crate::identity::AccountId;
use crate::ledger::message::{MessageIndex, Outcome};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::trace;

/// Externally observable record of a committed ledger write
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notification {
    NewMessage {
        index: MessageIndex,
        sender: AccountId,
        receiver: AccountId,
        text: Vec<u8>,
        deposit_in_wei: u64,
    },
    /// Emitted for both accept and deny; `outcome` tells them apart
    MessageConfirmed {
        index: MessageIndex,
        outcome: Outcome,
    },
}

impl Notification {
    pub fn index(&self) -> MessageIndex {
        match self {
            Notification::NewMessage { index, .. } => *index,
            Notification::MessageConfirmed { index, .. } => *index,
        }
    }
}

/// Where the ledger writes notifications.
///
/// Emission cannot fail: it happens after the state change has committed.
pub trait NotificationSink {
    fn emit(&mut self, notification: Notification);
}

impl NotificationSink for Vec<Notification> {
    fn emit(&mut self, notification: Notification) {
        self.push(notification);
    }
}

/// Discards every notification
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn emit(&mut self, _notification: Notification) {}
}

/// Fans notifications out to any number of async subscribers
#[derive(Clone, Debug)]
pub struct BroadcastSink {
    sender: broadcast::Sender<Notification>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl NotificationSink for BroadcastSink {
    fn emit(&mut self, notification: Notification) {
        // No subscribers is not an error
        if self.sender.send(notification).is_err() {
            trace!("notification dropped, no subscribers");
        }
    }
}
