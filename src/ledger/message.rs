// Message records held in escrow by the ledger

use crate::identity::AccountId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable position of a message in the global append-only sequence
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageIndex(u64);

impl MessageIndex {
    pub fn new(index: u64) -> Self {
        Self(index)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    pub(crate) fn as_usize(&self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }
}

impl From<u64> for MessageIndex {
    fn from(index: u64) -> Self {
        Self(index)
    }
}

impl fmt::Display for MessageIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a pending message was settled
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// Deposit paid out to the receiver
    Accepted,
    /// Deposit returned to the sender
    Denied,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Accepted => f.write_str("accepted"),
            Outcome::Denied => f.write_str("denied"),
        }
    }
}

/// A text message with a deposit attached.
///
/// Everything except the pending flag is fixed when the message is posted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    index: MessageIndex,
    sender: AccountId,
    receiver: AccountId,
    text: Vec<u8>,
    deposit_in_wei: u64,
    is_pending: bool,
}

impl Message {
    pub(crate) fn new(
        index: MessageIndex,
        sender: AccountId,
        receiver: AccountId,
        text: Vec<u8>,
        deposit_in_wei: u64,
    ) -> Self {
        Self {
            index,
            sender,
            receiver,
            text,
            deposit_in_wei,
            is_pending: true,
        }
    }

    pub fn index(&self) -> MessageIndex {
        self.index
    }

    pub fn sender(&self) -> &AccountId {
        &self.sender
    }

    pub fn receiver(&self) -> &AccountId {
        &self.receiver
    }

    /// Raw payload, never interpreted by the ledger
    pub fn text(&self) -> &[u8] {
        &self.text
    }

    /// Payload rendered as UTF-8, replacing invalid sequences
    pub fn text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.text).into_owned()
    }

    pub fn deposit_in_wei(&self) -> u64 {
        self.deposit_in_wei
    }

    pub fn is_pending(&self) -> bool {
        self.is_pending
    }

    /// Flip to resolved. Only the ledger calls this, and only once.
    pub(crate) fn resolve(&mut self) {
        self.is_pending = false;
    }
}
