// Ledger - the message table, the escrow it holds, and the per-account indexes

use crate::identity::AccountId;
use crate::ledger::events::{Notification, NotificationSink};
use crate::ledger::message::{Message, MessageIndex, Outcome};
use crate::vault::{ValueTransfer, VaultError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur during ledger operations.
///
/// Every error leaves the ledger and the balances it touched unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Unauthorized: {caller} is not the receiver of message {index}")]
    Unauthorized {
        index: MessageIndex,
        caller: AccountId,
    },

    #[error("This message has already been confirmed")]
    AlreadyResolved { index: MessageIndex },

    #[error("Insufficient funds: available {available}, required {required}")]
    InsufficientFunds { available: u64, required: u64 },

    #[error("Invalid message index: {0}")]
    InvalidIndex(MessageIndex),

    #[error("Escrow balance would overflow")]
    EscrowOverflow,

    #[error("Value transfer failed: {0}")]
    TransferFailed(String),

    #[error("Corrupt ledger state: {0}")]
    CorruptState(String),

    #[error("Deserialization failed")]
    DeserializationFailed,
}

impl From<VaultError> for LedgerError {
    fn from(err: VaultError) -> Self {
        match err {
            VaultError::InsufficientBalance { available, required } => {
                LedgerError::InsufficientFunds { available, required }
            }
            other => LedgerError::TransferFailed(other.to_string()),
        }
    }
}

/// Statistics about the ledger
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerStatistics {
    pub total_messages: usize,
    pub pending_messages: usize,
    pub unique_senders: usize,
    pub unique_receivers: usize,
    pub escrow_balance: u64,
}

/// The message ledger.
///
/// Holds every message ever posted plus the deposits of those still pending.
/// Value moves through an injected [`ValueTransfer`]; notifications go to an
/// injected [`NotificationSink`] once a write has committed.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Ledger {
    /// Append-only; position == index
    messages: Vec<Message>,
    /// Sum of deposits over pending messages
    escrow: u64,
    #[serde(skip)]
    sender_index: HashMap<AccountId, Vec<MessageIndex>>,
    #[serde(skip)]
    receiver_index: HashMap<AccountId, Vec<MessageIndex>>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Value currently held against pending messages
    pub fn escrow_balance(&self) -> u64 {
        self.escrow
    }

    pub fn get(&self, index: MessageIndex) -> Option<&Message> {
        index.as_usize().and_then(|i| self.messages.get(i))
    }

    /// All messages in creation order
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    // ========================================================================
    // WRITES
    // ========================================================================

    /// Post a message, moving `deposit` from the sender into escrow.
    ///
    /// Sending to oneself is allowed and a zero deposit is allowed.
    pub fn post<T, S>(
        &mut self,
        bank: &mut T,
        sink: &mut S,
        sender: AccountId,
        receiver: AccountId,
        text: impl Into<Vec<u8>>,
        deposit: u64,
    ) -> Result<MessageIndex, LedgerError>
    where
        T: ValueTransfer + ?Sized,
        S: NotificationSink + ?Sized,
    {
        let new_escrow = self
            .escrow
            .checked_add(deposit)
            .ok_or(LedgerError::EscrowOverflow)?;

        if let Err(e) = bank.debit(&sender, deposit) {
            warn!(%sender, deposit, error = %e, "post rejected");
            return Err(e.into());
        }

        let index = MessageIndex::new(self.messages.len() as u64);
        let text = text.into();
        let message = Message::new(index, sender, receiver, text.clone(), deposit);

        self.messages.push(message);
        self.escrow = new_escrow;
        self.index_message(index, &sender, &receiver);

        info!(%index, %sender, %receiver, deposit, "message posted");
        sink.emit(Notification::NewMessage {
            index,
            sender,
            receiver,
            text,
            deposit_in_wei: deposit,
        });

        Ok(index)
    }

    /// Receiver takes the deposit
    pub fn accept<T, S>(
        &mut self,
        bank: &mut T,
        sink: &mut S,
        index: MessageIndex,
        caller: AccountId,
    ) -> Result<(), LedgerError>
    where
        T: ValueTransfer + ?Sized,
        S: NotificationSink + ?Sized,
    {
        self.resolve(bank, sink, index, caller, Outcome::Accepted)
    }

    /// Receiver sends the deposit back to the sender
    pub fn deny<T, S>(
        &mut self,
        bank: &mut T,
        sink: &mut S,
        index: MessageIndex,
        caller: AccountId,
    ) -> Result<(), LedgerError>
    where
        T: ValueTransfer + ?Sized,
        S: NotificationSink + ?Sized,
    {
        self.resolve(bank, sink, index, caller, Outcome::Denied)
    }

    fn resolve<T, S>(
        &mut self,
        bank: &mut T,
        sink: &mut S,
        index: MessageIndex,
        caller: AccountId,
        outcome: Outcome,
    ) -> Result<(), LedgerError>
    where
        T: ValueTransfer + ?Sized,
        S: NotificationSink + ?Sized,
    {
        let slot = index
            .as_usize()
            .filter(|&i| i < self.messages.len())
            .ok_or(LedgerError::InvalidIndex(index))?;
        let message = &self.messages[slot];

        if message.receiver() != &caller {
            warn!(%index, %caller, %outcome, "resolution by non-receiver rejected");
            return Err(LedgerError::Unauthorized { index, caller });
        }

        if !message.is_pending() {
            warn!(%index, %outcome, "message already resolved");
            return Err(LedgerError::AlreadyResolved { index });
        }

        let deposit = message.deposit_in_wei();
        let new_escrow = self
            .escrow
            .checked_sub(deposit)
            .ok_or(LedgerError::InsufficientFunds {
                available: self.escrow,
                required: deposit,
            })?;

        let payee = match outcome {
            Outcome::Accepted => *message.receiver(),
            Outcome::Denied => *message.sender(),
        };

        // The credit is the only step that can fail; nothing is mutated before it
        if let Err(e) = bank.credit(&payee, deposit) {
            warn!(%index, %payee, deposit, error = %e, "payout failed");
            return Err(e.into());
        }

        self.messages[slot].resolve();
        self.escrow = new_escrow;

        info!(%index, %outcome, %payee, deposit, "message resolved");
        sink.emit(Notification::MessageConfirmed { index, outcome });

        Ok(())
    }

    // ========================================================================
    // READS
    // ========================================================================

    /// Messages posted by an account, in creation order
    pub fn list_sent(&self, account: &AccountId) -> Vec<&Message> {
        debug!(%account, "listing sent messages");
        self.collect(self.sender_index.get(account))
    }

    /// Messages addressed to an account, in creation order
    pub fn list_received(&self, account: &AccountId) -> Vec<&Message> {
        debug!(%account, "listing received messages");
        self.collect(self.receiver_index.get(account))
    }

    /// Escrow locked in messages an account has sent and that are still pending
    pub fn pending_outgoing(&self, account: &AccountId) -> u64 {
        self.list_sent(account)
            .iter()
            .filter(|m| m.is_pending())
            .map(|m| m.deposit_in_wei())
            .sum()
    }

    /// Sum of deposits over pending messages, computed from the table
    pub fn pending_total(&self) -> u64 {
        self.messages
            .iter()
            .filter(|m| m.is_pending())
            .map(|m| m.deposit_in_wei())
            .sum()
    }

    pub fn statistics(&self) -> LedgerStatistics {
        LedgerStatistics {
            total_messages: self.messages.len(),
            pending_messages: self.messages.iter().filter(|m| m.is_pending()).count(),
            unique_senders: self.sender_index.len(),
            unique_receivers: self.receiver_index.len(),
            escrow_balance: self.escrow,
        }
    }

    fn collect(&self, ids: Option<&Vec<MessageIndex>>) -> Vec<&Message> {
        ids.map(|ids| ids.iter().filter_map(|id| self.get(*id)).collect())
            .unwrap_or_default()
    }

    fn index_message(&mut self, index: MessageIndex, sender: &AccountId, receiver: &AccountId) {
        self.sender_index.entry(*sender).or_default().push(index);
        self.receiver_index.entry(*receiver).or_default().push(index);
    }

    /// Rebuild indexes from the message table (after deserialization)
    fn rebuild_indexes(&mut self) {
        self.sender_index.clear();
        self.receiver_index.clear();

        let entries: Vec<(MessageIndex, AccountId, AccountId)> = self
            .messages
            .iter()
            .map(|m| (m.index(), *m.sender(), *m.receiver()))
            .collect();
        for (index, sender, receiver) in entries {
            self.index_message(index, &sender, &receiver);
        }
    }

    // ========================================================================
    // SERIALIZATION
    // ========================================================================

    pub fn to_bytes(&self) -> Vec<u8> {
        postcard::to_allocvec(self).unwrap_or_default()
    }

    /// Deserialize and check the table is consistent before handing it out
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LedgerError> {
        let mut ledger: Ledger =
            postcard::from_bytes(bytes).map_err(|_| LedgerError::DeserializationFailed)?;
        ledger.verify()?;
        ledger.rebuild_indexes();
        Ok(ledger)
    }

    fn verify(&self) -> Result<(), LedgerError> {
        for (position, message) in self.messages.iter().enumerate() {
            if message.index().value() != position as u64 {
                return Err(LedgerError::CorruptState(format!(
                    "message at position {} carries index {}",
                    position,
                    message.index()
                )));
            }
        }

        let pending = self.pending_total();
        if pending != self.escrow {
            return Err(LedgerError::CorruptState(format!(
                "escrow {} does not match pending deposits {}",
                self.escrow, pending
            )));
        }
        Ok(())
    }
}
