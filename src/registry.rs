// Registry - Single-writer host for the ledger
//
// Owns the ledger, the vault it pays out of and the replay guard behind one
// mutex, so every write commits (or fails) before the next is looked at.
// Notifications are broadcast while the lock is held, so subscribers see them
// in commit order.

use crate::call::{Call, CallError, CallId, SignedCall};
use crate::identity::AccountId;
use crate::ledger::{
    BroadcastSink, Ledger, LedgerError, LedgerStatistics, Message, MessageIndex, Notification,
    Outcome,
};
use crate::vault::{ValueTransfer, Vault, VaultError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Configuration for a registry
#[derive(Clone, Debug)]
pub struct RegistryConfig {
    /// Notifications buffered per subscriber before slow ones start lagging
    pub notification_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            notification_capacity: 256,
        }
    }
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Call(#[from] CallError),

    #[error("Funding failed: {0}")]
    Funding(#[from] VaultError),

    #[error("Stale nonce {nonce} from {caller}: last accepted was {last}")]
    StaleNonce {
        caller: AccountId,
        nonce: u64,
        last: u64,
    },

    #[error("Nonce {nonce} from {caller} is out of range")]
    NonceOutOfRange { caller: AccountId, nonce: u64 },

    #[error("Snapshot error: {0}")]
    Snapshot(String),
}

// ============================================================================
// RESULTS AND SNAPSHOTS
// ============================================================================

/// What a committed call did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallOutcome {
    Posted(MessageIndex),
    Resolved(MessageIndex, Outcome),
}

/// Receipt for a committed signed call
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallReceipt {
    pub id: CallId,
    pub caller: AccountId,
    pub outcome: CallOutcome,
}

/// Everything needed to bring a registry back after a restart
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    ledger: Vec<u8>,
    vault: Vault,
    nonces: HashMap<AccountId, u64>,
}

impl RegistrySnapshot {
    pub fn to_bytes(&self) -> Result<Vec<u8>, RegistryError> {
        postcard::to_allocvec(self).map_err(|e| RegistryError::Snapshot(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RegistryError> {
        postcard::from_bytes(bytes).map_err(|e| RegistryError::Snapshot(e.to_string()))
    }
}

// ============================================================================
// REGISTRY
// ============================================================================

struct Inner {
    ledger: Ledger,
    vault: Vault,
    /// Last accepted nonce per caller
    nonces: HashMap<AccountId, u64>,
    events: BroadcastSink,
}

/// Thread-safe host around a [`Ledger`] and its [`Vault`]
pub struct Registry {
    inner: Mutex<Inner>,
}

impl Registry {
    pub fn new(config: RegistryConfig) -> Self {
        Self::from_parts(config, Ledger::new(), Vault::new(), HashMap::new())
    }

    fn from_parts(
        config: RegistryConfig,
        ledger: Ledger,
        vault: Vault,
        nonces: HashMap<AccountId, u64>,
    ) -> Self {
        Self {
            inner: Mutex::new(Inner {
                ledger,
                vault,
                nonces,
                events: BroadcastSink::new(config.notification_capacity),
            }),
        }
    }

    /// Restore from a snapshot, re-checking ledger consistency
    pub fn from_snapshot(
        config: RegistryConfig,
        snapshot: RegistrySnapshot,
    ) -> Result<Self, RegistryError> {
        let ledger = Ledger::from_bytes(&snapshot.ledger)?;
        Ok(Self::from_parts(config, ledger, snapshot.vault, snapshot.nonces))
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        let inner = self.lock();
        RegistrySnapshot {
            ledger: inner.ledger.to_bytes(),
            vault: inner.vault.clone(),
            nonces: inner.nonces.clone(),
        }
    }

    /// A write that panicked never got past its checks, so the data is still sound
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Receive every notification committed from now on
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.lock().events.subscribe()
    }

    // ========================================================================
    // WRITES
    // ========================================================================

    /// Mint value into an account from outside the system
    pub fn fund(&self, account: &AccountId, amount: u64) -> Result<u64, RegistryError> {
        let mut inner = self.lock();
        inner.vault.deposit(account, amount)?;
        let balance = inner.vault.balance_of(account);
        info!(%account, amount, balance, "account funded");
        Ok(balance)
    }

    pub fn post(
        &self,
        sender: AccountId,
        receiver: AccountId,
        text: impl Into<Vec<u8>>,
        deposit: u64,
    ) -> Result<MessageIndex, RegistryError> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        Ok(inner
            .ledger
            .post(&mut inner.vault, &mut inner.events, sender, receiver, text, deposit)?)
    }

    pub fn accept(&self, index: MessageIndex, caller: AccountId) -> Result<(), RegistryError> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        Ok(inner
            .ledger
            .accept(&mut inner.vault, &mut inner.events, index, caller)?)
    }

    pub fn deny(&self, index: MessageIndex, caller: AccountId) -> Result<(), RegistryError> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        Ok(inner
            .ledger
            .deny(&mut inner.vault, &mut inner.events, index, caller)?)
    }

    /// Authenticate a signed call, reject replays, then apply it.
    ///
    /// The nonce is only consumed if the call commits.
    pub fn execute(&self, signed: &SignedCall) -> Result<CallReceipt, RegistryError> {
        let caller = signed.authenticate().map_err(|e| {
            warn!(id = %signed.id(), "call rejected: bad signature");
            e
        })?;

        // u64::MAX would leave no nonce for the caller's next call
        if signed.nonce() == u64::MAX {
            warn!(%caller, "call rejected: nonce out of range");
            return Err(RegistryError::NonceOutOfRange {
                caller,
                nonce: signed.nonce(),
            });
        }

        let mut guard = self.lock();
        let inner = &mut *guard;

        if let Some(&last) = inner.nonces.get(&caller) {
            if signed.nonce() <= last {
                warn!(%caller, nonce = signed.nonce(), last, "call rejected: stale nonce");
                return Err(RegistryError::StaleNonce {
                    caller,
                    nonce: signed.nonce(),
                    last,
                });
            }
        }

        let outcome = match signed.call() {
            Call::Post {
                receiver,
                text,
                deposit,
            } => {
                let index = inner.ledger.post(
                    &mut inner.vault,
                    &mut inner.events,
                    caller,
                    *receiver,
                    text.clone(),
                    *deposit,
                )?;
                CallOutcome::Posted(index)
            }
            Call::Accept { index } => {
                inner
                    .ledger
                    .accept(&mut inner.vault, &mut inner.events, *index, caller)?;
                CallOutcome::Resolved(*index, Outcome::Accepted)
            }
            Call::Deny { index } => {
                inner
                    .ledger
                    .deny(&mut inner.vault, &mut inner.events, *index, caller)?;
                CallOutcome::Resolved(*index, Outcome::Denied)
            }
        };

        inner.nonces.insert(caller, signed.nonce());
        debug!(id = %signed.id(), call = signed.call().name(), "call committed");

        Ok(CallReceipt {
            id: signed.id(),
            caller,
            outcome,
        })
    }

    // ========================================================================
    // READS
    // ========================================================================

    /// Nonce the caller should sign its next call with.
    ///
    /// `u64::MAX` is never accepted, so an account that has used
    /// `u64::MAX - 1` has no calls left.
    pub fn next_nonce(&self, account: &AccountId) -> u64 {
        self.lock()
            .nonces
            .get(account)
            .map_or(0, |n| n.saturating_add(1))
    }

    pub fn list_sent(&self, account: &AccountId) -> Vec<Message> {
        self.lock()
            .ledger
            .list_sent(account)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn list_received(&self, account: &AccountId) -> Vec<Message> {
        self.lock()
            .ledger
            .list_received(account)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn message(&self, index: MessageIndex) -> Option<Message> {
        self.lock().ledger.get(index).cloned()
    }

    pub fn balance_of(&self, account: &AccountId) -> u64 {
        self.lock().vault.balance_of(account)
    }

    pub fn escrow_balance(&self) -> u64 {
        self.lock().ledger.escrow_balance()
    }

    pub fn statistics(&self) -> LedgerStatistics {
        self.lock().ledger.statistics()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}
