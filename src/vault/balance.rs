// Account balances and the value-transfer capability the ledger draws on

use crate::identity::AccountId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during vault operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VaultError {
    #[error("Insufficient balance: available {available}, required {required}")]
    InsufficientBalance { available: u64, required: u64 },

    #[error("Balance would overflow")]
    BalanceOverflow,

    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),
}

/// Moves native value in and out of accounts.
///
/// Both operations are all-or-nothing: on error the balance is untouched.
pub trait ValueTransfer {
    /// Spendable balance of an account (zero if never seen)
    fn balance_of(&self, account: &AccountId) -> u64;

    /// Add value to an account
    fn credit(&mut self, account: &AccountId, amount: u64) -> Result<(), VaultError>;

    /// Remove value from an account
    fn debit(&mut self, account: &AccountId, amount: u64) -> Result<(), VaultError>;
}

/// The Vault - in-memory balance book for every account
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Vault {
    balances: HashMap<AccountId, u64>,
    /// Sum of all balances; kept so overflow is caught at the book level too
    total_supply: u64,
}

impl Vault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint value into an account from outside the system (faucet, test setup)
    pub fn deposit(&mut self, account: &AccountId, amount: u64) -> Result<(), VaultError> {
        self.credit(account, amount)
    }

    /// Total value held across all accounts
    pub fn total_supply(&self) -> u64 {
        self.total_supply
    }

    pub fn can_afford(&self, account: &AccountId, amount: u64) -> bool {
        self.balance_of(account) >= amount
    }

    /// Number of accounts that have ever held a balance
    pub fn account_count(&self) -> usize {
        self.balances.len()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        postcard::to_allocvec(self).unwrap_or_default()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, VaultError> {
        postcard::from_bytes(bytes).map_err(|e| VaultError::DeserializationFailed(e.to_string()))
    }
}

impl ValueTransfer for Vault {
    fn balance_of(&self, account: &AccountId) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn credit(&mut self, account: &AccountId, amount: u64) -> Result<(), VaultError> {
        let new_balance = self
            .balance_of(account)
            .checked_add(amount)
            .ok_or(VaultError::BalanceOverflow)?;
        let new_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(VaultError::BalanceOverflow)?;

        self.balances.insert(*account, new_balance);
        self.total_supply = new_supply;
        Ok(())
    }

    fn debit(&mut self, account: &AccountId, amount: u64) -> Result<(), VaultError> {
        let available = self.balance_of(account);
        if amount > available {
            return Err(VaultError::InsufficientBalance {
                available,
                required: amount,
            });
        }

        self.balances.insert(*account, available - amount);
        self.total_supply -= amount;
        Ok(())
    }
}
