// Vault module - Tracks what each account can spend

mod balance;

pub use balance::{ValueTransfer, Vault, VaultError};
