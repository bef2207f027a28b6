use crate::identity::{KeypairError, PublicKey};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const ACCOUNT_PREFIX: &str = "acct:";

#[derive(Error, Debug)]
pub enum AccountIdError {
    #[error("Invalid account format: {0}")]
    InvalidFormat(String),

    #[error("Invalid base58 encoding: {0}")]
    InvalidBase58(String),

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(#[from] KeypairError),
}

/// Account identifier in the format `acct:<base58_public_key>`
///
/// Only keys that decode to a valid Ed25519 point are accepted, so every
/// account can in principle authenticate calls.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId([u8; 32]);

impl AccountId {
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        Self(*public_key.as_bytes())
    }

    /// Parse an account from its string form
    pub fn parse(s: &str) -> Result<Self, AccountIdError> {
        let key_part = s.strip_prefix(ACCOUNT_PREFIX).ok_or_else(|| {
            AccountIdError::InvalidFormat(format!("expected '{}' prefix in '{}'", ACCOUNT_PREFIX, s))
        })?;

        if key_part.is_empty() {
            return Err(AccountIdError::InvalidFormat("key part cannot be empty".into()));
        }

        let bytes = bs58::decode(key_part)
            .into_vec()
            .map_err(|e| AccountIdError::InvalidBase58(e.to_string()))?;

        let public_key = PublicKey::from_bytes(&bytes)?;
        Ok(Self::from_public_key(&public_key))
    }

    pub fn public_key(&self) -> Result<PublicKey, AccountIdError> {
        Ok(PublicKey::from_bytes(&self.0)?)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", ACCOUNT_PREFIX, bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", self)
    }
}

impl FromStr for AccountId {
    type Err = AccountIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
