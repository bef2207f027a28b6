use crate::identity::{AccountId, PublicKey, Signature, Signer};
use crate::ledger::MessageIndex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

const SIGNING_DOMAIN: &[u8] = b"messenger:call:v1";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallError {
    #[error("Invalid signature on call")]
    InvalidSignature,
}

/// Unique identifier for a call (SHA256 of its signing bytes)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallId([u8; 32]);

impl CallId {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "call:{}", hex::encode(&self.0[..8]))
    }
}

/// A mutating ledger operation, minus the caller
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Call {
    Post {
        receiver: AccountId,
        text: Vec<u8>,
        deposit: u64,
    },
    Accept {
        index: MessageIndex,
    },
    Deny {
        index: MessageIndex,
    },
}

impl Call {
    pub fn name(&self) -> &'static str {
        match self {
            Call::Post { .. } => "post",
            Call::Accept { .. } => "accept",
            Call::Deny { .. } => "deny",
        }
    }

    fn write_signing_bytes(&self, bytes: &mut Vec<u8>) {
        match self {
            Call::Post {
                receiver,
                text,
                deposit,
            } => {
                bytes.push(0);
                bytes.extend_from_slice(receiver.as_bytes());
                bytes.extend_from_slice(&deposit.to_le_bytes());
                bytes.extend_from_slice(&(text.len() as u64).to_le_bytes());
                bytes.extend_from_slice(text);
            }
            Call::Accept { index } => {
                bytes.push(1);
                bytes.extend_from_slice(&index.value().to_le_bytes());
            }
            Call::Deny { index } => {
                bytes.push(2);
                bytes.extend_from_slice(&index.value().to_le_bytes());
            }
        }
    }
}

/// A call signed by the account making it
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedCall {
    caller: PublicKey,
    nonce: u64,
    call: Call,
    signature: Signature,
}

impl SignedCall {
    pub fn from_parts(caller: PublicKey, nonce: u64, call: Call, signature: Signature) -> Self {
        Self {
            caller,
            nonce,
            call,
            signature,
        }
    }

    pub fn caller(&self) -> AccountId {
        AccountId::from_public_key(&self.caller)
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn call(&self) -> &Call {
        &self.call
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn id(&self) -> CallId {
        let digest = Sha256::digest(signing_bytes(&self.caller, self.nonce, &self.call));
        let mut id = [0u8; 32];
        id.copy_from_slice(&digest);
        CallId(id)
    }

    /// Check the signature and return who made the call
    pub fn authenticate(&self) -> Result<AccountId, CallError> {
        let bytes = signing_bytes(&self.caller, self.nonce, &self.call);
        if !Signer::verify(&self.caller, &bytes, &self.signature) {
            return Err(CallError::InvalidSignature);
        }
        Ok(self.caller())
    }
}

/// Deterministic encoding covered by the signature
pub(crate) fn signing_bytes(caller: &PublicKey, nonce: u64, call: &Call) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(SIGNING_DOMAIN.len() + 32 + 8 + 64);
    bytes.extend_from_slice(SIGNING_DOMAIN);
    bytes.extend_from_slice(caller.as_bytes());
    bytes.extend_from_slice(&nonce.to_le_bytes());
    call.write_signing_bytes(&mut bytes);
    bytes
}
