use crate::call::model::signing_bytes;
use crate::call::{Call, SignedCall};
use crate::identity::{Keypair, Signer};
use thiserror::Error;

/// Errors that can occur when building a call
#[derive(Error, Debug)]
pub enum CallBuildError {
    #[error("Missing caller: caller keypair is required")]
    MissingCaller,

    #[error("Missing call: operation is required")]
    MissingCall,

    #[error("Missing nonce: each call needs the caller's next nonce")]
    MissingNonce,
}

/// Builder for signed calls
pub struct CallBuilder<'a> {
    caller: Option<&'a Keypair>,
    call: Option<Call>,
    nonce: Option<u64>,
}

impl<'a> CallBuilder<'a> {
    pub fn new() -> Self {
        Self {
            caller: None,
            call: None,
            nonce: None,
        }
    }

    /// Set the caller (required)
    pub fn caller(mut self, keypair: &'a Keypair) -> Self {
        self.caller = Some(keypair);
        self
    }

    /// Set the operation (required)
    pub fn call(mut self, call: Call) -> Self {
        self.call = Some(call);
        self
    }

    /// Set the nonce (required - must exceed the caller's last accepted nonce)
    pub fn nonce(mut self, nonce: u64) -> Self {
        self.nonce = Some(nonce);
        self
    }

    /// Build and sign the call
    pub fn build(self) -> Result<SignedCall, CallBuildError> {
        let keypair = self.caller.ok_or(CallBuildError::MissingCaller)?;
        let call = self.call.ok_or(CallBuildError::MissingCall)?;
        let nonce = self.nonce.ok_or(CallBuildError::MissingNonce)?;

        let caller = keypair.public_key();
        let signature = Signer::sign(keypair, &signing_bytes(&caller, nonce, &call));

        Ok(SignedCall::from_parts(caller, nonce, call, signature))
    }
}

impl<'a> Default for CallBuilder<'a> {
    fn default() -> Self {
        Self::new()
    }
}
