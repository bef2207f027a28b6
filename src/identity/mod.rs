// Identity module - who is calling
// Ed25519 keypairs, account identifiers and signatures

mod account;
mod keypair;
mod signer;

pub use account::{AccountId, AccountIdError};
pub use keypair::{Keypair, KeypairError, PublicKey, SecretKey};
pub use signer::{Signature, SignatureError, Signer};
