// Messenger - deposit-backed messages with exactly-once escrow resolution
//
// A sender posts a message with a deposit attached; the receiver accepts it
// (deposit paid to the receiver) or denies it (deposit returned), once.

pub mod call;
pub mod identity;
pub mod ledger;
pub mod registry;
pub mod storage;
pub mod vault;
