// Storage module - PERSISTENCE
// Keypairs and registry snapshots in sled

mod store;

pub use store::{MessengerStore, StorageStats, StoreError};
