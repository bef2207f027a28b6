// Ledger module - THE ESCROW
// Message table, escrow balance, sender/receiver indexes and notifications

mod events;
mod message;
mod state;

pub use events::{BroadcastSink, Notification, NotificationSink, NullSink};
pub use message::{Message, MessageIndex, Outcome};
pub use state::{Ledger, LedgerError, LedgerStatistics};
