// Call module - The signed request envelope
// How a transport hands the ledger an authenticated caller

mod builder;
mod codec;
mod model;

pub use builder::*;
pub use codec::*;
pub use model::*;
