//! Persistent source → destination translation ledger.
//!
//! The ledger is the only state carried between runs. It is loaded fully at
//! startup and rewritten to disk after every mutation.

mod entry;
mod store;

pub use entry::LedgerEntry;
pub use store::{Ledger, LedgerError, LedgerResult, DEFAULT_LEDGER_FILE};
