//! Storage layer for lottery submission intake.
//!
//! Provides the pluggable upload storage backend (local disk or remote
//! object store), the append-only CSV ledger of accepted submissions,
//! and the shared submission types.

mod error;
mod ledger;
mod storage;
mod types;

pub use error::StoreError;
pub use ledger::{Ledger, LedgerRow, LEDGER_HEADER};
pub use storage::{LocalStorage, RemoteStorage, Storage};
pub use types::*;
