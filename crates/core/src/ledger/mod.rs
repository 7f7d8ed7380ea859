//! Wallet ledger logic.
//!
//! This module implements:
//! - Entry types and statuses
//! - Entry and transfer-pair planning
//! - Identifier generation for entries and UTRs
//! - Balance derivation used by reconciliation

pub mod balance;
pub mod error;
pub mod service;
pub mod types;
pub mod utr;

#[cfg(test)]
mod service_props;

pub use balance::{Reconciliation, balance_effect, derive_balance};
pub use error::LedgerError;
pub use service::LedgerService;
pub use types::{EntryDraft, EntrySide, EntrySnapshot, EntryStatus, EntryType, TransferPlan};
pub use utr::{DEFAULT_MAX_ATTEMPTS, EntryIdentifiers, IdSource, RandomIdSource};
