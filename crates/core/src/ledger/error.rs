//! Ledger error types.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::ledger::types::EntryType;

/// Errors that can occur while planning or recording ledger entries.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Amount must be strictly positive after rounding.
    #[error("Amount must be greater than zero, got {0}")]
    NonPositiveAmount(Decimal),

    /// Amount is too large to store.
    #[error("Amount {0} is out of range")]
    AmountOutOfRange(Decimal),

    /// Currency code is missing or unknown.
    #[error("Invalid currency: {0}")]
    InvalidCurrency(String),

    /// Source and destination wallets must differ.
    #[error("Source and destination wallet must be different")]
    SameWallet,

    /// Debit and credit entry types do not form a pair.
    #[error("Entry types {debit} and {credit} do not form a transfer pair")]
    MismatchedPair {
        /// Debit-side type.
        debit: EntryType,
        /// Credit-side type.
        credit: EntryType,
    },

    /// Paired entries disagree on amount, currency, or UTR.
    #[error("Paired entries do not match: {0}")]
    PairMismatch(String),

    // ========== Lookup Errors ==========
    /// No entry found for the given key.
    #[error("Ledger entry not found: {0}")]
    EntryNotFound(String),

    // ========== Identifier Errors ==========
    /// The identifier allocator gave up after repeated collisions.
    #[error("Could not allocate unique entry identifiers after {attempts} attempts")]
    IdentifiersExhausted {
        /// Attempts made.
        attempts: u32,
    },

    /// An entry with this UTR and type already exists.
    #[error("Entry {entry_type} already exists for UTR {utr}")]
    DuplicateEntry {
        /// Correlation code.
        utr: String,
        /// Entry type.
        entry_type: EntryType,
    },

    // ========== Infrastructure ==========
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NonPositiveAmount(_)
            | Self::AmountOutOfRange(_)
            | Self::InvalidCurrency(_)
            | Self::SameWallet
            | Self::MismatchedPair { .. } => "VALIDATION_ERROR",
            Self::PairMismatch(_) => "INVALID_STATE",
            Self::EntryNotFound(_) => "NOT_FOUND",
            Self::IdentifiersExhausted { .. } | Self::DuplicateEntry { .. } => "CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}
