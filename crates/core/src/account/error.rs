//! Wallet account error types.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::account::types::WalletRole;

/// Errors that can occur during wallet account checks.
#[derive(Debug, Error)]
pub enum AccountError {
    /// Wallet does not exist, was deleted, or belongs to another tenant.
    #[error("Wallet not found: {0}")]
    NotFound(String),

    /// Wallet is disabled.
    #[error("Wallet {0} is disabled")]
    Disabled(String),

    /// Wallet exists but has the wrong role for the operation.
    #[error("Wallet {account_no} is {actual}, expected {expected}")]
    WrongRole {
        /// Account number.
        account_no: String,
        /// Role the operation needs.
        expected: WalletRole,
        /// Role the wallet has.
        actual: WalletRole,
    },

    /// Balance does not cover the requested amount.
    #[error("Insufficient funds: available {available}, requested {requested}")]
    InsufficientFunds {
        /// Current balance.
        available: Decimal,
        /// Amount requested.
        requested: Decimal,
    },

    /// Wallets in a transfer use different currencies.
    #[error("Currency mismatch: {0} vs {1}")]
    CurrencyMismatch(String, String),

    /// Wallet cannot be closed while it holds funds.
    #[error("Wallet {account_no} still holds {balance}")]
    BalanceNotZero {
        /// Account number.
        account_no: String,
        /// Remaining balance.
        balance: Decimal,
    },

    /// Wallet already exists for the owner.
    #[error("Wallet already exists: {0}")]
    AlreadyExists(String),

    /// Account prefix is empty or contains unsupported characters.
    #[error("Invalid account prefix: {0:?}")]
    InvalidPrefix(String),

    /// The tenant's account number sequence is exhausted.
    #[error("Account number sequence exhausted for prefix {0}")]
    SequenceExhausted(String),

    /// Contact details are incomplete.
    #[error("Invalid contact details: {0}")]
    InvalidContact(String),
}

impl AccountError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Disabled(_) => "FORBIDDEN",
            Self::WrongRole { .. } => "INVALID_STATE",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::BalanceNotZero { .. } | Self::AlreadyExists(_) | Self::SequenceExhausted(_) => {
                "CONFLICT"
            }
            Self::CurrencyMismatch(..) | Self::InvalidPrefix(_) | Self::InvalidContact(_) => {
                "VALIDATION_ERROR"
            }
        }
    }
}
