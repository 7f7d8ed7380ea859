//! Workflow error types.
//!
//! Every workflow call fails with one of these kinds; `error_code` is the
//! stable machine-readable form.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::account::AccountError;
use crate::ledger::LedgerError;

/// Errors that can occur during workflow operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Entity absent.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Uniqueness or state-precondition violation.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Wallet or tenant disabled, or caller not authorized.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Step invoked out of order or with an unusable decision.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Balance does not cover the amount.
    #[error("Insufficient funds: available {available}, requested {requested}")]
    InsufficientFunds {
        /// Balance at the time of the check.
        available: Decimal,
        /// Amount requested.
        requested: Decimal,
    },

    /// Missing or malformed input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl WorkflowError {
    /// Stable machine-readable code, logged when an atomic phase fails.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::InvalidState(_) => "INVALID_STATE",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// True for conflicts, including insufficient funds.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_) | Self::InsufficientFunds { .. })
    }
}

impl From<LedgerError> for WorkflowError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NonPositiveAmount(_)
            | LedgerError::AmountOutOfRange(_)
            | LedgerError::InvalidCurrency(_)
            | LedgerError::SameWallet
            | LedgerError::MismatchedPair { .. } => Self::Validation(err.to_string()),
            LedgerError::PairMismatch(_) => Self::InvalidState(err.to_string()),
            LedgerError::EntryNotFound(_) => Self::NotFound(err.to_string()),
            LedgerError::IdentifiersExhausted { .. } | LedgerError::DuplicateEntry { .. } => {
                Self::Conflict(err.to_string())
            }
            LedgerError::Database(msg) => Self::Database(msg),
        }
    }
}

impl From<AccountError> for WorkflowError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::NotFound(_) => Self::NotFound(err.to_string()),
            AccountError::Disabled(_) => Self::Forbidden(err.to_string()),
            AccountError::WrongRole { .. } => Self::InvalidState(err.to_string()),
            AccountError::InsufficientFunds {
                available,
                requested,
            } => Self::InsufficientFunds {
                available,
                requested,
            },
            AccountError::BalanceNotZero { .. }
            | AccountError::AlreadyExists(_)
            | AccountError::SequenceExhausted(_) => Self::Conflict(err.to_string()),
            AccountError::CurrencyMismatch(..)
            | AccountError::InvalidPrefix(_)
            | AccountError::InvalidContact(_) => Self::Validation(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_codes() {
        assert_eq!(WorkflowError::NotFound(String::new()).error_code(), "NOT_FOUND");
        assert_eq!(WorkflowError::Conflict(String::new()).error_code(), "CONFLICT");
        assert_eq!(WorkflowError::Forbidden(String::new()).error_code(), "FORBIDDEN");
        assert_eq!(
            WorkflowError::InvalidState(String::new()).error_code(),
            "INVALID_STATE"
        );
        assert_eq!(
            WorkflowError::Validation(String::new()).error_code(),
            "VALIDATION_ERROR"
        );
        assert_eq!(
            WorkflowError::Database(String::new()).error_code(),
            "DATABASE_ERROR"
        );
    }

    #[test]
    fn test_insufficient_funds_is_a_conflict() {
        let err = WorkflowError::InsufficientFunds {
            available: dec!(10),
            requested: dec!(20),
        };
        assert!(err.is_conflict());
        assert_eq!(err.error_code(), "INSUFFICIENT_FUNDS");
        assert!(!WorkflowError::NotFound(String::new()).is_conflict());
    }

    #[test]
    fn test_from_account_error() {
        let err: WorkflowError = AccountError::Disabled("W1".into()).into();
        assert!(matches!(err, WorkflowError::Forbidden(_)));

        let err: WorkflowError = AccountError::InsufficientFunds {
            available: dec!(1),
            requested: dec!(2),
        }
        .into();
        assert!(matches!(err, WorkflowError::InsufficientFunds { .. }));
    }

    #[test]
    fn test_from_ledger_error() {
        let err: WorkflowError = LedgerError::NonPositiveAmount(dec!(0)).into();
        assert!(matches!(err, WorkflowError::Validation(_)));

        let err: WorkflowError = LedgerError::IdentifiersExhausted { attempts: 8 }.into();
        assert!(matches!(err, WorkflowError::Conflict(_)));
    }
}
