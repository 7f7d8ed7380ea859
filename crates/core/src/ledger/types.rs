//! Ledger domain types.
//!
//! Entry types and statuses are closed sets; their string forms are the
//! values persisted in the `ledger_entries` table.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use ledgerloop_shared::types::WalletId;

/// Which side of a transfer an entry sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntrySide {
    /// Money leaves the wallet.
    Debit,
    /// Money enters the wallet.
    Credit,
}

/// Type of ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryType {
    /// Deposit or payment received.
    #[serde(rename = "CREDIT")]
    Credit,
    /// Payment made to the tenant's master wallet.
    #[serde(rename = "DEBIT")]
    Debit,
    /// Refund received by a regular wallet.
    #[serde(rename = "REFUND:CREDIT")]
    RefundCredit,
    /// Refund paid out of the master wallet.
    #[serde(rename = "REFUND:DEBIT")]
    RefundDebit,
    /// Held withdrawal funds returned after rejection.
    #[serde(rename = "WITHDRAW:CREDIT")]
    WithdrawCredit,
    /// Withdrawal to an external bank account.
    #[serde(rename = "WITHDRAW:DEBIT")]
    WithdrawDebit,
}

impl EntryType {
    /// All entry types.
    pub const ALL: [Self; 6] = [
        Self::Credit,
        Self::Debit,
        Self::RefundCredit,
        Self::RefundDebit,
        Self::WithdrawCredit,
        Self::WithdrawDebit,
    ];

    /// Returns the string representation of the entry type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Credit => "CREDIT",
            Self::Debit => "DEBIT",
            Self::RefundCredit => "REFUND:CREDIT",
            Self::RefundDebit => "REFUND:DEBIT",
            Self::WithdrawCredit => "WITHDRAW:CREDIT",
            Self::WithdrawDebit => "WITHDRAW:DEBIT",
        }
    }

    /// Parses an entry type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "CREDIT" => Some(Self::Credit),
            "DEBIT" => Some(Self::Debit),
            "REFUND:CREDIT" => Some(Self::RefundCredit),
            "REFUND:DEBIT" => Some(Self::RefundDebit),
            "WITHDRAW:CREDIT" => Some(Self::WithdrawCredit),
            "WITHDRAW:DEBIT" => Some(Self::WithdrawDebit),
            _ => None,
        }
    }

    /// Returns the side of the transfer this entry represents.
    #[must_use]
    pub const fn side(&self) -> EntrySide {
        match self {
            Self::Debit | Self::RefundDebit | Self::WithdrawDebit => EntrySide::Debit,
            Self::Credit | Self::RefundCredit | Self::WithdrawCredit => EntrySide::Credit,
        }
    }

    /// Returns the matching entry type on the other side of a pair.
    #[must_use]
    pub const fn counterpart(&self) -> Self {
        match self {
            Self::Credit => Self::Debit,
            Self::Debit => Self::Credit,
            Self::RefundCredit => Self::RefundDebit,
            Self::RefundDebit => Self::RefundCredit,
            Self::WithdrawCredit => Self::WithdrawDebit,
            Self::WithdrawDebit => Self::WithdrawCredit,
        }
    }

    /// Returns true for debit-side entry types.
    #[must_use]
    pub const fn is_debit(&self) -> bool {
        matches!(self.side(), EntrySide::Debit)
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ledger entry status.
///
/// Entries are created `Pending`. Every other status is terminal:
/// - Pending → Success (balance movement committed)
/// - Pending → Failure (balance movement rolled back)
/// - Pending → Approved (reviewer accepted a request)
/// - Pending → Rejected (reviewer declined a request)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntryStatus {
    /// Awaiting balance movement or review.
    Pending,
    /// Balance movement committed.
    Success,
    /// Balance movement failed and was rolled back.
    Failure,
    /// Request accepted by a reviewer.
    Approved,
    /// Request declined by a reviewer.
    Rejected,
}

impl EntryStatus {
    /// All statuses.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Success,
        Self::Failure,
        Self::Approved,
        Self::Rejected,
    ];

    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "PENDING" => Some(Self::Pending),
            "SUCCESS" => Some(Self::Success),
            "FAILURE" => Some(Self::Failure),
            "APPROVED" => Some(Self::Approved),
            "REJECTED" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Returns true if the status can never change again.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Returns true if the entry represents money that actually moved.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Success | Self::Approved)
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An entry that has been validated but not yet persisted.
///
/// Identifiers (`uuid`, `txn_id`, `utr`) are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDraft {
    /// Wallet the entry is booked against.
    pub wallet_id: WalletId,
    /// Positive amount, two decimals.
    pub amount: Decimal,
    /// Currency code of the wallet.
    pub currency: String,
    /// Entry type.
    pub entry_type: EntryType,
    /// Free-text description.
    pub description: String,
    /// UTR of the entry this one refers back to.
    pub related_utr: Option<String>,
}

/// A debit/credit pair sharing one UTR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferPlan {
    /// Debit-side entry against the source wallet.
    pub debit: EntryDraft,
    /// Credit-side entry against the destination wallet.
    pub credit: EntryDraft,
}

impl TransferPlan {
    /// Amount moved by the pair.
    #[must_use]
    pub fn amount(&self) -> Decimal {
        self.debit.amount
    }
}

/// The facts about a persisted entry that business rules need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySnapshot {
    /// Wallet the entry is booked against.
    pub wallet_id: WalletId,
    /// Entry type.
    pub entry_type: EntryType,
    /// Current status.
    pub status: EntryStatus,
    /// Amount.
    pub amount: Decimal,
    /// Currency code.
    pub currency: String,
    /// Correlation code.
    pub utr: String,
    /// Whether the UTR has been refunded or otherwise closed out.
    pub settled: bool,
}
