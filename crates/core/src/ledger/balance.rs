//! Wallet balance derivation from ledger history.
//!
//! The cached `balance` column is the source of truth for sufficiency checks;
//! these rules recompute it from entries so the two can be reconciled.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ledgerloop_shared::types::WalletId;

use crate::ledger::types::{EntryStatus, EntryType};

/// Signed effect of one entry on its wallet's balance.
///
/// Credits count once they succeed. Payment and refund debits count once the
/// money has moved (`SUCCESS` or `APPROVED`). Withdrawal debits hold funds from
/// the moment they are requested, so `PENDING`, `APPROVED` and `REJECTED`
/// all count; a rejection is offset by its own `WITHDRAW:CREDIT`.
#[must_use]
pub fn balance_effect(entry_type: EntryType, status: EntryStatus, amount: Decimal) -> Decimal {
    let counts = match entry_type {
        EntryType::Credit | EntryType::RefundCredit | EntryType::WithdrawCredit => {
            status == EntryStatus::Success
        }
        EntryType::Debit | EntryType::RefundDebit => status.is_completed(),
        EntryType::WithdrawDebit => matches!(
            status,
            EntryStatus::Pending | EntryStatus::Approved | EntryStatus::Rejected
        ),
    };

    match (counts, entry_type.is_debit()) {
        (false, _) => Decimal::ZERO,
        (true, true) => -amount,
        (true, false) => amount,
    }
}

/// Sums the balance effect of a wallet's entries.
pub fn derive_balance<I>(entries: I) -> Decimal
where
    I: IntoIterator<Item = (EntryType, EntryStatus, Decimal)>,
{
    entries
        .into_iter()
        .map(|(entry_type, status, amount)| balance_effect(entry_type, status, amount))
        .sum()
}

/// Cached versus derived balance for one wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    /// Wallet that was checked.
    pub wallet_id: WalletId,
    /// Balance column value.
    pub cached: Decimal,
    /// Balance recomputed from ledger entries.
    pub derived: Decimal,
    /// Number of entries considered.
    pub entry_count: usize,
}

impl Reconciliation {
    /// Cached minus derived.
    #[must_use]
    pub fn difference(&self) -> Decimal {
        self.cached - self.derived
    }

    /// True when the cached balance agrees with history.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.difference().is_zero()
    }
}
