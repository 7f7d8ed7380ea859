//! Balance mutator.
//!
//! Every flow writes its entries and its balance effect in one outer storage
//! transaction. The balance effect runs inside a savepoint: on success the
//! savepoint and the outer transaction commit together; on failure the
//! savepoint is rolled back and the new entries are committed as `FAILURE`.
//! An outer transaction dropped before commit leaves nothing behind.

use rust_decimal::Decimal;
use sea_orm::{DatabaseTransaction, TransactionTrait};
use tracing::warn;
use uuid::Uuid;

use ledgerloop_core::ledger::EntryStatus;
use ledgerloop_core::workflow::WorkflowError;

use crate::repositories::{BankRepository, LedgerRepository, WalletRepository, db_error};

use super::WalletEngine;

/// Everything the atomic phase of one flow changes.
#[derive(Debug, Default)]
pub(crate) struct Settlement {
    /// Wallet and amount to debit under the balance guard.
    pub debit: Option<(Uuid, Decimal)>,
    /// Wallet and amount to credit.
    pub credit: Option<(Uuid, Decimal)>,
    /// Entries to move out of `PENDING`.
    pub statuses: Vec<(Uuid, EntryStatus)>,
    /// UTRs whose entries become settled.
    pub settle_utrs: Vec<String>,
    /// Bank reference receiving its confirming `utr_no`.
    pub bank_utr: Option<(Uuid, String)>,
    /// Entries marked `FAILURE` if the phase fails.
    pub on_failure: Vec<Uuid>,
}

impl WalletEngine {
    /// Applies `settlement` and commits `txn`, which already holds the flow's
    /// new entries.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientFunds` when the balance guard rejects the debit and
    /// `Conflict` for any other failure of the balance effect. In both cases no
    /// balance changed and the `on_failure` entries were committed as `FAILURE`.
    /// Any storage error while recording the failure drops `txn` and with it
    /// every row the flow wrote.
    pub(crate) async fn settle(
        txn: DatabaseTransaction,
        utr: &str,
        settlement: Settlement,
    ) -> Result<(), WorkflowError> {
        let savepoint = txn.begin().await.map_err(db_error)?;
        let err = match Self::apply_in(&savepoint, &settlement).await {
            Ok(()) => {
                savepoint.commit().await.map_err(db_error)?;
                return Self::commit(txn).await;
            }
            Err(err) => err,
        };

        savepoint.rollback().await.map_err(db_error)?;
        let failed = LedgerRepository::mark_failed(&txn, &settlement.on_failure).await?;
        Self::commit(txn).await?;
        warn!(utr, code = err.error_code(), error = %err, failed, "Balance mutation rolled back");

        Err(match err {
            err @ (WorkflowError::InsufficientFunds { .. } | WorkflowError::Conflict(_)) => err,
            other => WorkflowError::Conflict(other.to_string()),
        })
    }

    async fn apply_in(
        txn: &DatabaseTransaction,
        settlement: &Settlement,
    ) -> Result<(), WorkflowError> {
        if let Some((wallet_id, amount)) = settlement.debit {
            WalletRepository::debit(txn, wallet_id, amount).await?;
        }
        if let Some((wallet_id, amount)) = settlement.credit {
            WalletRepository::credit(txn, wallet_id, amount).await?;
        }
        for (entry_id, status) in &settlement.statuses {
            LedgerRepository::set_status(txn, *entry_id, *status).await?;
        }
        if let Some((reference_id, utr_no)) = &settlement.bank_utr {
            BankRepository::set_utr_no(txn, *reference_id, utr_no).await?;
        }
        LedgerRepository::mark_settled(txn, &settlement.settle_utrs).await?;
        Ok(())
    }
}
