//! Cached balance versus ledger history.

use tracing::{debug, warn};

use ledgerloop_core::ledger::{Reconciliation, derive_balance};
use ledgerloop_core::workflow::WorkflowError;
use ledgerloop_shared::types::{Money, WalletId};

use crate::repositories::{LedgerRepository, WalletKey, WalletRepository};

use super::WalletEngine;

impl WalletEngine {
    /// Recomputes a wallet's balance from its entries and compares it with the
    /// cached column.
    pub async fn reconcile(&self, wallet_id: WalletId) -> Result<Reconciliation, WorkflowError> {
        let wallet = WalletRepository::find(&self.db, WalletKey::Id(wallet_id))
            .await?
            .ok_or_else(|| WorkflowError::NotFound(format!("Wallet {}", wallet_id.into_inner())))?;
        let history = LedgerRepository::wallet_history(&self.db, wallet.id).await?;

        let derived = derive_balance(history.iter().map(|entry| {
            (
                entry.entry_type.into(),
                entry.status.into(),
                Money::from_minor(entry.amount_minor),
            )
        }));
        let report = Reconciliation {
            wallet_id,
            cached: Money::from_minor(wallet.balance_minor),
            derived,
            entry_count: history.len(),
        };

        if report.is_consistent() {
            debug!(wallet = %wallet.account_no, balance = %report.cached, "Wallet reconciled");
        } else {
            warn!(
                wallet = %wallet.account_no,
                cached = %report.cached,
                derived = %report.derived,
                "Wallet balance drifted from ledger history"
            );
        }
        Ok(report)
    }
}
