//! Bank deposits into REGULAR wallets.

use tracing::info;

use ledgerloop_core::account::WalletRole;
use ledgerloop_core::ledger::{EntryStatus, EntryType, LedgerService};
use ledgerloop_core::workflow::{WorkflowError, WorkflowKind, WorkflowStage};
use ledgerloop_shared::types::WalletId;

use crate::repositories::{BankRepository, LedgerRepository, WalletKey, WalletRepository};

use super::mutator::Settlement;
use super::{DepositRequest, WalletEngine, WorkflowReceipt};

impl WalletEngine {
    /// Credits a REGULAR wallet with money received by bank transfer.
    ///
    /// The bank `utr_no` identifies the transfer; a second deposit quoting the
    /// same `utr_no` is refused before anything is written.
    ///
    /// # Returns
    /// * `Ok(WorkflowReceipt)` with the `SUCCESS` credit entry
    /// * `Err(WorkflowError::Validation)` if `utr_no` or another bank field is missing
    /// * `Err(WorkflowError::Conflict)` if the `utr_no` was already processed
    pub async fn deposit(&self, request: DepositRequest) -> Result<WorkflowReceipt, WorkflowError> {
        let bank = request.bank.normalized()?;
        if bank.utr_no.is_none() {
            return Err(WorkflowError::Validation("utr_no is required".to_string()));
        }

        let txn = self.begin().await?;
        let wallet = WalletRepository::find_for_update(
            &txn,
            WalletKey::AccountNo(&request.account_no),
            WalletRole::Regular,
            Some(request.tenant),
        )
        .await?;
        let draft = LedgerService::plan_entry(
            WalletId::from_uuid(wallet.id),
            request.amount,
            &wallet.currency,
            EntryType::Credit,
            &request.description,
            None,
        )?;

        let reference = BankRepository::insert(&txn, self.cipher.as_ref(), &bank).await?;
        let ids = self.allocator();
        let utr = ids.utr(&txn).await?;
        let credit =
            LedgerRepository::insert_entry(&txn, &ids, &draft, &utr, Some(reference.id)).await?;

        Self::settle(
            txn,
            &utr,
            Settlement {
                credit: Some((wallet.id, draft.amount)),
                statuses: vec![(credit.id, EntryStatus::Success)],
                on_failure: vec![credit.id],
                ..Settlement::default()
            },
        )
        .await?;

        info!(utr = %utr, wallet = %wallet.account_no, amount = %draft.amount, "Deposit completed");
        self.receipt(WorkflowKind::Deposit, utr, WorkflowStage::Completed, &[credit.id])
            .await
    }
}
