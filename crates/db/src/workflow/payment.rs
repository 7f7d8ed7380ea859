//! Payments from REGULAR wallets to the tenant's MASTER wallet.

use tracing::info;

use ledgerloop_core::account::{AccountService, WalletRole};
use ledgerloop_core::ledger::{EntryStatus, EntryType, LedgerService};
use ledgerloop_core::workflow::{
    Decision, WorkflowError, WorkflowKind, WorkflowService, WorkflowStage,
};
use ledgerloop_shared::types::{Money, WalletId};

use crate::repositories::{LedgerRepository, WalletKey, WalletRepository};

use super::mutator::Settlement;
use super::{PaymentRequest, ReviewRequest, WalletEngine, WorkflowReceipt};

impl WalletEngine {
    /// Moves money from a REGULAR wallet to the MASTER wallet immediately.
    ///
    /// # Returns
    /// * `Ok(WorkflowReceipt)` with the `SUCCESS` DEBIT and CREDIT pair
    /// * `Err(WorkflowError::InsufficientFunds)` if the wallet cannot cover the amount
    pub async fn pay_to_master(
        &self,
        request: PaymentRequest,
    ) -> Result<WorkflowReceipt, WorkflowError> {
        let txn = self.begin().await?;
        let payer = WalletRepository::find_for_update(
            &txn,
            WalletKey::AccountNo(&request.account_no),
            WalletRole::Regular,
            Some(request.tenant),
        )
        .await?;
        let master = WalletRepository::master_for_tenant(&txn, request.tenant).await?;
        let payer_state = WalletRepository::state(&payer);
        AccountService::ensure_same_currency(&payer_state, &WalletRepository::state(&master))?;

        let plan = LedgerService::plan_transfer(
            payer_state.id,
            WalletId::from_uuid(master.id),
            request.amount,
            &payer.currency,
            &request.description,
            EntryType::Debit,
            EntryType::Credit,
            None,
        )?;
        AccountService::ensure_sufficient(&payer_state, plan.amount())?;

        let ids = self.allocator();
        let utr = ids.utr(&txn).await?;
        let (debit, credit) = LedgerRepository::insert_transfer(&txn, &ids, &plan, &utr).await?;

        Self::settle(
            txn,
            &utr,
            Settlement {
                debit: Some((payer.id, plan.amount())),
                credit: Some((master.id, plan.amount())),
                statuses: vec![
                    (debit.id, EntryStatus::Success),
                    (credit.id, EntryStatus::Success),
                ],
                on_failure: vec![debit.id, credit.id],
                ..Settlement::default()
            },
        )
        .await?;

        info!(utr = %utr, wallet = %payer.account_no, amount = %plan.amount(), "Payment to master completed");
        self.receipt(
            WorkflowKind::PayToMaster,
            utr,
            WorkflowStage::Completed,
            &[debit.id, credit.id],
        )
        .await
    }

    /// Records a payment awaiting the tenant's review. No balance moves yet.
    ///
    /// # Returns
    /// * `Ok(WorkflowReceipt)` with the `PENDING` DEBIT
    /// * `Err(WorkflowError::InsufficientFunds)` if the wallet cannot cover the amount today
    pub async fn request_payment(
        &self,
        request: PaymentRequest,
    ) -> Result<WorkflowReceipt, WorkflowError> {
        let txn = self.begin().await?;
        let payer = WalletRepository::find_for_update(
            &txn,
            WalletKey::AccountNo(&request.account_no),
            WalletRole::Regular,
            Some(request.tenant),
        )
        .await?;
        let master = WalletRepository::master_for_tenant(&txn, request.tenant).await?;
        let payer_state = WalletRepository::state(&payer);
        AccountService::ensure_same_currency(&payer_state, &WalletRepository::state(&master))?;

        let draft = LedgerService::plan_entry(
            payer_state.id,
            request.amount,
            &payer.currency,
            EntryType::Debit,
            &request.description,
            None,
        )?;
        AccountService::ensure_sufficient(&payer_state, draft.amount)?;

        let ids = self.allocator();
        let utr = ids.utr(&txn).await?;
        let debit = LedgerRepository::insert_entry(&txn, &ids, &draft, &utr, None).await?;
        Self::commit(txn).await?;

        info!(utr = %utr, wallet = %payer.account_no, amount = %draft.amount, "Payment requested");
        self.receipt(
            WorkflowKind::PaymentRequest,
            utr,
            WorkflowStage::AwaitingApproval,
            &[debit.id],
        )
        .await
    }

    /// Approves or rejects a pending payment request.
    ///
    /// Approval books the matching CREDIT on the MASTER wallet under the same
    /// UTR and moves the money; rejection only closes the request.
    ///
    /// # Returns
    /// * `Err(WorkflowError::NotFound)` if no payment carries the UTR
    /// * `Err(WorkflowError::Conflict)` if the request was already reviewed or
    ///   the UTR already carries a CREDIT, as a direct payment does
    pub async fn review_payment(
        &self,
        review: ReviewRequest,
    ) -> Result<WorkflowReceipt, WorkflowError> {
        let txn = self.begin().await?;
        let debit = LedgerRepository::find_by_utr_and_type(&txn, &review.utr, EntryType::Debit)
            .await?
            .ok_or_else(|| WorkflowError::NotFound(format!("Transaction {}", review.utr)))?;
        let payer = WalletRepository::load(
            &txn,
            WalletKey::Id(WalletId::from_uuid(debit.wallet_id)),
            review.tenant,
        )
        .await?;
        WorkflowService::review(
            &LedgerRepository::snapshot(&debit),
            EntryType::Debit,
            review.decision,
        )?;
        if LedgerRepository::find_by_utr_and_type(&txn, &review.utr, EntryType::Credit)
            .await?
            .is_some()
        {
            return Err(WorkflowError::Conflict(format!(
                "Transaction {} is not a payment request",
                review.utr
            )));
        }

        if review.decision == Decision::Rejected {
            LedgerRepository::set_status(&txn, debit.id, EntryStatus::Rejected).await?;
            Self::commit(txn).await?;
            info!(utr = %review.utr, wallet = %payer.account_no, "Payment request rejected");
            return self
                .receipt(
                    WorkflowKind::PaymentReview,
                    review.utr,
                    WorkflowStage::Rejected,
                    &[debit.id],
                )
                .await;
        }

        let payer = WalletRepository::find_for_update(
            &txn,
            WalletKey::Id(WalletId::from_uuid(payer.id)),
            WalletRole::Regular,
            Some(review.tenant),
        )
        .await?;
        let master = WalletRepository::master_for_tenant(&txn, review.tenant).await?;
        let amount = Money::from_minor(debit.amount_minor);
        AccountService::ensure_sufficient(&WalletRepository::state(&payer), amount)?;

        let draft = LedgerService::plan_entry(
            WalletId::from_uuid(master.id),
            amount,
            &debit.currency,
            EntryType::Credit,
            &review.description,
            None,
        )?;
        let ids = self.allocator();
        let credit = LedgerRepository::insert_entry(&txn, &ids, &draft, &review.utr, None).await?;
        LedgerService::verify_pair(
            &LedgerRepository::snapshot(&debit),
            &LedgerRepository::snapshot(&credit),
        )?;

        Self::settle(
            txn,
            &review.utr,
            Settlement {
                debit: Some((payer.id, amount)),
                credit: Some((master.id, amount)),
                statuses: vec![
                    (debit.id, EntryStatus::Approved),
                    (credit.id, EntryStatus::Success),
                ],
                on_failure: vec![debit.id, credit.id],
                ..Settlement::default()
            },
        )
        .await?;

        info!(utr = %review.utr, wallet = %payer.account_no, amount = %amount, "Payment request approved");
        self.receipt(
            WorkflowKind::PaymentReview,
            review.utr,
            WorkflowStage::Completed,
            &[debit.id, credit.id],
        )
        .await
    }
}
