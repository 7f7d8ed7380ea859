//! Refunds of completed payments, from the MASTER wallet back to the payer.

use tracing::info;

use ledgerloop_core::account::{AccountService, WalletRole};
use ledgerloop_core::ledger::{EntryStatus, EntryType, LedgerService};
use ledgerloop_core::workflow::{
    Decision, WorkflowError, WorkflowKind, WorkflowService, WorkflowStage,
};
use ledgerloop_shared::types::{Money, TenantId, WalletId};

use crate::repositories::{LedgerRepository, WalletKey, WalletRepository};

use super::mutator::Settlement;
use super::{RefundRequest, ReviewRequest, WalletEngine, WorkflowReceipt};

impl WalletEngine {
    /// Asks the tenant to refund a completed payment.
    ///
    /// Creates a `PENDING` REFUND:DEBIT against the MASTER wallet under a new
    /// UTR whose `related_utr` points at the payment.
    ///
    /// # Returns
    /// * `Err(WorkflowError::NotFound)` if the wallet made no payment with that UTR
    /// * `Err(WorkflowError::Conflict)` if the payment was refunded or a refund is pending
    /// * `Err(WorkflowError::InvalidState)` if the payment has not completed
    pub async fn request_refund(
        &self,
        request: RefundRequest,
    ) -> Result<WorkflowReceipt, WorkflowError> {
        let txn = self.begin().await?;
        let payer = WalletRepository::find_for_update(
            &txn,
            WalletKey::AccountNo(&request.account_no),
            WalletRole::Regular,
            Some(request.tenant),
        )
        .await?;
        let original =
            LedgerRepository::find_by_utr_and_type(&txn, &request.original_utr, EntryType::Debit)
                .await?
                .filter(|entry| entry.wallet_id == payer.id)
                .ok_or_else(|| {
                    WorkflowError::NotFound(format!("Transaction {}", request.original_utr))
                })?;
        WorkflowService::ensure_refundable(&LedgerRepository::snapshot(&original))?;
        if LedgerRepository::pending_refund_for(&txn, &original.utr)
            .await?
            .is_some()
        {
            return Err(WorkflowError::Conflict(format!(
                "Refund already requested for {}",
                original.utr
            )));
        }

        let master = WalletRepository::master_for_tenant(&txn, request.tenant).await?;
        let draft = LedgerService::plan_entry(
            WalletId::from_uuid(master.id),
            Money::from_minor(original.amount_minor),
            &original.currency,
            EntryType::RefundDebit,
            &request.description,
            Some(original.utr.clone()),
        )?;
        let ids = self.allocator();
        let utr = ids.utr(&txn).await?;
        let refund = LedgerRepository::insert_entry(&txn, &ids, &draft, &utr, None).await?;
        Self::commit(txn).await?;

        info!(utr = %utr, original_utr = %original.utr, wallet = %payer.account_no, "Refund requested");
        self.receipt(
            WorkflowKind::RefundRequest,
            utr,
            WorkflowStage::AwaitingApproval,
            &[refund.id],
        )
        .await
    }

    /// Approves or rejects a pending refund request.
    ///
    /// Approval books the REFUND:CREDIT to the payer under the refund UTR,
    /// moves the money out of the MASTER wallet and settles both the refund
    /// UTR and the payment UTR in the same transaction.
    ///
    /// # Returns
    /// * `Err(WorkflowError::Conflict)` if the request was already reviewed
    /// * `Err(WorkflowError::InsufficientFunds)` if the MASTER wallet cannot cover it
    pub async fn review_refund(
        &self,
        review: ReviewRequest,
    ) -> Result<WorkflowReceipt, WorkflowError> {
        let txn = self.begin().await?;
        let refund =
            LedgerRepository::find_by_utr_and_type(&txn, &review.utr, EntryType::RefundDebit)
                .await?
                .ok_or_else(|| WorkflowError::NotFound(format!("Refund {}", review.utr)))?;
        WalletRepository::load(
            &txn,
            WalletKey::Id(WalletId::from_uuid(refund.wallet_id)),
            review.tenant,
        )
        .await?;
        WorkflowService::review(
            &LedgerRepository::snapshot(&refund),
            EntryType::RefundDebit,
            review.decision,
        )?;
        let original_utr = refund.related_utr.clone().ok_or_else(|| {
            WorkflowError::InvalidState(format!("Refund {} has no original payment", refund.utr))
        })?;
        let original = LedgerRepository::find_by_utr_and_type(&txn, &original_utr, EntryType::Debit)
            .await?
            .ok_or_else(|| WorkflowError::NotFound(format!("Transaction {original_utr}")))?;

        if review.decision == Decision::Rejected {
            LedgerRepository::set_status(&txn, refund.id, EntryStatus::Rejected).await?;
            Self::commit(txn).await?;
            info!(utr = %review.utr, original_utr = %original_utr, "Refund request rejected");
            return self
                .receipt(
                    WorkflowKind::RefundReview,
                    review.utr,
                    WorkflowStage::Rejected,
                    &[refund.id],
                )
                .await;
        }

        WorkflowService::ensure_refundable(&LedgerRepository::snapshot(&original))?;
        let master = WalletRepository::master_for_tenant(&txn, review.tenant).await?;
        let payer = WalletRepository::find_for_update(
            &txn,
            WalletKey::Id(WalletId::from_uuid(original.wallet_id)),
            WalletRole::Regular,
            Some(review.tenant),
        )
        .await?;
        let amount = Money::from_minor(refund.amount_minor);
        AccountService::ensure_sufficient(&WalletRepository::state(&master), amount)?;

        let draft = LedgerService::plan_entry(
            WalletId::from_uuid(payer.id),
            amount,
            &refund.currency,
            EntryType::RefundCredit,
            &review.description,
            Some(original_utr.clone()),
        )?;
        let ids = self.allocator();
        let credit = LedgerRepository::insert_entry(&txn, &ids, &draft, &review.utr, None).await?;

        Self::settle(
            txn,
            &review.utr,
            Settlement {
                debit: Some((master.id, amount)),
                credit: Some((payer.id, amount)),
                statuses: vec![
                    (refund.id, EntryStatus::Approved),
                    (credit.id, EntryStatus::Success),
                ],
                settle_utrs: vec![review.utr.clone(), original_utr.clone()],
                on_failure: vec![refund.id, credit.id],
                ..Settlement::default()
            },
        )
        .await?;

        info!(utr = %review.utr, original_utr = %original_utr, wallet = %payer.account_no, amount = %amount, "Refund approved");
        self.receipt(
            WorkflowKind::RefundReview,
            review.utr,
            WorkflowStage::Completed,
            &[refund.id, credit.id],
        )
        .await
    }

    /// Refunds a completed payment immediately, without a request.
    ///
    /// The payment's DEBIT and CREDIT are checked as a pair; the refund is a
    /// REFUND:DEBIT(MASTER) and REFUND:CREDIT(REGULAR) pair under a new UTR,
    /// both `SUCCESS`, and both UTRs end up settled.
    ///
    /// # Returns
    /// * `Err(WorkflowError::Conflict)` if the payment was refunded or a refund is pending
    /// * `Err(WorkflowError::InsufficientFunds)` if the MASTER wallet cannot cover it
    pub async fn direct_refund(
        &self,
        tenant: TenantId,
        utr: &str,
        description: &str,
    ) -> Result<WorkflowReceipt, WorkflowError> {
        let txn = self.begin().await?;
        let debit = LedgerRepository::find_by_utr_and_type(&txn, utr, EntryType::Debit)
            .await?
            .ok_or_else(|| WorkflowError::NotFound(format!("Transaction {utr}")))?;
        let credit = LedgerRepository::find_by_utr_and_type(&txn, utr, EntryType::Credit)
            .await?
            .ok_or_else(|| WorkflowError::NotFound(format!("Transaction {utr}")))?;
        WorkflowService::ensure_direct_refund(
            &LedgerRepository::snapshot(&debit),
            &LedgerRepository::snapshot(&credit),
        )?;

        let payer = WalletRepository::find_for_update(
            &txn,
            WalletKey::Id(WalletId::from_uuid(debit.wallet_id)),
            WalletRole::Regular,
            Some(tenant),
        )
        .await?;
        let master = WalletRepository::master_for_tenant(&txn, tenant).await?;
        if master.id != credit.wallet_id {
            return Err(WorkflowError::InvalidState(format!(
                "Transaction {utr} was not paid to the master wallet"
            )));
        }
        if LedgerRepository::pending_refund_for(&txn, utr)
            .await?
            .is_some()
        {
            return Err(WorkflowError::Conflict(format!(
                "Refund already requested for {utr}"
            )));
        }

        let amount = Money::from_minor(debit.amount_minor);
        AccountService::ensure_sufficient(&WalletRepository::state(&master), amount)?;
        let plan = LedgerService::plan_transfer(
            WalletId::from_uuid(master.id),
            WalletId::from_uuid(payer.id),
            amount,
            &debit.currency,
            description,
            EntryType::RefundDebit,
            EntryType::RefundCredit,
            Some(utr.to_string()),
        )?;
        let ids = self.allocator();
        let refund_utr = ids.utr(&txn).await?;
        let (refund_debit, refund_credit) =
            LedgerRepository::insert_transfer(&txn, &ids, &plan, &refund_utr).await?;

        Self::settle(
            txn,
            &refund_utr,
            Settlement {
                debit: Some((master.id, amount)),
                credit: Some((payer.id, amount)),
                statuses: vec![
                    (refund_debit.id, EntryStatus::Success),
                    (refund_credit.id, EntryStatus::Success),
                ],
                settle_utrs: vec![refund_utr.clone(), utr.to_string()],
                on_failure: vec![refund_debit.id, refund_credit.id],
                ..Settlement::default()
            },
        )
        .await?;

        info!(utr = %refund_utr, original_utr = %utr, wallet = %payer.account_no, amount = %amount, "Direct refund completed");
        self.receipt(
            WorkflowKind::DirectRefund,
            refund_utr,
            WorkflowStage::Completed,
            &[refund_debit.id, refund_credit.id],
        )
        .await
    }
}
