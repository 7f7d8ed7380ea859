//! Withdrawals to external bank accounts.
//!
//! Funds are held at request time: the WITHDRAW:DEBIT stays `PENDING` while
//! the wallet balance already excludes it. Rejection returns the money through
//! a WITHDRAW:CREDIT under its own UTR.

use tracing::info;

use ledgerloop_core::account::{AccountService, WalletRole};
use ledgerloop_core::bank::{BankDetails, normalize_bank_utr};
use ledgerloop_core::ledger::{EntryStatus, EntryType, LedgerService};
use ledgerloop_core::workflow::{
    Decision, WorkflowError, WorkflowKind, WorkflowService, WorkflowStage,
};
use ledgerloop_shared::types::{Money, WalletId};

use crate::repositories::{BankRepository, LedgerRepository, WalletKey, WalletRepository};

use super::mutator::Settlement;
use super::{ReviewRequest, WalletEngine, WithdrawalRequest, WorkflowReceipt};

impl WalletEngine {
    /// Holds funds for a payout and records the request.
    ///
    /// # Returns
    /// * `Ok(WorkflowReceipt)` with the `PENDING` WITHDRAW:DEBIT; the balance is already reduced
    /// * `Err(WorkflowError::InsufficientFunds)` if the wallet cannot cover the amount
    pub async fn request_withdrawal(
        &self,
        request: WithdrawalRequest,
    ) -> Result<WorkflowReceipt, WorkflowError> {
        let bank = BankDetails {
            utr_no: None,
            ..request.bank.normalized()?
        };

        let txn = self.begin().await?;
        let wallet = WalletRepository::find_for_update(
            &txn,
            WalletKey::AccountNo(&request.account_no),
            WalletRole::Regular,
            Some(request.tenant),
        )
        .await?;
        let state = WalletRepository::state(&wallet);
        let draft = LedgerService::plan_entry(
            state.id,
            request.amount,
            &wallet.currency,
            EntryType::WithdrawDebit,
            &request.description,
            None,
        )?;
        AccountService::ensure_sufficient(&state, draft.amount)?;

        let reference = BankRepository::insert(&txn, self.cipher.as_ref(), &bank).await?;
        let ids = self.allocator();
        let utr = ids.utr(&txn).await?;
        let debit =
            LedgerRepository::insert_entry(&txn, &ids, &draft, &utr, Some(reference.id)).await?;

        Self::settle(
            txn,
            &utr,
            Settlement {
                debit: Some((wallet.id, draft.amount)),
                on_failure: vec![debit.id],
                ..Settlement::default()
            },
        )
        .await?;

        info!(utr = %utr, wallet = %wallet.account_no, amount = %draft.amount, "Withdrawal requested");
        self.receipt(
            WorkflowKind::WithdrawalRequest,
            utr,
            WorkflowStage::AwaitingApproval,
            &[debit.id],
        )
        .await
    }

    /// Approves or rejects a pending withdrawal.
    ///
    /// Approval records the bank `utr_no` of the payout; no balance moves.
    /// Rejection credits the held amount back under a new UTR whose
    /// `related_utr` is the withdrawal.
    ///
    /// # Returns
    /// * `Err(WorkflowError::Validation)` if approving without a bank `utr_no`
    /// * `Err(WorkflowError::Conflict)` if already reviewed or the `utr_no` is taken
    pub async fn review_withdrawal(
        &self,
        review: ReviewRequest,
    ) -> Result<WorkflowReceipt, WorkflowError> {
        let txn = self.begin().await?;
        let debit =
            LedgerRepository::find_by_utr_and_type(&txn, &review.utr, EntryType::WithdrawDebit)
                .await?
                .ok_or_else(|| WorkflowError::NotFound(format!("Withdrawal {}", review.utr)))?;
        let wallet = WalletRepository::load(
            &txn,
            WalletKey::Id(WalletId::from_uuid(debit.wallet_id)),
            review.tenant,
        )
        .await?;
        WorkflowService::review(
            &LedgerRepository::snapshot(&debit),
            EntryType::WithdrawDebit,
            review.decision,
        )?;

        if review.decision == Decision::Approved {
            let utr_no = normalize_bank_utr(review.bank_utr_no.as_deref().unwrap_or_default())?;
            let reference_id = debit.bank_reference_id.ok_or_else(|| {
                WorkflowError::InvalidState(format!(
                    "Withdrawal {} has no bank reference",
                    review.utr
                ))
            })?;
            if BankRepository::utr_no_exists(&txn, &utr_no).await? {
                return Err(WorkflowError::Conflict("UTR already processed".to_string()));
            }

            Self::settle(
                txn,
                &review.utr,
                Settlement {
                    statuses: vec![(debit.id, EntryStatus::Approved)],
                    bank_utr: Some((reference_id, utr_no.clone())),
                    ..Settlement::default()
                },
            )
            .await?;

            info!(utr = %review.utr, utr_no = %utr_no, wallet = %wallet.account_no, "Withdrawal approved");
            return self
                .receipt(
                    WorkflowKind::WithdrawalReview,
                    review.utr,
                    WorkflowStage::Completed,
                    &[debit.id],
                )
                .await;
        }

        let amount = Money::from_minor(debit.amount_minor);
        let draft = LedgerService::plan_entry(
            WalletId::from_uuid(wallet.id),
            amount,
            &debit.currency,
            EntryType::WithdrawCredit,
            &review.description,
            Some(review.utr.clone()),
        )?;
        let ids = self.allocator();
        let credit_utr = ids.utr(&txn).await?;
        let credit = LedgerRepository::insert_entry(
            &txn,
            &ids,
            &draft,
            &credit_utr,
            debit.bank_reference_id,
        )
        .await?;

        Self::settle(
            txn,
            &credit_utr,
            Settlement {
                credit: Some((wallet.id, amount)),
                statuses: vec![
                    (debit.id, EntryStatus::Rejected),
                    (credit.id, EntryStatus::Success),
                ],
                on_failure: vec![credit.id],
                ..Settlement::default()
            },
        )
        .await?;

        info!(utr = %review.utr, refund_utr = %credit_utr, wallet = %wallet.account_no, amount = %amount, "Withdrawal rejected");
        self.receipt(
            WorkflowKind::WithdrawalReview,
            review.utr,
            WorkflowStage::Rejected,
            &[debit.id, credit.id],
        )
        .await
    }
}
