//! Integration tests for the wallet flows against SQLite.

mod common;

use std::future::Future;
use std::pin::pin;
use std::task::Poll;

use rust_decimal_macros::dec;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use common::{bank, setup};
use ledgerloop_core::ledger::EntryType;
use ledgerloop_core::workflow::{Decision, WorkflowError, WorkflowKind, WorkflowStage};
use ledgerloop_db::entities::ledger_entries;
use ledgerloop_db::entities::sea_orm_active_enums::{EntryStatus, EntryType as DbEntryType};
use ledgerloop_db::{
    DepositRequest, LedgerRepository, PaymentRequest, RefundRequest, ReviewRequest,
    WithdrawalRequest,
};

fn payment(f: &common::Fixture, amount: rust_decimal::Decimal) -> PaymentRequest {
    PaymentRequest {
        tenant: f.tenant,
        account_no: f.wallet_no(),
        amount,
        description: "order 42".to_string(),
    }
}

fn withdrawal(f: &common::Fixture, amount: rust_decimal::Decimal) -> WithdrawalRequest {
    WithdrawalRequest {
        tenant: f.tenant,
        account_no: f.wallet_no(),
        amount,
        description: "cash out".to_string(),
        bank: bank(None),
    }
}

/// Polls `fut` at most `polls` times, then drops it.
async fn poll_then_drop<F: Future>(fut: F, polls: usize) -> Option<F::Output> {
    let mut fut = pin!(fut);
    for _ in 0..polls {
        let step = std::future::poll_fn(|cx| Poll::Ready(fut.as_mut().poll(cx))).await;
        if let Poll::Ready(output) = step {
            return Some(output);
        }
        tokio::task::yield_now().await;
    }
    None
}

async fn pending_entries(f: &common::Fixture) -> Vec<ledger_entries::Model> {
    ledger_entries::Entity::find()
        .filter(ledger_entries::Column::Status.eq(EntryStatus::Pending))
        .all(&f.db)
        .await
        .expect("query failed")
}

#[tokio::test]
async fn test_deposit_credits_wallet() {
    let f = setup().await;

    let receipt = f.deposit(dec!(500.00), "NEFT001").await;

    assert_eq!(receipt.kind, WorkflowKind::Deposit);
    assert_eq!(receipt.stage, WorkflowStage::Completed);
    assert_eq!(receipt.entries.len(), 1);
    let credit = &receipt.entries[0];
    assert_eq!(credit.entry_type, DbEntryType::Credit);
    assert_eq!(credit.status, EntryStatus::Success);
    assert_eq!(credit.amount_minor, 50_000);
    assert_eq!(credit.utr, receipt.utr);
    assert!(credit.bank_reference_id.is_some());
    assert_eq!(credit.description, "CREDIT : top up");

    assert_eq!(f.balance(f.wallet_id()).await, dec!(500.00));
    f.assert_reconciled().await;
}

#[tokio::test]
async fn test_deposit_encrypts_bank_account_number() {
    let f = setup().await;
    let receipt = f.deposit(dec!(10), "NEFT001").await;

    let reference_id = receipt.entries[0]
        .bank_reference_id
        .expect("deposit should reference its bank transfer");
    let reference = ledgerloop_db::BankRepository::new(f.db.clone())
        .find_by_id(reference_id)
        .await
        .expect("lookup failed")
        .expect("reference should exist");

    assert_ne!(reference.account_no, "123456789012");
    assert_eq!(reference.utr_no.as_deref(), Some("NEFT001"));
}

#[tokio::test]
async fn test_deposit_with_processed_utr_is_conflict() {
    let f = setup().await;
    f.deposit(dec!(500.00), "NEFT001").await;
    let entries_before = f.entry_count().await;
    let references_before = f.bank_reference_count().await;

    let result = f
        .engine
        .deposit(DepositRequest {
            tenant: f.tenant,
            account_no: f.wallet_no(),
            amount: dec!(500.00),
            description: String::new(),
            bank: bank(Some(" neft001 ")),
        })
        .await;

    assert!(matches!(result, Err(WorkflowError::Conflict(msg)) if msg == "UTR already processed"));
    assert_eq!(f.balance(f.wallet_id()).await, dec!(500.00));
    assert_eq!(f.entry_count().await, entries_before);
    assert_eq!(f.bank_reference_count().await, references_before);
}

#[tokio::test]
async fn test_deposit_requires_bank_utr() {
    let f = setup().await;

    let result = f
        .engine
        .deposit(DepositRequest {
            tenant: f.tenant,
            account_no: f.wallet_no(),
            amount: dec!(10),
            description: String::new(),
            bank: bank(None),
        })
        .await;

    assert!(matches!(result, Err(WorkflowError::Validation(_))));
    assert_eq!(f.entry_count().await, 0);
}

#[tokio::test]
async fn test_deposit_rejects_non_positive_amount() {
    let f = setup().await;

    let result = f
        .engine
        .deposit(DepositRequest {
            tenant: f.tenant,
            account_no: f.wallet_no(),
            amount: dec!(0.004),
            description: String::new(),
            bank: bank(Some("NEFT9")),
        })
        .await;

    assert!(matches!(result, Err(WorkflowError::Validation(_))));
    assert_eq!(f.bank_reference_count().await, 0);
}

#[tokio::test]
async fn test_deposit_to_master_is_invalid_state() {
    let f = setup().await;

    let result = f
        .engine
        .deposit(DepositRequest {
            tenant: f.tenant,
            account_no: f.master.wallet.account_no.clone(),
            amount: dec!(10),
            description: String::new(),
            bank: bank(Some("NEFT1")),
        })
        .await;

    assert!(matches!(result, Err(WorkflowError::InvalidState(_))));
}

#[tokio::test]
async fn test_pay_to_master_moves_both_balances() {
    let f = setup().await;
    f.deposit(dec!(500.00), "NEFT001").await;

    let receipt = f
        .engine
        .pay_to_master(payment(&f, dec!(120.50)))
        .await
        .expect("payment failed");

    assert_eq!(receipt.stage, WorkflowStage::Completed);
    assert_eq!(receipt.entries.len(), 2);
    assert!(receipt.entries.iter().all(|e| e.utr == receipt.utr));
    assert!(receipt.entries.iter().all(|e| e.status == EntryStatus::Success));
    assert!(receipt.entries.iter().all(|e| e.amount_minor == 12_050));

    assert_eq!(f.balance(f.wallet_id()).await, dec!(379.50));
    assert_eq!(f.balance(f.master_id()).await, dec!(120.50));
    f.assert_reconciled().await;
}

#[tokio::test]
async fn test_pay_to_master_insufficient_funds_creates_nothing() {
    let f = setup().await;
    f.deposit(dec!(50.00), "NEFT001").await;
    let before = f.entry_count().await;

    let result = f.engine.pay_to_master(payment(&f, dec!(50.01))).await;

    assert!(matches!(
        result,
        Err(WorkflowError::InsufficientFunds { available, requested })
            if available == dec!(50.00) && requested == dec!(50.01)
    ));
    assert_eq!(f.entry_count().await, before);
    assert_eq!(f.balance(f.wallet_id()).await, dec!(50.00));
}

#[tokio::test]
async fn test_payment_request_then_approve() {
    let f = setup().await;
    f.deposit(dec!(500.00), "NEFT001").await;

    let request = f
        .engine
        .request_payment(payment(&f, dec!(200.00)))
        .await
        .expect("request failed");
    assert_eq!(request.stage, WorkflowStage::AwaitingApproval);
    assert_eq!(request.entries[0].status, EntryStatus::Pending);
    assert_eq!(f.balance(f.wallet_id()).await, dec!(500.00));

    let review = f
        .engine
        .review_payment(ReviewRequest::new(f.tenant, &request.utr, Decision::Approved))
        .await
        .expect("approval failed");

    assert_eq!(review.stage, WorkflowStage::Completed);
    assert_eq!(f.balance(f.wallet_id()).await, dec!(300.00));
    assert_eq!(f.balance(f.master_id()).await, dec!(200.00));

    let entries = LedgerRepository::new(f.db.clone())
        .entries_for_utr(&request.utr)
        .await
        .expect("lookup failed");
    assert_eq!(entries.len(), 2);
    let debit = entries
        .iter()
        .find(|e| e.entry_type == DbEntryType::Debit)
        .expect("debit");
    let credit = entries
        .iter()
        .find(|e| e.entry_type == DbEntryType::Credit)
        .expect("credit");
    assert_eq!(debit.status, EntryStatus::Approved);
    assert_eq!(credit.status, EntryStatus::Success);
    assert_eq!(credit.wallet_id, f.master.wallet.id);
    f.assert_reconciled().await;
}

#[tokio::test]
async fn test_payment_request_for_more_than_balance_creates_nothing() {
    let f = setup().await;
    f.deposit(dec!(100.00), "NEFT001").await;
    let before = f.entry_count().await;

    let result = f.engine.request_payment(payment(&f, dec!(100.01))).await;

    assert!(matches!(result, Err(WorkflowError::InsufficientFunds { .. })));
    assert!(result.unwrap_err().is_conflict());
    assert_eq!(f.entry_count().await, before);
}

#[tokio::test]
async fn test_payment_request_rejected() {
    let f = setup().await;
    f.deposit(dec!(100.00), "NEFT001").await;
    let request = f
        .engine
        .request_payment(payment(&f, dec!(40.00)))
        .await
        .expect("request failed");

    let review = f
        .engine
        .review_payment(ReviewRequest::new(f.tenant, &request.utr, Decision::Rejected))
        .await
        .expect("rejection failed");

    assert_eq!(review.stage, WorkflowStage::Rejected);
    assert_eq!(review.entries[0].status, EntryStatus::Rejected);
    assert_eq!(f.balance(f.wallet_id()).await, dec!(100.00));
    assert_eq!(f.balance(f.master_id()).await, dec!(0));
    f.assert_reconciled().await;
}

#[tokio::test]
async fn test_reviewed_payment_cannot_be_reviewed_again() {
    let f = setup().await;
    f.deposit(dec!(100.00), "NEFT001").await;
    let request = f
        .engine
        .request_payment(payment(&f, dec!(40.00)))
        .await
        .expect("request failed");
    f.engine
        .review_payment(ReviewRequest::new(f.tenant, &request.utr, Decision::Approved))
        .await
        .expect("approval failed");

    for decision in [Decision::Approved, Decision::Rejected] {
        let again = f
            .engine
            .review_payment(ReviewRequest::new(f.tenant, &request.utr, decision))
            .await;
        assert!(matches!(again, Err(WorkflowError::Conflict(_))));
    }
    assert_eq!(f.balance(f.wallet_id()).await, dec!(60.00));
    assert_eq!(f.balance(f.master_id()).await, dec!(40.00));
}

#[tokio::test]
async fn test_payment_approval_fails_when_funds_were_spent() {
    let f = setup().await;
    f.deposit(dec!(100.00), "NEFT001").await;
    let request = f
        .engine
        .request_payment(payment(&f, dec!(80.00)))
        .await
        .expect("request failed");
    f.engine
        .pay_to_master(payment(&f, dec!(50.00)))
        .await
        .expect("payment failed");

    let result = f
        .engine
        .review_payment(ReviewRequest::new(f.tenant, &request.utr, Decision::Approved))
        .await;

    assert!(matches!(result, Err(WorkflowError::InsufficientFunds { .. })));
    let debit = LedgerRepository::new(f.db.clone())
        .entries_for_utr(&request.utr)
        .await
        .expect("lookup failed");
    assert_eq!(debit.len(), 1);
    assert_eq!(debit[0].status, EntryStatus::Pending);
    f.assert_reconciled().await;
}

#[tokio::test]
async fn test_review_from_other_tenant_is_not_found() {
    let f = setup().await;
    f.deposit(dec!(100.00), "NEFT001").await;
    let request = f
        .engine
        .request_payment(payment(&f, dec!(10.00)))
        .await
        .expect("request failed");

    let other = f
        .tenants
        .create(ledgerloop_db::repositories::NewTenant {
            name: "Other".to_string(),
            key: "other".to_string(),
            account_prefix: "OTH".to_string(),
        })
        .await
        .expect("tenant creation failed");
    let result = f
        .engine
        .review_payment(ReviewRequest::new(
            ledgerloop_shared::types::TenantId::from_uuid(other.tenant.id),
            &request.utr,
            Decision::Approved,
        ))
        .await;

    assert!(matches!(result, Err(WorkflowError::NotFound(_))));
}

#[tokio::test]
async fn test_refund_request_and_approval_settles_both_utrs() {
    let f = setup().await;
    f.deposit(dec!(500.00), "NEFT001").await;
    let paid = f
        .engine
        .pay_to_master(payment(&f, dec!(200.00)))
        .await
        .expect("payment failed");

    let refund = f
        .engine
        .request_refund(RefundRequest {
            tenant: f.tenant,
            account_no: f.wallet_no(),
            original_utr: paid.utr.clone(),
            description: "damaged".to_string(),
        })
        .await
        .expect("refund request failed");
    assert_eq!(refund.stage, WorkflowStage::AwaitingApproval);
    let refund_debit = &refund.entries[0];
    assert_eq!(refund_debit.entry_type, DbEntryType::RefundDebit);
    assert_eq!(refund_debit.wallet_id, f.master.wallet.id);
    assert_eq!(refund_debit.related_utr.as_deref(), Some(paid.utr.as_str()));
    assert_ne!(refund.utr, paid.utr);

    f.engine
        .review_refund(ReviewRequest::new(f.tenant, &refund.utr, Decision::Approved))
        .await
        .expect("refund approval failed");

    assert_eq!(f.balance(f.wallet_id()).await, dec!(500.00));
    assert_eq!(f.balance(f.master_id()).await, dec!(0));

    let ledger = LedgerRepository::new(f.db.clone());
    for utr in [&paid.utr, &refund.utr] {
        let entries = ledger.entries_for_utr(utr).await.expect("lookup failed");
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.settled), "{utr} should be settled");
    }
    let refund_entries = ledger
        .entries_for_utr(&refund.utr)
        .await
        .expect("lookup failed");
    assert!(refund_entries.iter().any(|e| e.entry_type == DbEntryType::RefundDebit
        && e.status == EntryStatus::Approved));
    assert!(refund_entries.iter().any(|e| e.entry_type == DbEntryType::RefundCredit
        && e.status == EntryStatus::Success
        && e.wallet_id == f.wallet.wallet.id));
    f.assert_reconciled().await;
}

#[tokio::test]
async fn test_settled_payment_cannot_be_refunded_again() {
    let f = setup().await;
    f.deposit(dec!(500.00), "NEFT001").await;
    let paid = f
        .engine
        .pay_to_master(payment(&f, dec!(200.00)))
        .await
        .expect("payment failed");
    f.engine
        .direct_refund(f.tenant, &paid.utr, "goodwill")
        .await
        .expect("direct refund failed");

    let by_request = f
        .engine
        .request_refund(RefundRequest {
            tenant: f.tenant,
            account_no: f.wallet_no(),
            original_utr: paid.utr.clone(),
            description: String::new(),
        })
        .await;
    assert!(matches!(by_request, Err(WorkflowError::Conflict(_))));

    let direct = f.engine.direct_refund(f.tenant, &paid.utr, "again").await;
    assert!(matches!(direct, Err(WorkflowError::Conflict(_))));

    assert_eq!(f.balance(f.wallet_id()).await, dec!(500.00));
    assert_eq!(f.balance(f.master_id()).await, dec!(0));
    f.assert_reconciled().await;
}

#[tokio::test]
async fn test_second_refund_request_while_pending_is_conflict() {
    let f = setup().await;
    f.deposit(dec!(500.00), "NEFT001").await;
    let paid = f
        .engine
        .pay_to_master(payment(&f, dec!(100.00)))
        .await
        .expect("payment failed");
    let request = RefundRequest {
        tenant: f.tenant,
        account_no: f.wallet_no(),
        original_utr: paid.utr.clone(),
        description: String::new(),
    };
    f.engine
        .request_refund(request.clone())
        .await
        .expect("first request failed");

    let second = f.engine.request_refund(request).await;
    assert!(matches!(second, Err(WorkflowError::Conflict(_))));

    let direct = f.engine.direct_refund(f.tenant, &paid.utr, "").await;
    assert!(matches!(direct, Err(WorkflowError::Conflict(_))));
}

#[tokio::test]
async fn test_rejected_refund_can_be_requested_again() {
    let f = setup().await;
    f.deposit(dec!(500.00), "NEFT001").await;
    let paid = f
        .engine
        .pay_to_master(payment(&f, dec!(100.00)))
        .await
        .expect("payment failed");
    let request = RefundRequest {
        tenant: f.tenant,
        account_no: f.wallet_no(),
        original_utr: paid.utr.clone(),
        description: String::new(),
    };
    let first = f
        .engine
        .request_refund(request.clone())
        .await
        .expect("first request failed");
    f.engine
        .review_refund(ReviewRequest::new(f.tenant, &first.utr, Decision::Rejected))
        .await
        .expect("rejection failed");

    let second = f.engine.request_refund(request).await;
    assert!(second.is_ok());
    assert_eq!(f.balance(f.master_id()).await, dec!(100.00));
}

#[tokio::test]
async fn test_refund_of_pending_payment_is_invalid_state() {
    let f = setup().await;
    f.deposit(dec!(500.00), "NEFT001").await;
    let pending = f
        .engine
        .request_payment(payment(&f, dec!(100.00)))
        .await
        .expect("request failed");

    let result = f
        .engine
        .request_refund(RefundRequest {
            tenant: f.tenant,
            account_no: f.wallet_no(),
            original_utr: pending.utr.clone(),
            description: String::new(),
        })
        .await;

    assert!(matches!(result, Err(WorkflowError::InvalidState(_))));
}

#[tokio::test]
async fn test_refund_needs_enabled_master() {
    let f = setup().await;
    f.deposit(dec!(500.00), "NEFT001").await;
    let paid = f
        .engine
        .pay_to_master(payment(&f, dec!(100.00)))
        .await
        .expect("payment failed");
    let refund = f
        .engine
        .request_refund(RefundRequest {
            tenant: f.tenant,
            account_no: f.wallet_no(),
            original_utr: paid.utr.clone(),
            description: String::new(),
        })
        .await
        .expect("refund request failed");

    let second = f
        .engine
        .pay_to_master(payment(&f, dec!(10.00)))
        .await
        .expect("payment failed");
    f.engine
        .update_account(
            f.tenant,
            &f.master.wallet.account_no,
            ledgerloop_core::account::AccountUpdate {
                enabled: Some(false),
                account_type: None,
            },
        )
        .await
        .expect("update failed");

    let result = f
        .engine
        .review_refund(ReviewRequest::new(f.tenant, &refund.utr, Decision::Approved))
        .await;
    assert!(matches!(result, Err(WorkflowError::Forbidden(_))));
    let direct = f.engine.direct_refund(f.tenant, &second.utr, "").await;
    assert!(matches!(direct, Err(WorkflowError::Forbidden(_))));
    f.assert_reconciled().await;
}

#[tokio::test]
async fn test_direct_refund_pair() {
    let f = setup().await;
    f.deposit(dec!(300.00), "NEFT001").await;
    let paid = f
        .engine
        .pay_to_master(payment(&f, dec!(75.25)))
        .await
        .expect("payment failed");

    let refund = f
        .engine
        .direct_refund(f.tenant, &paid.utr, "goodwill")
        .await
        .expect("direct refund failed");

    assert_eq!(refund.kind, WorkflowKind::DirectRefund);
    assert_eq!(refund.entries.len(), 2);
    for entry in &refund.entries {
        assert_eq!(entry.status, EntryStatus::Success);
        assert_eq!(entry.amount_minor, 7_525);
        assert_eq!(entry.related_utr.as_deref(), Some(paid.utr.as_str()));
        assert!(entry.settled);
    }
    let types: Vec<EntryType> = refund.entries.iter().map(|e| e.entry_type.into()).collect();
    assert!(types.contains(&EntryType::RefundDebit));
    assert!(types.contains(&EntryType::RefundCredit));

    assert_eq!(f.balance(f.wallet_id()).await, dec!(300.00));
    assert_eq!(f.balance(f.master_id()).await, dec!(0));
    f.assert_reconciled().await;
}

#[tokio::test]
async fn test_withdrawal_holds_funds_then_reject_returns_them() {
    let f = setup().await;
    f.deposit(dec!(100.00), "NEFT001").await;

    let request = f
        .engine
        .request_withdrawal(withdrawal(&f, dec!(100.00)))
        .await
        .expect("withdrawal request failed");

    assert_eq!(request.stage, WorkflowStage::AwaitingApproval);
    assert_eq!(request.entries[0].entry_type, DbEntryType::WithdrawDebit);
    assert_eq!(request.entries[0].status, EntryStatus::Pending);
    assert_eq!(f.balance(f.wallet_id()).await, dec!(0));
    f.assert_reconciled().await;

    let review = f
        .engine
        .review_withdrawal(ReviewRequest::new(f.tenant, &request.utr, Decision::Rejected))
        .await
        .expect("rejection failed");

    assert_eq!(review.stage, WorkflowStage::Rejected);
    assert_eq!(f.balance(f.wallet_id()).await, dec!(100.00));
    let debit = review
        .entries
        .iter()
        .find(|e| e.entry_type == DbEntryType::WithdrawDebit)
        .expect("debit");
    let credit = review
        .entries
        .iter()
        .find(|e| e.entry_type == DbEntryType::WithdrawCredit)
        .expect("credit");
    assert_eq!(debit.status, EntryStatus::Rejected);
    assert_eq!(credit.status, EntryStatus::Success);
    assert_ne!(credit.utr, request.utr);
    assert_eq!(credit.related_utr.as_deref(), Some(request.utr.as_str()));
    f.assert_reconciled().await;
}

#[tokio::test]
async fn test_withdrawal_approval_records_bank_utr() {
    let f = setup().await;
    f.deposit(dec!(100.00), "NEFT001").await;
    let request = f
        .engine
        .request_withdrawal(withdrawal(&f, dec!(60.00)))
        .await
        .expect("withdrawal request failed");

    let missing = f
        .engine
        .review_withdrawal(ReviewRequest::new(f.tenant, &request.utr, Decision::Approved))
        .await;
    assert!(matches!(missing, Err(WorkflowError::Validation(_))));

    let taken = f
        .engine
        .review_withdrawal(
            ReviewRequest::new(f.tenant, &request.utr, Decision::Approved)
                .with_bank_utr_no("NEFT001"),
        )
        .await;
    assert!(matches!(taken, Err(WorkflowError::Conflict(_))));

    let review = f
        .engine
        .review_withdrawal(
            ReviewRequest::new(f.tenant, &request.utr, Decision::Approved)
                .with_bank_utr_no("payout77"),
        )
        .await
        .expect("approval failed");

    assert_eq!(review.stage, WorkflowStage::Completed);
    assert_eq!(review.entries[0].status, EntryStatus::Approved);
    assert_eq!(f.balance(f.wallet_id()).await, dec!(40.00));

    let reference = ledgerloop_db::BankRepository::new(f.db.clone())
        .find_by_id(review.entries[0].bank_reference_id.expect("bank reference"))
        .await
        .expect("lookup failed")
        .expect("reference should exist");
    assert_eq!(reference.utr_no.as_deref(), Some("PAYOUT77"));

    let again = f
        .engine
        .review_withdrawal(ReviewRequest::new(f.tenant, &request.utr, Decision::Rejected))
        .await;
    assert!(matches!(again, Err(WorkflowError::Conflict(_))));
    f.assert_reconciled().await;
}

#[tokio::test]
async fn test_withdrawal_beyond_balance_creates_nothing() {
    let f = setup().await;
    f.deposit(dec!(10.00), "NEFT001").await;
    let entries = f.entry_count().await;
    let references = f.bank_reference_count().await;

    let result = f
        .engine
        .request_withdrawal(withdrawal(&f, dec!(10.01)))
        .await;

    assert!(matches!(result, Err(WorkflowError::InsufficientFunds { .. })));
    assert_eq!(f.entry_count().await, entries);
    assert_eq!(f.bank_reference_count().await, references);
}

#[tokio::test]
async fn test_disabled_wallet_is_forbidden() {
    let f = setup().await;
    f.deposit(dec!(10.00), "NEFT001").await;
    f.engine
        .update_account(
            f.tenant,
            &f.wallet_no(),
            ledgerloop_core::account::AccountUpdate {
                enabled: Some(false),
                account_type: None,
            },
        )
        .await
        .expect("update failed");

    let result = f.engine.pay_to_master(payment(&f, dec!(1.00))).await;
    assert!(matches!(result, Err(WorkflowError::Forbidden(_))));
}

#[tokio::test]
async fn test_unknown_utr_is_not_found() {
    let f = setup().await;

    let result = f
        .engine
        .review_payment(ReviewRequest::new(f.tenant, "NOPE", Decision::Approved))
        .await;
    assert!(matches!(result, Err(WorkflowError::NotFound(_))));

    let result = f.engine.entries_for_utr("NOPE").await;
    assert!(matches!(result, Err(WorkflowError::NotFound(_))));
}

#[tokio::test]
async fn test_cancelled_withdrawal_request_never_strands_a_debit() {
    for polls in 1..=8 {
        let f = setup().await;
        f.deposit(dec!(100.00), "NEFT001").await;

        poll_then_drop(
            f.engine.request_withdrawal(withdrawal(&f, dec!(100.00))),
            polls,
        )
        .await;
        tokio::task::yield_now().await;

        let pending = pending_entries(&f).await;
        match pending.as_slice() {
            [] => {
                assert_eq!(f.balance(f.wallet_id()).await, dec!(100.00));
            }
            [debit] => {
                assert_eq!(debit.entry_type, DbEntryType::WithdrawDebit);
                assert_eq!(f.balance(f.wallet_id()).await, dec!(0));
                f.engine
                    .review_withdrawal(ReviewRequest::new(f.tenant, &debit.utr, Decision::Rejected))
                    .await
                    .expect("rejection failed");
                assert_eq!(f.balance(f.wallet_id()).await, dec!(100.00));
            }
            more => panic!("expected at most one pending entry, got {}", more.len()),
        }
        f.assert_reconciled().await;
    }
}

#[tokio::test]
async fn test_cancelled_deposit_can_be_retried() {
    for polls in 1..=8 {
        let f = setup().await;
        let request = DepositRequest {
            tenant: f.tenant,
            account_no: f.wallet_no(),
            amount: dec!(75.00),
            description: "top up".to_string(),
            bank: bank(Some("NEFT009")),
        };

        poll_then_drop(f.engine.deposit(request.clone()), polls).await;
        tokio::task::yield_now().await;
        assert!(pending_entries(&f).await.is_empty());
        let committed = f.entry_count().await == 1;
        assert_eq!(f.bank_reference_count().await, u64::from(committed));

        let retry = f.engine.deposit(request).await;
        if committed {
            assert!(matches!(retry, Err(WorkflowError::Conflict(_))));
        } else {
            retry.expect("retry after cancellation failed");
        }
        assert_eq!(f.balance(f.wallet_id()).await, dec!(75.00));
        assert_eq!(f.bank_reference_count().await, 1);
        f.assert_reconciled().await;
    }
}

#[tokio::test]
async fn test_direct_payment_is_not_reviewable() {
    let f = setup().await;
    f.deposit(dec!(50.00), "NEFT001").await;
    let paid = f
        .engine
        .pay_to_master(payment(&f, dec!(20.00)))
        .await
        .expect("payment failed");

    // Both legs back to PENDING: only the shared CREDIT tells it apart from a request.
    ledger_entries::Entity::update_many()
        .col_expr(ledger_entries::Column::Status, Expr::value(EntryStatus::Pending))
        .filter(ledger_entries::Column::Utr.eq(paid.utr.as_str()))
        .exec(&f.db)
        .await
        .expect("update failed");

    for decision in [Decision::Rejected, Decision::Approved] {
        let result = f
            .engine
            .review_payment(ReviewRequest::new(f.tenant, &paid.utr, decision))
            .await;
        assert!(matches!(result, Err(WorkflowError::Conflict(_))));
    }
    assert_eq!(pending_entries(&f).await.len(), 2);
    assert_eq!(f.balance(f.wallet_id()).await, dec!(30.00));
    assert_eq!(f.balance(f.master_id()).await, dec!(20.00));
}
