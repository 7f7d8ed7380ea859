//! Property-based tests for WorkflowService.

use proptest::prelude::*;
use rust_decimal::Decimal;
use ledgerloop_shared::types::WalletId;
use uuid::Uuid;

use crate::ledger::{EntrySnapshot, EntryStatus, EntryType};
use crate::workflow::error::WorkflowError;
use crate::workflow::service::WorkflowService;
use crate::workflow::types::Decision;

fn arb_status() -> impl Strategy<Value = EntryStatus> {
    prop::sample::select(EntryStatus::ALL.to_vec())
}

fn arb_terminal_status() -> impl Strategy<Value = EntryStatus> {
    prop_oneof![
        Just(EntryStatus::Success),
        Just(EntryStatus::Failure),
        Just(EntryStatus::Approved),
        Just(EntryStatus::Rejected),
    ]
}

fn arb_decision() -> impl Strategy<Value = Decision> {
    prop_oneof![Just(Decision::Approved), Just(Decision::Rejected)]
}

fn arb_entry_type() -> impl Strategy<Value = EntryType> {
    prop::sample::select(EntryType::ALL.to_vec())
}

fn arb_snapshot() -> impl Strategy<Value = EntrySnapshot> {
    (
        any::<u128>(),
        arb_entry_type(),
        arb_status(),
        1i64..10_000_000,
        any::<bool>(),
    )
        .prop_map(|(wallet, entry_type, status, minor, settled)| EntrySnapshot {
            wallet_id: WalletId::from_uuid(Uuid::from_u128(wallet)),
            entry_type,
            status,
            amount: Decimal::new(minor, 2),
            currency: "INR".to_string(),
            utr: "PROPUTR".to_string(),
            settled,
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// A terminal status never transitions to anything.
    #[test]
    fn prop_terminal_is_final(from in arb_terminal_status(), to in arb_status()) {
        prop_assert!(!WorkflowService::is_valid_transition(from, to));
        let is_conflict = matches!(
            WorkflowService::transition(from, to),
            Err(WorkflowError::Conflict(_))
        );
        prop_assert!(is_conflict);
    }

    /// Nothing ever returns to Pending.
    #[test]
    fn prop_no_transition_into_pending(from in arb_status()) {
        prop_assert!(!WorkflowService::is_valid_transition(from, EntryStatus::Pending));
    }

    /// Reviews succeed exactly for pending entries of the expected type.
    #[test]
    fn prop_review_only_pending(
        entry in arb_snapshot(),
        expected in arb_entry_type(),
        decision in arb_decision(),
    ) {
        let result = WorkflowService::review(&entry, expected, decision);
        let allowed = entry.entry_type == expected && entry.status == EntryStatus::Pending;
        prop_assert_eq!(result.is_ok(), allowed);
        if let Ok(status) = result {
            prop_assert!(status.is_terminal());
        }
    }

    /// A settled entry can never be refunded.
    #[test]
    fn prop_settled_never_refundable(mut entry in arb_snapshot()) {
        entry.settled = true;
        prop_assert!(WorkflowService::ensure_refundable(&entry).is_err());
    }

    /// Refundability requires a completed, unsettled payment.
    #[test]
    fn prop_refundable_iff_completed_unsettled_debit(entry in arb_snapshot()) {
        let expected = entry.entry_type == EntryType::Debit
            && entry.status.is_completed()
            && !entry.settled;
        prop_assert_eq!(WorkflowService::ensure_refundable(&entry).is_ok(), expected);
    }
}
