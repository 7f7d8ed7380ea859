//! Property-based tests for ledger planning and balance derivation.

use proptest::prelude::*;
use rust_decimal::Decimal;
use ledgerloop_shared::types::WalletId;
use uuid::Uuid;

use crate::ledger::balance::{balance_effect, derive_balance};
use crate::ledger::service::LedgerService;
use crate::ledger::types::{EntryStatus, EntryType};

/// Strategy for positive two-decimal amounts up to 1,000,000.00.
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000).prop_map(|minor| Decimal::new(minor, 2))
}

fn arb_wallet() -> impl Strategy<Value = WalletId> {
    any::<u128>().prop_map(|n| WalletId::from_uuid(Uuid::from_u128(n)))
}

fn arb_pair_types() -> impl Strategy<Value = (EntryType, EntryType)> {
    prop_oneof![
        Just((EntryType::Debit, EntryType::Credit)),
        Just((EntryType::RefundDebit, EntryType::RefundCredit)),
        Just((EntryType::WithdrawDebit, EntryType::WithdrawCredit)),
    ]
}

fn arb_entry_type() -> impl Strategy<Value = EntryType> {
    prop::sample::select(EntryType::ALL.to_vec())
}

fn arb_status() -> impl Strategy<Value = EntryStatus> {
    prop::sample::select(EntryStatus::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Both sides of a planned transfer carry the same amount and currency.
    #[test]
    fn prop_transfer_sides_match(
        source in arb_wallet(),
        dest in arb_wallet(),
        amount in arb_amount(),
        (debit_type, credit_type) in arb_pair_types(),
    ) {
        prop_assume!(source != dest);
        let plan = LedgerService::plan_transfer(
            source, dest, amount, "INR", "prop", debit_type, credit_type, None,
        ).unwrap();

        prop_assert_eq!(plan.debit.amount, plan.credit.amount);
        prop_assert_eq!(&plan.debit.currency, &plan.credit.currency);
        prop_assert_eq!(plan.debit.wallet_id, source);
        prop_assert_eq!(plan.credit.wallet_id, dest);
    }

    /// A completed pair moves money without creating or destroying any.
    #[test]
    fn prop_completed_pair_is_zero_sum(
        amount in arb_amount(),
        debit_status in prop_oneof![Just(EntryStatus::Success), Just(EntryStatus::Approved)],
    ) {
        let debit = balance_effect(EntryType::Debit, debit_status, amount);
        let credit = balance_effect(EntryType::Credit, EntryStatus::Success, amount);
        prop_assert_eq!(debit + credit, Decimal::ZERO);

        let refund_debit = balance_effect(EntryType::RefundDebit, debit_status, amount);
        let refund_credit = balance_effect(EntryType::RefundCredit, EntryStatus::Success, amount);
        prop_assert_eq!(refund_debit + refund_credit, Decimal::ZERO);
    }

    /// Debit-side entries never increase a balance and credits never decrease one.
    #[test]
    fn prop_effect_sign_follows_side(
        entry_type in arb_entry_type(),
        status in arb_status(),
        amount in arb_amount(),
    ) {
        let effect = balance_effect(entry_type, status, amount);
        if entry_type.is_debit() {
            prop_assert!(effect <= Decimal::ZERO);
        } else {
            prop_assert!(effect >= Decimal::ZERO);
        }
        prop_assert!(effect.abs() == amount || effect.is_zero());
    }

    /// Failed entries never affect a balance.
    #[test]
    fn prop_failure_has_no_effect(entry_type in arb_entry_type(), amount in arb_amount()) {
        prop_assert_eq!(balance_effect(entry_type, EntryStatus::Failure, amount), Decimal::ZERO);
    }

    /// Deposits followed by a withdrawal that is rejected leave the balance unchanged.
    #[test]
    fn prop_rejected_withdrawal_restores_balance(
        deposit in arb_amount(),
        withdrawal in arb_amount(),
    ) {
        prop_assume!(withdrawal <= deposit);
        let history = vec![
            (EntryType::Credit, EntryStatus::Success, deposit),
            (EntryType::WithdrawDebit, EntryStatus::Rejected, withdrawal),
            (EntryType::WithdrawCredit, EntryStatus::Success, withdrawal),
        ];
        prop_assert_eq!(derive_balance(history), deposit);
    }

    /// Non-positive amounts never produce an entry.
    #[test]
    fn prop_non_positive_amount_rejected(minor in -100_000i64..=0) {
        let amount = Decimal::new(minor, 2);
        prop_assert!(LedgerService::validate_amount(amount).is_err());
    }
}
