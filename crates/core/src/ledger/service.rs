//! Ledger service for entry planning and pair validation.
//!
//! Nothing here touches storage: the service turns caller input into
//! [`EntryDraft`]s and [`TransferPlan`]s that the store persists verbatim.

use std::str::FromStr;

use rust_decimal::Decimal;
use ledgerloop_shared::types::{Currency, Money, WalletId};

use crate::ledger::error::LedgerError;
use crate::ledger::types::{EntryDraft, EntrySide, EntrySnapshot, EntryType, TransferPlan};

/// Stateless service for building and checking ledger entries.
pub struct LedgerService;

impl LedgerService {
    /// Validates and rounds an amount.
    ///
    /// # Returns
    /// * `Ok(amount)` rounded to two decimals
    /// * `Err(LedgerError::NonPositiveAmount)` if the rounded amount is not positive
    /// * `Err(LedgerError::AmountOutOfRange)` if it cannot be stored
    pub fn validate_amount(amount: Decimal) -> Result<Decimal, LedgerError> {
        let rounded = Money::round(amount);
        if rounded <= Decimal::ZERO {
            return Err(LedgerError::NonPositiveAmount(amount));
        }
        Money::to_minor(rounded).map_err(|_| LedgerError::AmountOutOfRange(amount))?;
        Ok(rounded)
    }

    /// Parses a currency code into its canonical form.
    pub fn validate_currency(code: &str) -> Result<Currency, LedgerError> {
        Currency::from_str(code).map_err(|_| LedgerError::InvalidCurrency(code.to_string()))
    }

    /// Builds the description stored on an entry, e.g. `WITHDRAW:CREDIT : rejected`.
    #[must_use]
    pub fn describe(entry_type: EntryType, note: &str) -> String {
        let note = note.trim();
        if note.is_empty() {
            entry_type.as_str().to_string()
        } else {
            format!("{entry_type} : {note}")
        }
    }

    /// Plans a single entry.
    pub fn plan_entry(
        wallet_id: WalletId,
        amount: Decimal,
        currency: &str,
        entry_type: EntryType,
        note: &str,
        related_utr: Option<String>,
    ) -> Result<EntryDraft, LedgerError> {
        let amount = Self::validate_amount(amount)?;
        let currency = Self::validate_currency(currency)?;

        Ok(EntryDraft {
            wallet_id,
            amount,
            currency: currency.as_str().to_string(),
            entry_type,
            description: Self::describe(entry_type, note),
            related_utr,
        })
    }

    /// Plans a debit/credit pair moving `amount` from `source` to `dest`.
    ///
    /// # Returns
    /// * `Ok(TransferPlan)` with equal amount and currency on both sides
    /// * `Err(LedgerError::SameWallet)` if `source == dest`
    /// * `Err(LedgerError::MismatchedPair)` if the types are not counterparts
    #[allow(clippy::too_many_arguments)]
    pub fn plan_transfer(
        source: WalletId,
        dest: WalletId,
        amount: Decimal,
        currency: &str,
        note: &str,
        debit_type: EntryType,
        credit_type: EntryType,
        related_utr: Option<String>,
    ) -> Result<TransferPlan, LedgerError> {
        if debit_type.side() != EntrySide::Debit || debit_type.counterpart() != credit_type {
            return Err(LedgerError::MismatchedPair {
                debit: debit_type,
                credit: credit_type,
            });
        }
        if source == dest {
            return Err(LedgerError::SameWallet);
        }

        let debit = Self::plan_entry(
            source,
            amount,
            currency,
            debit_type,
            note,
            related_utr.clone(),
        )?;
        let credit = Self::plan_entry(dest, amount, currency, credit_type, note, related_utr)?;

        Ok(TransferPlan { debit, credit })
    }

    /// Checks that two persisted entries form a valid transfer pair.
    pub fn verify_pair(debit: &EntrySnapshot, credit: &EntrySnapshot) -> Result<(), LedgerError> {
        if debit.entry_type.counterpart() != credit.entry_type || !debit.entry_type.is_debit() {
            return Err(LedgerError::MismatchedPair {
                debit: debit.entry_type,
                credit: credit.entry_type,
            });
        }
        if debit.utr != credit.utr {
            return Err(LedgerError::PairMismatch(format!(
                "UTR {} does not match {}",
                debit.utr, credit.utr
            )));
        }
        if debit.amount != credit.amount {
            return Err(LedgerError::PairMismatch(format!(
                "amount {} does not match {}",
                debit.amount, credit.amount
            )));
        }
        if debit.currency != credit.currency {
            return Err(LedgerError::PairMismatch(format!(
                "currency {} does not match {}",
                debit.currency, credit.currency
            )));
        }
        if debit.wallet_id == credit.wallet_id {
            return Err(LedgerError::SameWallet);
        }
        Ok(())
    }
}
