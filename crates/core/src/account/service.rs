//! Wallet account rules.

use rust_decimal::Decimal;
use ledgerloop_shared::types::TenantId;

use crate::account::error::AccountError;
use crate::account::types::{WalletRole, WalletState};

/// Stateless service for wallet preconditions.
pub struct AccountService;

impl AccountService {
    /// Checks that a wallet may take part in an operation.
    ///
    /// # Returns
    /// * `Err(AccountError::NotFound)` if the wallet is deleted or belongs to another tenant
    /// * `Err(AccountError::WrongRole)` if the role does not match
    /// * `Err(AccountError::Disabled)` if the wallet is disabled
    pub fn ensure_usable(
        wallet: &WalletState,
        role: WalletRole,
        tenant: Option<TenantId>,
    ) -> Result<(), AccountError> {
        if wallet.deleted {
            return Err(AccountError::NotFound(wallet.account_no.clone()));
        }
        if tenant.is_some_and(|tenant| tenant != wallet.tenant_id) {
            return Err(AccountError::NotFound(wallet.account_no.clone()));
        }
        if wallet.role != role {
            return Err(AccountError::WrongRole {
                account_no: wallet.account_no.clone(),
                expected: role,
                actual: wallet.role,
            });
        }
        if !wallet.enabled {
            return Err(AccountError::Disabled(wallet.account_no.clone()));
        }
        Ok(())
    }

    /// Checks that the cached balance covers `amount`.
    pub fn ensure_sufficient(wallet: &WalletState, amount: Decimal) -> Result<(), AccountError> {
        if wallet.balance < amount {
            return Err(AccountError::InsufficientFunds {
                available: wallet.balance,
                requested: amount,
            });
        }
        Ok(())
    }

    /// Checks that two wallets can exchange money.
    pub fn ensure_same_currency(a: &WalletState, b: &WalletState) -> Result<(), AccountError> {
        if a.currency != b.currency {
            return Err(AccountError::CurrencyMismatch(
                a.currency.clone(),
                b.currency.clone(),
            ));
        }
        Ok(())
    }

    /// Checks that a wallet can be soft-deleted.
    pub fn ensure_closable(wallet: &WalletState) -> Result<(), AccountError> {
        if wallet.deleted {
            return Err(AccountError::NotFound(wallet.account_no.clone()));
        }
        if !wallet.balance.is_zero() {
            return Err(AccountError::BalanceNotZero {
                account_no: wallet.account_no.clone(),
                balance: wallet.balance,
            });
        }
        Ok(())
    }
}
