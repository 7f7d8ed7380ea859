//! Wallet onboarding, updates and lookups.

use serde::Serialize;
use tracing::info;

use ledgerloop_core::access::{ContactDetails, UserDirectory};
use ledgerloop_core::account::{AccountService, AccountType, AccountUpdate, WalletRole};
use ledgerloop_core::ledger::LedgerService;
use ledgerloop_core::workflow::WorkflowError;
use ledgerloop_shared::types::{Page, PageRequest, TenantId};

use crate::entities::{ledger_entries, wallet_accounts};
use crate::repositories::credentials::{generate_token, hash_token};
use crate::repositories::{LedgerRepository, NewWallet, TenantRepository, WalletKey, WalletRepository};

use super::WalletEngine;

/// A wallet together with its one-time access token.
#[derive(Debug, Clone)]
pub struct OpenedAccount {
    /// Stored wallet row.
    pub wallet: wallet_accounts::Model,
    /// Plain access token. Only its digest is stored.
    pub access_token: String,
}

/// A wallet and a page of its entries, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct Statement {
    /// Wallet row.
    pub wallet: wallet_accounts::Model,
    /// Entries on this page.
    pub entries: Page<ledger_entries::Model>,
}

impl WalletEngine {
    /// Opens the tenant's MASTER wallet.
    ///
    /// # Returns
    /// * `Err(WorkflowError::Conflict)` if the tenant already has one
    pub async fn open_master_account(
        &self,
        tenant: TenantId,
        currency: &str,
    ) -> Result<OpenedAccount, WorkflowError> {
        let currency = LedgerService::validate_currency(currency)?;

        let txn = self.begin().await?;
        if WalletRepository::find_master(&txn, tenant).await?.is_some() {
            return Err(WorkflowError::Conflict(format!(
                "Master wallet already exists for tenant {}",
                tenant.into_inner()
            )));
        }
        let number = TenantRepository::next_account_number(&txn, tenant).await?;
        let access_token = generate_token();
        let wallet = WalletRepository::insert(
            &txn,
            NewWallet {
                tenant_id: tenant,
                user_id: None,
                role: WalletRole::Master,
                account_type: AccountType::Closed,
                currency: currency.as_str().to_string(),
                enabled: true,
                account_prefix: number.prefix,
                account_seq: number.sequence,
                account_no: number.account_no,
                access_token_hash: hash_token(&access_token),
            },
        )
        .await?;
        Self::commit(txn).await?;

        info!(wallet = %wallet.account_no, tenant_id = %wallet.tenant_id, "Master wallet opened");
        Ok(OpenedAccount {
            wallet,
            access_token,
        })
    }

    /// Opens a REGULAR wallet for the user identified by `contact`.
    ///
    /// The user is found by mobile number or created.
    ///
    /// # Returns
    /// * `Err(WorkflowError::Validation)` for malformed contact details or currency
    /// * `Err(WorkflowError::Conflict)` if the user already owns a wallet
    pub async fn open_regular_account(
        &self,
        tenant: TenantId,
        users: &dyn UserDirectory,
        contact: &ContactDetails,
        currency: &str,
        account_type: AccountType,
        enabled: bool,
    ) -> Result<OpenedAccount, WorkflowError> {
        let currency = LedgerService::validate_currency(currency)?;
        let user = users.find_or_create_by_contact(contact).await?;

        let txn = self.begin().await?;
        if WalletRepository::find_by_user(&txn, user.id.into_inner())
            .await?
            .is_some()
        {
            return Err(WorkflowError::Conflict(format!(
                "User {} already has a wallet",
                user.mobile
            )));
        }
        let number = TenantRepository::next_account_number(&txn, tenant).await?;
        let access_token = generate_token();
        let wallet = WalletRepository::insert(
            &txn,
            NewWallet {
                tenant_id: tenant,
                user_id: Some(user.id.into_inner()),
                role: WalletRole::Regular,
                account_type,
                currency: currency.as_str().to_string(),
                enabled,
                account_prefix: number.prefix,
                account_seq: number.sequence,
                account_no: number.account_no,
                access_token_hash: hash_token(&access_token),
            },
        )
        .await?;
        Self::commit(txn).await?;

        info!(wallet = %wallet.account_no, tenant_id = %wallet.tenant_id, user_id = %user.id.into_inner(), "Wallet opened");
        Ok(OpenedAccount {
            wallet,
            access_token,
        })
    }

    /// Changes a wallet's `enabled` flag and/or account type.
    ///
    /// # Returns
    /// * `Err(WorkflowError::Validation)` if the update changes nothing
    /// * `Err(WorkflowError::NotFound)` for unknown, closed or foreign wallets
    pub async fn update_account(
        &self,
        tenant: TenantId,
        account_no: &str,
        update: AccountUpdate,
    ) -> Result<wallet_accounts::Model, WorkflowError> {
        if update.is_empty() {
            return Err(WorkflowError::Validation(
                "Nothing to update: provide enabled or account_type".to_string(),
            ));
        }

        let txn = self.begin().await?;
        let wallet = WalletRepository::load(&txn, WalletKey::AccountNo(account_no), tenant).await?;
        let wallet = WalletRepository::update_flags(&txn, wallet, update).await?;
        Self::commit(txn).await?;

        info!(wallet = %wallet.account_no, enabled = wallet.enabled, "Wallet updated");
        Ok(wallet)
    }

    /// Soft-deletes a wallet with a zero balance.
    ///
    /// # Returns
    /// * `Err(WorkflowError::Conflict)` if the balance is not zero or a withdrawal is pending
    pub async fn close_account(
        &self,
        tenant: TenantId,
        account_no: &str,
    ) -> Result<wallet_accounts::Model, WorkflowError> {
        let txn = self.begin().await?;
        let wallet = WalletRepository::load(&txn, WalletKey::AccountNo(account_no), tenant).await?;
        AccountService::ensure_closable(&WalletRepository::state(&wallet))?;
        if LedgerRepository::pending_withdrawals(&txn, wallet.id).await? > 0 {
            return Err(WorkflowError::Conflict(format!(
                "Wallet {account_no} has a withdrawal awaiting review"
            )));
        }
        let wallet = WalletRepository::soft_delete(&txn, wallet).await?;
        Self::commit(txn).await?;

        info!(wallet = %wallet.account_no, "Wallet closed");
        Ok(wallet)
    }

    /// Issues a new access token, invalidating the previous one.
    pub async fn rotate_access_token(
        &self,
        tenant: TenantId,
        account_no: &str,
    ) -> Result<OpenedAccount, WorkflowError> {
        let txn = self.begin().await?;
        let wallet = WalletRepository::load(&txn, WalletKey::AccountNo(account_no), tenant).await?;
        let access_token = generate_token();
        let wallet =
            WalletRepository::set_access_token_hash(&txn, wallet, hash_token(&access_token))
                .await?;
        Self::commit(txn).await?;

        info!(wallet = %wallet.account_no, "Access token rotated");
        Ok(OpenedAccount {
            wallet,
            access_token,
        })
    }

    /// Returns a wallet and a page of its entries.
    pub async fn statement(
        &self,
        tenant: TenantId,
        account_no: &str,
        page: PageRequest,
    ) -> Result<Statement, WorkflowError> {
        let wallet =
            WalletRepository::load(&self.db, WalletKey::AccountNo(account_no), tenant).await?;
        let entries = LedgerRepository::new(self.db.clone())
            .statement(wallet.id, page)
            .await?;
        Ok(Statement { wallet, entries })
    }

    /// Finds an entry by transaction id.
    pub async fn find_entry(&self, txn_id: &str) -> Result<ledger_entries::Model, WorkflowError> {
        LedgerRepository::new(self.db.clone())
            .find_by_txn_id(txn_id)
            .await?
            .ok_or_else(|| WorkflowError::NotFound(format!("Transaction {txn_id}")))
    }

    /// Lists every entry carrying `utr`.
    pub async fn entries_for_utr(
        &self,
        utr: &str,
    ) -> Result<Vec<ledger_entries::Model>, WorkflowError> {
        let entries = LedgerRepository::find_by_utr(&self.db, utr).await?;
        if entries.is_empty() {
            return Err(WorkflowError::NotFound(format!("Transaction {utr}")));
        }
        Ok(entries)
    }
}
