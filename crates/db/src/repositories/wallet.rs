//! Wallet account store.
//!
//! The cached balance is only ever changed by [`WalletRepository::debit`] and
//! [`WalletRepository::credit`]. A debit is a single guarded UPDATE, so the
//! sufficiency check and the write cannot be separated by another writer.

use std::fmt;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use ledgerloop_core::account::{AccountService, AccountType, AccountUpdate, WalletRole, WalletState};
use ledgerloop_core::ledger::LedgerError;
use ledgerloop_core::workflow::WorkflowError;
use ledgerloop_shared::types::{Money, TenantId, WalletId};

use crate::entities::{sea_orm_active_enums, wallet_accounts};

use super::{db_error, unique_or_db};

/// How a caller names a wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletKey<'a> {
    /// Primary key.
    Id(WalletId),
    /// Human-readable account number.
    AccountNo(&'a str),
}

impl fmt::Display for WalletKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{}", id.into_inner()),
            Self::AccountNo(account_no) => f.write_str(account_no),
        }
    }
}

/// Input for inserting a wallet row.
#[derive(Debug, Clone)]
pub struct NewWallet {
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Linked user; `None` for MASTER wallets.
    pub user_id: Option<Uuid>,
    /// Wallet role.
    pub role: WalletRole,
    /// Account type.
    pub account_type: AccountType,
    /// Currency code.
    pub currency: String,
    /// Whether the wallet starts enabled.
    pub enabled: bool,
    /// Tenant prefix used for the account number.
    pub account_prefix: String,
    /// Sequence number within the prefix.
    pub account_seq: i64,
    /// Full account number.
    pub account_no: String,
    /// SHA-256 digest of the wallet access token.
    pub access_token_hash: String,
}

/// Wallet account repository.
#[derive(Debug, Clone)]
pub struct WalletRepository {
    db: DatabaseConnection,
}

impl WalletRepository {
    /// Creates a new wallet repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Converts a stored wallet into the state the account rules inspect.
    #[must_use]
    pub fn state(wallet: &wallet_accounts::Model) -> WalletState {
        WalletState {
            id: WalletId::from_uuid(wallet.id),
            tenant_id: TenantId::from_uuid(wallet.tenant_id),
            account_no: wallet.account_no.clone(),
            role: wallet.role.into(),
            enabled: wallet.enabled,
            deleted: wallet.deleted_at.is_some(),
            balance: Money::from_minor(wallet.balance_minor),
            currency: wallet.currency.clone(),
        }
    }

    /// Lists a tenant's live wallets by account number.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_tenant(
        &self,
        tenant: TenantId,
    ) -> Result<Vec<wallet_accounts::Model>, WorkflowError> {
        wallet_accounts::Entity::find()
            .filter(wallet_accounts::Column::TenantId.eq(tenant.into_inner()))
            .filter(wallet_accounts::Column::DeletedAt.is_null())
            .order_by_asc(wallet_accounts::Column::AccountNo)
            .all(&self.db)
            .await
            .map_err(db_error)
    }

    /// Finds a wallet, including soft-deleted ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find<C: ConnectionTrait>(
        conn: &C,
        key: WalletKey<'_>,
    ) -> Result<Option<wallet_accounts::Model>, WorkflowError> {
        let query = match key {
            WalletKey::Id(id) => wallet_accounts::Entity::find_by_id(id.into_inner()),
            WalletKey::AccountNo(account_no) => wallet_accounts::Entity::find()
                .filter(wallet_accounts::Column::AccountNo.eq(account_no)),
        };
        query.one(conn).await.map_err(db_error)
    }

    /// Loads a live wallet belonging to `tenant`, whatever its role or flag.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the wallet is absent, soft-deleted, or owned by
    /// another tenant.
    pub async fn load<C: ConnectionTrait>(
        conn: &C,
        key: WalletKey<'_>,
        tenant: TenantId,
    ) -> Result<wallet_accounts::Model, WorkflowError> {
        Self::find(conn, key)
            .await?
            .filter(|w| w.deleted_at.is_none() && w.tenant_id == tenant.into_inner())
            .ok_or_else(|| WorkflowError::NotFound(format!("Wallet {key}")))
    }

    /// Loads a wallet for a debiting or crediting step, locking its row.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if absent, soft-deleted or owned by another tenant,
    /// `InvalidState` on a role mismatch, `Forbidden` if disabled.
    pub async fn find_for_update<C: ConnectionTrait>(
        conn: &C,
        key: WalletKey<'_>,
        role: WalletRole,
        tenant: Option<TenantId>,
    ) -> Result<wallet_accounts::Model, WorkflowError> {
        let query = match key {
            WalletKey::Id(id) => wallet_accounts::Entity::find_by_id(id.into_inner()),
            WalletKey::AccountNo(account_no) => wallet_accounts::Entity::find()
                .filter(wallet_accounts::Column::AccountNo.eq(account_no)),
        };
        let wallet = query
            .lock_exclusive()
            .one(conn)
            .await
            .map_err(db_error)?
            .ok_or_else(|| WorkflowError::NotFound(format!("Wallet {key}")))?;

        AccountService::ensure_usable(&Self::state(&wallet), role, tenant)?;
        Ok(wallet)
    }

    /// Finds a tenant's MASTER wallet, including a soft-deleted one.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_master<C: ConnectionTrait>(
        conn: &C,
        tenant: TenantId,
    ) -> Result<Option<wallet_accounts::Model>, WorkflowError> {
        wallet_accounts::Entity::find()
            .filter(wallet_accounts::Column::MasterTenantId.eq(tenant.into_inner()))
            .one(conn)
            .await
            .map_err(db_error)
    }

    /// Loads a tenant's usable MASTER wallet, locking its row.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the tenant has no live MASTER wallet, `Forbidden`
    /// if it is disabled.
    pub async fn master_for_tenant<C: ConnectionTrait>(
        conn: &C,
        tenant: TenantId,
    ) -> Result<wallet_accounts::Model, WorkflowError> {
        let master = wallet_accounts::Entity::find()
            .filter(wallet_accounts::Column::MasterTenantId.eq(tenant.into_inner()))
            .lock_exclusive()
            .one(conn)
            .await
            .map_err(db_error)?
            .ok_or_else(|| {
                WorkflowError::NotFound(format!(
                    "Master wallet for tenant {}",
                    tenant.into_inner()
                ))
            })?;

        AccountService::ensure_usable(&Self::state(&master), WalletRole::Master, Some(tenant))?;
        Ok(master)
    }

    /// Finds the wallet linked to a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_user<C: ConnectionTrait>(
        conn: &C,
        user_id: Uuid,
    ) -> Result<Option<wallet_accounts::Model>, WorkflowError> {
        wallet_accounts::Entity::find()
            .filter(wallet_accounts::Column::UserId.eq(user_id))
            .one(conn)
            .await
            .map_err(db_error)
    }

    /// Inserts a wallet with a zero balance.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` on a duplicate account number, access token, user
    /// link or second MASTER wallet.
    pub async fn insert<C: ConnectionTrait>(
        conn: &C,
        wallet: NewWallet,
    ) -> Result<wallet_accounts::Model, WorkflowError> {
        let now = Utc::now().into();
        let master_tenant_id = match wallet.role {
            WalletRole::Master => Some(wallet.tenant_id.into_inner()),
            WalletRole::Regular => None,
        };
        let account_no = wallet.account_no.clone();

        wallet_accounts::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(wallet.tenant_id.into_inner()),
            master_tenant_id: Set(master_tenant_id),
            user_id: Set(wallet.user_id),
            account_no: Set(wallet.account_no),
            account_prefix: Set(wallet.account_prefix),
            account_seq: Set(wallet.account_seq),
            currency: Set(wallet.currency),
            balance_minor: Set(0),
            role: Set(wallet.role.into()),
            account_type: Set(wallet.account_type.into()),
            enabled: Set(wallet.enabled),
            access_token_hash: Set(wallet.access_token_hash),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        }
        .insert(conn)
        .await
        .map_err(|e| unique_or_db(e, || format!("Wallet {account_no} already exists")))
    }

    /// Applies an [`AccountUpdate`] to a wallet.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn update_flags<C: ConnectionTrait>(
        conn: &C,
        wallet: wallet_accounts::Model,
        update: AccountUpdate,
    ) -> Result<wallet_accounts::Model, WorkflowError> {
        let mut active: wallet_accounts::ActiveModel = wallet.into();
        if let Some(enabled) = update.enabled {
            active.enabled = Set(enabled);
        }
        if let Some(account_type) = update.account_type {
            active.account_type = Set(sea_orm_active_enums::AccountType::from(account_type));
        }
        active.updated_at = Set(Utc::now().into());
        active.update(conn).await.map_err(db_error)
    }

    /// Soft-deletes and disables a wallet.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn soft_delete<C: ConnectionTrait>(
        conn: &C,
        wallet: wallet_accounts::Model,
    ) -> Result<wallet_accounts::Model, WorkflowError> {
        let now = Utc::now().into();
        let mut active: wallet_accounts::ActiveModel = wallet.into();
        active.enabled = Set(false);
        active.deleted_at = Set(Some(now));
        active.updated_at = Set(now);
        active.update(conn).await.map_err(db_error)
    }

    /// Replaces a wallet's access token digest.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if the digest is already in use.
    pub async fn set_access_token_hash<C: ConnectionTrait>(
        conn: &C,
        wallet: wallet_accounts::Model,
        access_token_hash: String,
    ) -> Result<wallet_accounts::Model, WorkflowError> {
        let mut active: wallet_accounts::ActiveModel = wallet.into();
        active.access_token_hash = Set(access_token_hash);
        active.updated_at = Set(Utc::now().into());
        active
            .update(conn)
            .await
            .map_err(|e| unique_or_db(e, || "Access token already in use".to_string()))
    }

    /// Subtracts `amount` from a live, enabled wallet holding at least `amount`.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientFunds` if the guard rejected the update for lack of
    /// balance, `Forbidden` if the wallet is disabled, `NotFound` if it is gone.
    pub async fn debit<C: ConnectionTrait>(
        conn: &C,
        wallet_id: Uuid,
        amount: Decimal,
    ) -> Result<(), WorkflowError> {
        let minor = Money::to_minor(amount).map_err(|_| LedgerError::AmountOutOfRange(amount))?;
        let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();

        let result = wallet_accounts::Entity::update_many()
            .col_expr(
                wallet_accounts::Column::BalanceMinor,
                Expr::col(wallet_accounts::Column::BalanceMinor).sub(minor),
            )
            .col_expr(wallet_accounts::Column::UpdatedAt, Expr::value(now))
            .filter(wallet_accounts::Column::Id.eq(wallet_id))
            .filter(wallet_accounts::Column::BalanceMinor.gte(minor))
            .filter(wallet_accounts::Column::Enabled.eq(true))
            .filter(wallet_accounts::Column::DeletedAt.is_null())
            .exec(conn)
            .await
            .map_err(db_error)?;

        if result.rows_affected == 1 {
            return Ok(());
        }

        let wallet = wallet_accounts::Entity::find_by_id(wallet_id)
            .one(conn)
            .await
            .map_err(db_error)?
            .filter(|w| w.deleted_at.is_none())
            .ok_or_else(|| WorkflowError::NotFound(format!("Wallet {wallet_id}")))?;
        if !wallet.enabled {
            return Err(WorkflowError::Forbidden(format!(
                "Wallet {} is disabled",
                wallet.account_no
            )));
        }
        Err(WorkflowError::InsufficientFunds {
            available: Money::from_minor(wallet.balance_minor),
            requested: amount,
        })
    }

    /// Adds `amount` to a live wallet.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the wallet is absent or soft-deleted.
    pub async fn credit<C: ConnectionTrait>(
        conn: &C,
        wallet_id: Uuid,
        amount: Decimal,
    ) -> Result<(), WorkflowError> {
        let minor = Money::to_minor(amount).map_err(|_| LedgerError::AmountOutOfRange(amount))?;
        let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();

        let result = wallet_accounts::Entity::update_many()
            .col_expr(
                wallet_accounts::Column::BalanceMinor,
                Expr::col(wallet_accounts::Column::BalanceMinor).add(minor),
            )
            .col_expr(wallet_accounts::Column::UpdatedAt, Expr::value(now))
            .filter(wallet_accounts::Column::Id.eq(wallet_id))
            .filter(wallet_accounts::Column::DeletedAt.is_null())
            .exec(conn)
            .await
            .map_err(db_error)?;

        if result.rows_affected == 0 {
            return Err(WorkflowError::NotFound(format!("Wallet {wallet_id}")));
        }
        Ok(())
    }
}
