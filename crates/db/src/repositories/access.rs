//! Store-backed access checks.

use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect,
};
use uuid::Uuid;

use ledgerloop_core::access::AccessGuard;
use ledgerloop_core::workflow::WorkflowError;

use crate::entities::{ledger_entries, tenants, wallet_accounts};

use super::credentials::hash_token;
use super::db_error;
use super::tenant::TenantRepository;

/// [`AccessGuard`] answering from the tenant and wallet tables.
#[derive(Debug, Clone)]
pub struct StoreAccessGuard {
    db: DatabaseConnection,
}

impl StoreAccessGuard {
    /// Creates a new access guard.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn tenant(&self, key: &str, token: &str) -> Result<Option<tenants::Model>, WorkflowError> {
        match TenantRepository::authenticate(&self.db, key, token).await {
            Ok(tenant) => Ok(Some(tenant)),
            Err(WorkflowError::Forbidden(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }
}

#[async_trait]
impl AccessGuard for StoreAccessGuard {
    async fn is_system_authorized(&self, key: &str, token: &str) -> Result<bool, WorkflowError> {
        Ok(self.tenant(key, token).await?.is_some())
    }

    async fn is_wallet_authorized(
        &self,
        account_no: &str,
        token: &str,
    ) -> Result<bool, WorkflowError> {
        let count = wallet_accounts::Entity::find()
            .filter(wallet_accounts::Column::AccountNo.eq(account_no))
            .filter(wallet_accounts::Column::AccessTokenHash.eq(hash_token(token)))
            .filter(wallet_accounts::Column::Enabled.eq(true))
            .filter(wallet_accounts::Column::DeletedAt.is_null())
            .count(&self.db)
            .await
            .map_err(db_error)?;
        Ok(count > 0)
    }

    async fn is_approving_system_for_utr(
        &self,
        utr: &str,
        key: &str,
        token: &str,
    ) -> Result<bool, WorkflowError> {
        let Some(tenant) = self.tenant(key, token).await? else {
            return Ok(false);
        };

        let wallet_ids: Vec<Uuid> = ledger_entries::Entity::find()
            .select_only()
            .column(ledger_entries::Column::WalletId)
            .filter(ledger_entries::Column::Utr.eq(utr))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(db_error)?;
        if wallet_ids.is_empty() {
            return Ok(false);
        }

        let foreign = wallet_accounts::Entity::find()
            .filter(wallet_accounts::Column::Id.is_in(wallet_ids))
            .filter(wallet_accounts::Column::TenantId.ne(tenant.id))
            .count(&self.db)
            .await
            .map_err(db_error)?;
        Ok(foreign == 0)
    }
}
