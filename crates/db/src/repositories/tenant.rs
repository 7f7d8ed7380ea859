//! Tenant repository.
//!
//! Besides credentials, each tenant row owns the counter that numbers its
//! wallets. The counter is advanced with a compare-and-set inside the caller's
//! transaction, so a rolled-back onboarding never consumes a number.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    QueryFilter, Set,
};
use tracing::info;
use uuid::Uuid;

use ledgerloop_core::access::{TenantDirectory, TenantProfile};
use ledgerloop_core::account::numbering;
use ledgerloop_core::workflow::WorkflowError;
use ledgerloop_shared::types::TenantId;

use crate::entities::tenants;

use super::credentials::{generate_token, hash_token};
use super::{db_error, unique_or_db};

/// Input for registering a tenant.
#[derive(Debug, Clone)]
pub struct NewTenant {
    /// Display name, unique.
    pub name: String,
    /// API key, unique; whitespace is stripped and it is lowercased.
    pub key: String,
    /// Account number prefix, unique; whitespace is stripped and it is uppercased.
    pub account_prefix: String,
}

/// A freshly registered tenant and its one-time token.
#[derive(Debug, Clone)]
pub struct IssuedTenant {
    /// Stored tenant row.
    pub tenant: tenants::Model,
    /// Plain API token. Only its digest is stored.
    pub token: String,
}

/// The next account number reserved for a tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountNumber {
    /// Tenant prefix.
    pub prefix: String,
    /// Sequence within the prefix.
    pub sequence: i64,
    /// Prefix followed by the zero-padded sequence.
    pub account_no: String,
}

/// Tenant repository.
#[derive(Debug, Clone)]
pub struct TenantRepository {
    db: DatabaseConnection,
}

impl TenantRepository {
    /// Creates a new tenant repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Converts a stored tenant into its directory profile.
    #[must_use]
    pub fn profile(tenant: &tenants::Model) -> TenantProfile {
        TenantProfile {
            id: TenantId::from_uuid(tenant.id),
            name: tenant.name.clone(),
            key: tenant.key.clone(),
            account_prefix: tenant.account_prefix.clone(),
            enabled: tenant.enabled,
        }
    }

    /// Canonical form of an API key.
    #[must_use]
    pub fn normalize_key(raw: &str) -> String {
        raw.chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase()
    }

    /// Registers a tenant and issues its API token.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a blank name or key or an unusable prefix,
    /// `Conflict` if the name, key or prefix is taken.
    pub async fn create(&self, input: NewTenant) -> Result<IssuedTenant, WorkflowError> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(WorkflowError::Validation("Tenant name is required".to_string()));
        }
        let key = Self::normalize_key(&input.key);
        if key.is_empty() {
            return Err(WorkflowError::Validation("Tenant key is required".to_string()));
        }
        let account_prefix = numbering::normalize_prefix(&input.account_prefix)?;

        let existing = tenants::Entity::find()
            .filter(
                Condition::any()
                    .add(tenants::Column::Name.eq(name.as_str()))
                    .add(tenants::Column::Key.eq(key.as_str()))
                    .add(tenants::Column::AccountPrefix.eq(account_prefix.as_str())),
            )
            .one(&self.db)
            .await
            .map_err(db_error)?;
        if let Some(existing) = existing {
            let field = if existing.name == name {
                "name"
            } else if existing.key == key {
                "key"
            } else {
                "account prefix"
            };
            return Err(WorkflowError::Conflict(format!(
                "Tenant {field} already exists"
            )));
        }

        let token = generate_token();
        let now = Utc::now().into();
        let tenant = tenants::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            key: Set(key),
            token_hash: Set(hash_token(&token)),
            account_prefix: Set(account_prefix),
            enabled: Set(true),
            last_account_seq: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
        .map_err(|e| unique_or_db(e, || "Tenant already exists".to_string()))?;

        info!(tenant_id = %tenant.id, prefix = %tenant.account_prefix, "Tenant registered");
        Ok(IssuedTenant { tenant, token })
    }

    /// Finds a tenant by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: TenantId) -> Result<Option<tenants::Model>, WorkflowError> {
        tenants::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_error)
    }

    /// Enables or disables a tenant.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the tenant does not exist.
    pub async fn set_enabled(
        &self,
        id: TenantId,
        enabled: bool,
    ) -> Result<tenants::Model, WorkflowError> {
        let tenant = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| WorkflowError::NotFound(format!("Tenant {}", id.into_inner())))?;

        let mut active: tenants::ActiveModel = tenant.into();
        active.enabled = Set(enabled);
        active.updated_at = Set(Utc::now().into());
        active.update(&self.db).await.map_err(db_error)
    }

    /// Resolves a tenant from its API key and token.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden` for unknown keys, wrong tokens and disabled tenants.
    pub async fn authenticate<C: ConnectionTrait>(
        conn: &C,
        key: &str,
        token: &str,
    ) -> Result<tenants::Model, WorkflowError> {
        let tenant = tenants::Entity::find()
            .filter(tenants::Column::Key.eq(Self::normalize_key(key)))
            .one(conn)
            .await
            .map_err(db_error)?
            .filter(|t| t.token_hash == hash_token(token))
            .ok_or_else(|| WorkflowError::Forbidden("Invalid tenant credentials".to_string()))?;

        if !tenant.enabled {
            return Err(WorkflowError::Forbidden(format!(
                "Tenant {} is disabled",
                tenant.name
            )));
        }
        Ok(tenant)
    }

    /// Reserves the tenant's next account number.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown tenant, `Forbidden` if it is disabled,
    /// `Conflict` if the sequence is exhausted or moved underneath us.
    pub async fn next_account_number<C: ConnectionTrait>(
        conn: &C,
        tenant: TenantId,
    ) -> Result<AccountNumber, WorkflowError> {
        let row = tenants::Entity::find_by_id(tenant.into_inner())
            .one(conn)
            .await
            .map_err(db_error)?
            .ok_or_else(|| WorkflowError::NotFound(format!("Tenant {}", tenant.into_inner())))?;
        if !row.enabled {
            return Err(WorkflowError::Forbidden(format!(
                "Tenant {} is disabled",
                row.name
            )));
        }

        let sequence = numbering::next_sequence(&row.account_prefix, row.last_account_seq)?;
        let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
        let result = tenants::Entity::update_many()
            .col_expr(tenants::Column::LastAccountSeq, Expr::value(sequence))
            .col_expr(tenants::Column::UpdatedAt, Expr::value(now))
            .filter(tenants::Column::Id.eq(row.id))
            .filter(tenants::Column::LastAccountSeq.eq(row.last_account_seq))
            .exec(conn)
            .await
            .map_err(db_error)?;
        if result.rows_affected == 0 {
            return Err(WorkflowError::Conflict(
                "Account number sequence changed concurrently".to_string(),
            ));
        }

        Ok(AccountNumber {
            account_no: numbering::format_account_no(&row.account_prefix, sequence),
            prefix: row.account_prefix,
            sequence,
        })
    }
}

#[async_trait]
impl TenantDirectory for TenantRepository {
    async fn lookup_by_credentials(
        &self,
        key: &str,
        token: &str,
    ) -> Result<TenantProfile, WorkflowError> {
        let tenant = Self::authenticate(&self.db, key, token).await?;
        Ok(Self::profile(&tenant))
    }

    async fn account_prefix(&self, tenant: TenantId) -> Result<String, WorkflowError> {
        self.find_by_id(tenant)
            .await?
            .map(|t| t.account_prefix)
            .ok_or_else(|| WorkflowError::NotFound(format!("Tenant {}", tenant.into_inner())))
    }
}
