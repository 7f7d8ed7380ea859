//! Bank reference store.
//!
//! Account numbers are sealed with the configured [`FieldCipher`] before they
//! reach the table. A bank `utr_no` identifies one external transfer, so it
//! may appear at most once.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, Set,
};
use uuid::Uuid;

use ledgerloop_core::access::FieldCipher;
use ledgerloop_core::bank::BankDetails;
use ledgerloop_core::workflow::WorkflowError;

use crate::entities::bank_references;

use super::{db_error, unique_or_db};

const UTR_ALREADY_PROCESSED: &str = "UTR already processed";

/// Bank reference repository.
#[derive(Debug, Clone)]
pub struct BankRepository {
    db: DatabaseConnection,
}

impl BankRepository {
    /// Creates a new bank reference repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a bank reference by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<bank_references::Model>, WorkflowError> {
        bank_references::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_error)
    }

    /// Returns the plaintext account number of a stored reference.
    ///
    /// # Errors
    ///
    /// Returns `Database` if the ciphertext cannot be opened.
    pub fn account_no(
        cipher: &dyn FieldCipher,
        reference: &bank_references::Model,
    ) -> Result<String, WorkflowError> {
        cipher.decrypt(&reference.account_no).map_err(|e| {
            WorkflowError::Database(format!("Could not decrypt bank account number: {e}"))
        })
    }

    /// Returns true if a bank reference already carries `utr_no`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn utr_no_exists<C: ConnectionTrait>(
        conn: &C,
        utr_no: &str,
    ) -> Result<bool, WorkflowError> {
        let count = bank_references::Entity::find()
            .filter(bank_references::Column::UtrNo.eq(utr_no))
            .count(conn)
            .await
            .map_err(db_error)?;
        Ok(count > 0)
    }

    /// Stores normalized bank details with the account number encrypted.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if `details.utr_no` is already recorded, `Database`
    /// if encryption or the insert fails.
    pub async fn insert<C: ConnectionTrait>(
        conn: &C,
        cipher: &dyn FieldCipher,
        details: &BankDetails,
    ) -> Result<bank_references::Model, WorkflowError> {
        let taken = match &details.utr_no {
            Some(utr_no) => Self::utr_no_exists(conn, utr_no).await?,
            None => false,
        };
        if taken {
            return Err(WorkflowError::Conflict(UTR_ALREADY_PROCESSED.to_string()));
        }

        let sealed = cipher.encrypt(&details.account_no).map_err(|e| {
            WorkflowError::Database(format!("Could not encrypt bank account number: {e}"))
        })?;
        let now = Utc::now().into();

        bank_references::ActiveModel {
            id: Set(Uuid::new_v4()),
            bank_name: Set(details.bank_name.clone()),
            ifsc: Set(details.ifsc.clone()),
            account_holder_name: Set(details.account_holder_name.clone()),
            account_no: Set(sealed),
            utr_no: Set(details.utr_no.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(conn)
        .await
        .map_err(|e| unique_or_db(e, || UTR_ALREADY_PROCESSED.to_string()))
    }

    /// Records the bank `utr_no` confirming a payout.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if `utr_no` is already recorded, `NotFound` if the
    /// reference is gone.
    pub async fn set_utr_no<C: ConnectionTrait>(
        conn: &C,
        id: Uuid,
        utr_no: &str,
    ) -> Result<bank_references::Model, WorkflowError> {
        if Self::utr_no_exists(conn, utr_no).await? {
            return Err(WorkflowError::Conflict(UTR_ALREADY_PROCESSED.to_string()));
        }

        let reference = bank_references::Entity::find_by_id(id)
            .one(conn)
            .await
            .map_err(db_error)?
            .ok_or_else(|| WorkflowError::NotFound(format!("Bank reference {id}")))?;

        let mut active: bank_references::ActiveModel = reference.into();
        active.utr_no = Set(Some(utr_no.to_string()));
        active.updated_at = Set(Utc::now().into());
        active
            .update(conn)
            .await
            .map_err(|e| unique_or_db(e, || UTR_ALREADY_PROCESSED.to_string()))
    }
}
