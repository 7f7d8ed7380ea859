//! Ledger entry store.
//!
//! Entries are append-only: after insertion only `status`, `settled` and
//! `updated_at` change. Status updates are conditional on the row still being
//! `PENDING`, so a terminal status can never be overwritten.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use tracing::debug;
use uuid::Uuid;

use ledgerloop_core::ledger::{
    EntryDraft, EntryIdentifiers, EntrySnapshot, EntryStatus, EntryType, IdSource, LedgerError,
    TransferPlan,
};
use ledgerloop_core::workflow::{WorkflowError, WorkflowService};
use ledgerloop_shared::types::{Money, Page, PageRequest, WalletId};

use crate::entities::{ledger_entries, sea_orm_active_enums};

use super::{db_error, unique_or_db};

/// Draws identifiers from an [`IdSource`] until the store confirms they are unused.
#[derive(Clone, Copy)]
pub struct IdAllocator<'a> {
    source: &'a dyn IdSource,
    max_attempts: u32,
}

impl<'a> IdAllocator<'a> {
    /// Creates an allocator making at most `max_attempts` draws per identifier.
    #[must_use]
    pub const fn new(source: &'a dyn IdSource, max_attempts: u32) -> Self {
        let max_attempts = if max_attempts == 0 { 1 } else { max_attempts };
        Self {
            source,
            max_attempts,
        }
    }

    /// Allocates a `(uuid, txn_id)` pair unused by any entry.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` when every attempt collided, `Database` on query failure.
    pub async fn entry_identifiers<C: ConnectionTrait>(
        &self,
        conn: &C,
    ) -> Result<EntryIdentifiers, WorkflowError> {
        for attempt in 1..=self.max_attempts {
            let candidate = self.source.entry_identifiers();
            let taken = ledger_entries::Entity::find()
                .filter(
                    Condition::any()
                        .add(ledger_entries::Column::EntryUuid.eq(candidate.uuid))
                        .add(ledger_entries::Column::TxnId.eq(candidate.txn_id.as_str())),
                )
                .count(conn)
                .await
                .map_err(db_error)?;
            if taken == 0 {
                return Ok(candidate);
            }
            debug!(attempt, txn_id = %candidate.txn_id, "Entry identifier collision");
        }
        Err(LedgerError::IdentifiersExhausted {
            attempts: self.max_attempts,
        }
        .into())
    }

    /// Allocates a correlation code unused by any entry.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` when every attempt collided, `Database` on query failure.
    pub async fn utr<C: ConnectionTrait>(&self, conn: &C) -> Result<String, WorkflowError> {
        for attempt in 1..=self.max_attempts {
            let candidate = self.source.utr();
            let taken = ledger_entries::Entity::find()
                .filter(ledger_entries::Column::Utr.eq(candidate.as_str()))
                .count(conn)
                .await
                .map_err(db_error)?;
            if taken == 0 {
                return Ok(candidate);
            }
            debug!(attempt, utr = %candidate, "UTR collision");
        }
        Err(LedgerError::IdentifiersExhausted {
            attempts: self.max_attempts,
        }
        .into())
    }
}

/// Ledger entry repository.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    db: DatabaseConnection,
}

impl LedgerRepository {
    /// Creates a new ledger repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// The facts about a stored entry that workflow rules consume.
    #[must_use]
    pub fn snapshot(entry: &ledger_entries::Model) -> EntrySnapshot {
        EntrySnapshot {
            wallet_id: WalletId::from_uuid(entry.wallet_id),
            entry_type: entry.entry_type.into(),
            status: entry.status.into(),
            amount: Money::from_minor(entry.amount_minor),
            currency: entry.currency.clone(),
            utr: entry.utr.clone(),
            settled: entry.settled,
        }
    }

    /// Finds an entry by its transaction id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_txn_id(
        &self,
        txn_id: &str,
    ) -> Result<Option<ledger_entries::Model>, WorkflowError> {
        ledger_entries::Entity::find()
            .filter(ledger_entries::Column::TxnId.eq(txn_id))
            .one(&self.db)
            .await
            .map_err(db_error)
    }

    /// Lists the entries sharing a UTR, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn entries_for_utr(
        &self,
        utr: &str,
    ) -> Result<Vec<ledger_entries::Model>, WorkflowError> {
        Self::find_by_utr(&self.db, utr).await
    }

    /// Pages through a wallet's entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn statement(
        &self,
        wallet_id: Uuid,
        request: PageRequest,
    ) -> Result<Page<ledger_entries::Model>, WorkflowError> {
        let query = ledger_entries::Entity::find()
            .filter(ledger_entries::Column::WalletId.eq(wallet_id));

        let total = query.clone().count(&self.db).await.map_err(db_error)?;
        let items = query
            .order_by_desc(ledger_entries::Column::CreatedAt)
            .order_by_desc(ledger_entries::Column::Id)
            .offset(request.offset())
            .limit(request.limit())
            .all(&self.db)
            .await
            .map_err(db_error)?;

        Ok(Page {
            items,
            page: request.page,
            per_page: request.per_page,
            total,
        })
    }

    /// Inserts a `PENDING` entry under `utr`.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if an entry of the same type already carries `utr` or
    /// identifiers cannot be allocated, `Validation` if the amount cannot be stored.
    pub async fn insert_entry<C: ConnectionTrait>(
        conn: &C,
        ids: &IdAllocator<'_>,
        draft: &EntryDraft,
        utr: &str,
        bank_reference_id: Option<Uuid>,
    ) -> Result<ledger_entries::Model, WorkflowError> {
        if Self::find_by_utr_and_type(conn, utr, draft.entry_type)
            .await?
            .is_some()
        {
            return Err(LedgerError::DuplicateEntry {
                utr: utr.to_string(),
                entry_type: draft.entry_type,
            }
            .into());
        }

        let amount_minor = Money::to_minor(draft.amount)
            .map_err(|_| LedgerError::AmountOutOfRange(draft.amount))?;
        let identifiers = ids.entry_identifiers(conn).await?;
        let now = Utc::now().into();

        ledger_entries::ActiveModel {
            id: Set(Uuid::new_v4()),
            entry_uuid: Set(identifiers.uuid),
            txn_id: Set(identifiers.txn_id),
            wallet_id: Set(draft.wallet_id.into_inner()),
            currency: Set(draft.currency.clone()),
            amount_minor: Set(amount_minor),
            entry_type: Set(draft.entry_type.into()),
            status: Set(sea_orm_active_enums::EntryStatus::Pending),
            description: Set(draft.description.clone()),
            utr: Set(utr.to_string()),
            related_utr: Set(draft.related_utr.clone()),
            settled: Set(false),
            bank_reference_id: Set(bank_reference_id),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(conn)
        .await
        .map_err(|e| {
            unique_or_db(e, || {
                format!("Entry {} already exists for UTR {utr}", draft.entry_type)
            })
        })
    }

    /// Inserts both sides of a transfer under one UTR.
    ///
    /// # Errors
    ///
    /// See [`Self::insert_entry`].
    pub async fn insert_transfer<C: ConnectionTrait>(
        conn: &C,
        ids: &IdAllocator<'_>,
        plan: &TransferPlan,
        utr: &str,
    ) -> Result<(ledger_entries::Model, ledger_entries::Model), WorkflowError> {
        let debit = Self::insert_entry(conn, ids, &plan.debit, utr, None).await?;
        let credit = Self::insert_entry(conn, ids, &plan.credit, utr, None).await?;
        Ok((debit, credit))
    }

    /// Finds the entry of `entry_type` under `utr`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_utr_and_type<C: ConnectionTrait>(
        conn: &C,
        utr: &str,
        entry_type: EntryType,
    ) -> Result<Option<ledger_entries::Model>, WorkflowError> {
        ledger_entries::Entity::find()
            .filter(ledger_entries::Column::Utr.eq(utr))
            .filter(
                ledger_entries::Column::EntryType
                    .eq(sea_orm_active_enums::EntryType::from(entry_type)),
            )
            .one(conn)
            .await
            .map_err(db_error)
    }

    /// Lists the entries sharing a UTR, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_utr<C: ConnectionTrait>(
        conn: &C,
        utr: &str,
    ) -> Result<Vec<ledger_entries::Model>, WorkflowError> {
        ledger_entries::Entity::find()
            .filter(ledger_entries::Column::Utr.eq(utr))
            .order_by_asc(ledger_entries::Column::CreatedAt)
            .all(conn)
            .await
            .map_err(db_error)
    }

    /// Loads entries by primary key, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_ids<C: ConnectionTrait>(
        conn: &C,
        ids: &[Uuid],
    ) -> Result<Vec<ledger_entries::Model>, WorkflowError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        ledger_entries::Entity::find()
            .filter(ledger_entries::Column::Id.is_in(ids.iter().copied()))
            .order_by_asc(ledger_entries::Column::CreatedAt)
            .all(conn)
            .await
            .map_err(db_error)
    }

    /// Finds an open refund request against `original_utr`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn pending_refund_for<C: ConnectionTrait>(
        conn: &C,
        original_utr: &str,
    ) -> Result<Option<ledger_entries::Model>, WorkflowError> {
        ledger_entries::Entity::find()
            .filter(ledger_entries::Column::RelatedUtr.eq(original_utr))
            .filter(ledger_entries::Column::EntryType.eq(sea_orm_active_enums::EntryType::RefundDebit))
            .filter(ledger_entries::Column::Status.eq(sea_orm_active_enums::EntryStatus::Pending))
            .one(conn)
            .await
            .map_err(db_error)
    }

    /// Counts a wallet's withdrawals still awaiting review.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn pending_withdrawals<C: ConnectionTrait>(
        conn: &C,
        wallet_id: Uuid,
    ) -> Result<u64, WorkflowError> {
        ledger_entries::Entity::find()
            .filter(ledger_entries::Column::WalletId.eq(wallet_id))
            .filter(
                ledger_entries::Column::EntryType
                    .eq(sea_orm_active_enums::EntryType::WithdrawDebit),
            )
            .filter(ledger_entries::Column::Status.eq(sea_orm_active_enums::EntryStatus::Pending))
            .count(conn)
            .await
            .map_err(db_error)
    }

    /// Every entry booked against a wallet, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn wallet_history<C: ConnectionTrait>(
        conn: &C,
        wallet_id: Uuid,
    ) -> Result<Vec<ledger_entries::Model>, WorkflowError> {
        ledger_entries::Entity::find()
            .filter(ledger_entries::Column::WalletId.eq(wallet_id))
            .order_by_asc(ledger_entries::Column::CreatedAt)
            .all(conn)
            .await
            .map_err(db_error)
    }

    /// Moves a `PENDING` entry to a terminal status.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if the entry is missing or no longer `PENDING`.
    pub async fn set_status<C: ConnectionTrait>(
        conn: &C,
        id: Uuid,
        status: EntryStatus,
    ) -> Result<(), WorkflowError> {
        WorkflowService::transition(EntryStatus::Pending, status)?;

        let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
        let result = ledger_entries::Entity::update_many()
            .col_expr(
                ledger_entries::Column::Status,
                Expr::value(sea_orm_active_enums::EntryStatus::from(status)),
            )
            .col_expr(ledger_entries::Column::UpdatedAt, Expr::value(now))
            .filter(ledger_entries::Column::Id.eq(id))
            .filter(ledger_entries::Column::Status.eq(sea_orm_active_enums::EntryStatus::Pending))
            .exec(conn)
            .await
            .map_err(db_error)?;

        if result.rows_affected == 0 {
            return Err(WorkflowError::Conflict(format!(
                "Transaction {id} already processed"
            )));
        }
        Ok(())
    }

    /// Marks still-`PENDING` entries as `FAILURE`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn mark_failed<C: ConnectionTrait>(
        conn: &C,
        ids: &[Uuid],
    ) -> Result<u64, WorkflowError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
        let result = ledger_entries::Entity::update_many()
            .col_expr(
                ledger_entries::Column::Status,
                Expr::value(sea_orm_active_enums::EntryStatus::Failure),
            )
            .col_expr(ledger_entries::Column::UpdatedAt, Expr::value(now))
            .filter(ledger_entries::Column::Id.is_in(ids.iter().copied()))
            .filter(ledger_entries::Column::Status.eq(sea_orm_active_enums::EntryStatus::Pending))
            .exec(conn)
            .await
            .map_err(db_error)?;

        Ok(result.rows_affected)
    }

    /// Flags every entry under the given UTRs as settled.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn mark_settled<C: ConnectionTrait>(
        conn: &C,
        utrs: &[String],
    ) -> Result<u64, WorkflowError> {
        if utrs.is_empty() {
            return Ok(0);
        }

        let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
        let result = ledger_entries::Entity::update_many()
            .col_expr(ledger_entries::Column::Settled, Expr::value(true))
            .col_expr(ledger_entries::Column::UpdatedAt, Expr::value(now))
            .filter(ledger_entries::Column::Utr.is_in(utrs.iter().map(String::as_str)))
            .exec(conn)
            .await
            .map_err(db_error)?;

        Ok(result.rows_affected)
    }
}
