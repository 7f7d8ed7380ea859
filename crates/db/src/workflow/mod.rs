//! Wallet workflow engine.
//!
//! Every flow runs in one transaction. It validates all preconditions and
//! inserts the new ledger entries as `PENDING`, then [`mutator`] moves
//! balances and finalizes entry statuses in a savepoint of that same
//! transaction. If the savepoint fails, balances roll back and the entries it
//! was finalizing are committed as `FAILURE`. A flow abandoned before commit
//! leaves no rows.
//!
//! # Modules
//!
//! - `deposit` - Bank transfer into a REGULAR wallet
//! - `payment` - Pay-to-master, direct or by request and review
//! - `refund` - Refund by request and review, or direct
//! - `withdrawal` - Withdrawal request and review
//! - `accounts` - Wallet onboarding, updates and lookups
//! - `reconcile` - Cached versus derived balances

mod accounts;
mod deposit;
mod mutator;
mod payment;
mod reconcile;
mod refund;
mod withdrawal;

pub use accounts::{OpenedAccount, Statement};

use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use serde::Serialize;
use uuid::Uuid;

use ledgerloop_core::access::FieldCipher;
use ledgerloop_core::bank::BankDetails;
use ledgerloop_core::ledger::{DEFAULT_MAX_ATTEMPTS, IdSource, RandomIdSource};
use ledgerloop_core::workflow::{Decision, WorkflowError, WorkflowKind, WorkflowStage};
use ledgerloop_shared::types::TenantId;

use crate::entities::ledger_entries;
use crate::repositories::{IdAllocator, LedgerRepository, db_error};

/// Outcome of a workflow call.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowReceipt {
    /// Flow that ran.
    pub kind: WorkflowKind,
    /// Correlation code the caller uses for follow-up steps.
    pub utr: String,
    /// Where the flow stands.
    pub stage: WorkflowStage,
    /// Entries created or finalized by this call, as stored afterwards.
    pub entries: Vec<ledger_entries::Model>,
}

/// Bank transfer into a REGULAR wallet.
#[derive(Debug, Clone)]
pub struct DepositRequest {
    /// Calling tenant.
    pub tenant: TenantId,
    /// Wallet to credit.
    pub account_no: String,
    /// Amount, rounded to two decimals.
    pub amount: Decimal,
    /// Free-text note.
    pub description: String,
    /// Sending bank account; `utr_no` is required.
    pub bank: BankDetails,
}

/// Payment from a REGULAR wallet to its tenant's MASTER wallet.
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    /// Calling tenant.
    pub tenant: TenantId,
    /// Paying wallet.
    pub account_no: String,
    /// Amount, rounded to two decimals.
    pub amount: Decimal,
    /// Free-text note.
    pub description: String,
}

/// Request to refund an earlier payment.
#[derive(Debug, Clone)]
pub struct RefundRequest {
    /// Calling tenant.
    pub tenant: TenantId,
    /// Wallet that made the payment.
    pub account_no: String,
    /// UTR of the payment.
    pub original_utr: String,
    /// Free-text note.
    pub description: String,
}

/// Withdrawal to an external bank account.
#[derive(Debug, Clone)]
pub struct WithdrawalRequest {
    /// Calling tenant.
    pub tenant: TenantId,
    /// Wallet to withdraw from.
    pub account_no: String,
    /// Amount, rounded to two decimals.
    pub amount: Decimal,
    /// Free-text note.
    pub description: String,
    /// Receiving bank account.
    pub bank: BankDetails,
}

/// A reviewer's decision on a pending request.
#[derive(Debug, Clone)]
pub struct ReviewRequest {
    /// Reviewing tenant.
    pub tenant: TenantId,
    /// UTR of the request.
    pub utr: String,
    /// Approve or reject.
    pub decision: Decision,
    /// Free-text note for entries created by the review.
    pub description: String,
    /// Bank UTR confirming the payout; required to approve a withdrawal.
    pub bank_utr_no: Option<String>,
}

impl ReviewRequest {
    /// Builds a review without a bank UTR.
    #[must_use]
    pub fn new(tenant: TenantId, utr: impl Into<String>, decision: Decision) -> Self {
        Self {
            tenant,
            utr: utr.into(),
            decision,
            description: String::new(),
            bank_utr_no: None,
        }
    }

    /// Attaches the bank UTR confirming a payout.
    #[must_use]
    pub fn with_bank_utr_no(mut self, utr_no: impl Into<String>) -> Self {
        self.bank_utr_no = Some(utr_no.into());
        self
    }
}

/// Runs the wallet flows against one database.
#[derive(Clone)]
pub struct WalletEngine {
    db: DatabaseConnection,
    ids: Arc<dyn IdSource>,
    cipher: Arc<dyn FieldCipher>,
    max_attempts: u32,
}

impl WalletEngine {
    /// Creates an engine with random identifiers.
    #[must_use]
    pub fn new(db: DatabaseConnection, cipher: Arc<dyn FieldCipher>) -> Self {
        Self {
            db,
            ids: Arc::new(RandomIdSource),
            cipher,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Replaces the identifier source.
    #[must_use]
    pub fn with_id_source(mut self, ids: Arc<dyn IdSource>) -> Self {
        self.ids = ids;
        self
    }

    /// Sets how many draws the identifier allocator makes before giving up.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Underlying connection.
    #[must_use]
    pub const fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    fn allocator(&self) -> IdAllocator<'_> {
        IdAllocator::new(self.ids.as_ref(), self.max_attempts)
    }

    async fn begin(&self) -> Result<DatabaseTransaction, WorkflowError> {
        self.db.begin().await.map_err(db_error)
    }

    async fn commit(txn: DatabaseTransaction) -> Result<(), WorkflowError> {
        txn.commit().await.map_err(db_error)
    }

    async fn receipt(
        &self,
        kind: WorkflowKind,
        utr: String,
        stage: WorkflowStage,
        entry_ids: &[Uuid],
    ) -> Result<WorkflowReceipt, WorkflowError> {
        let entries = LedgerRepository::find_by_ids(&self.db, entry_ids).await?;
        Ok(WorkflowReceipt {
            kind,
            utr,
            stage,
            entries,
        })
    }
}

impl std::fmt::Debug for WalletEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletEngine")
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}
