//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.
//!
//! Operations that must join a larger storage transaction are associated
//! functions generic over [`sea_orm::ConnectionTrait`]; they accept either the
//! pooled connection or an open [`sea_orm::DatabaseTransaction`].

pub mod access;
pub mod bank;
pub mod credentials;
pub mod ledger;
pub mod tenant;
pub mod user;
pub mod wallet;

pub use access::StoreAccessGuard;
pub use bank::BankRepository;
pub use ledger::{IdAllocator, LedgerRepository};
pub use tenant::{AccountNumber, IssuedTenant, NewTenant, TenantRepository};
pub use user::UserRepository;
pub use wallet::{NewWallet, WalletKey, WalletRepository};

use sea_orm::{DbErr, SqlErr};

use ledgerloop_core::workflow::WorkflowError;

/// Maps a storage failure onto the workflow taxonomy.
pub(crate) fn db_error(err: DbErr) -> WorkflowError {
    WorkflowError::Database(err.to_string())
}

/// Maps a unique-constraint violation to `Conflict`, anything else to `Database`.
pub(crate) fn unique_or_db(err: DbErr, conflict: impl FnOnce() -> String) -> WorkflowError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => WorkflowError::Conflict(conflict()),
        _ => db_error(err),
    }
}
