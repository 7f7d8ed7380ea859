//! Database layer with `SeaORM` entities, repositories and the workflow engine.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Repository abstractions for data access
//! - Database migrations
//! - The [`WalletEngine`] running deposits, payments, refunds and withdrawals

pub mod entities;
pub mod migration;
pub mod repositories;
pub mod workflow;

pub use migration::Migrator;
pub use repositories::{
    BankRepository, LedgerRepository, StoreAccessGuard, TenantRepository, UserRepository,
    WalletRepository,
};
pub use workflow::{
    DepositRequest, OpenedAccount, PaymentRequest, RefundRequest, ReviewRequest, Statement,
    WalletEngine, WithdrawalRequest, WorkflowReceipt,
};

use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

use ledgerloop_shared::config::DatabaseConfig;

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}

/// Establishes a pooled connection sized from configuration.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect_with(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);
    Database::connect(options).await
}
