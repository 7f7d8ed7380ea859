//! `SeaORM` entity definitions.

pub mod prelude;

pub mod bank_references;
pub mod ledger_entries;
pub mod sea_orm_active_enums;
pub mod tenants;
pub mod users;
pub mod wallet_accounts;
