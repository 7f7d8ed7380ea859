//! `SeaORM` active enums.
//!
//! Stored as short strings so the schema is portable across Postgres and
//! SQLite. Each enum converts to and from its `ledgerloop-core` counterpart.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use ledgerloop_core::account as core_account;
use ledgerloop_core::ledger as core_ledger;

/// Wallet role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum WalletRole {
    /// Tenant master wallet.
    #[sea_orm(string_value = "MASTER")]
    Master,
    /// End-user wallet.
    #[sea_orm(string_value = "REGULAR")]
    Regular,
}

/// Wallet account type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum AccountType {
    /// Closed wallet.
    #[sea_orm(string_value = "CLOSED")]
    Closed,
    /// Semi-closed wallet.
    #[sea_orm(string_value = "SEMI_CLOSED")]
    SemiClosed,
}

/// Ledger entry type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum EntryType {
    /// CREDIT.
    #[sea_orm(string_value = "CREDIT")]
    Credit,
    /// DEBIT.
    #[sea_orm(string_value = "DEBIT")]
    Debit,
    /// REFUND:CREDIT.
    #[sea_orm(string_value = "REFUND:CREDIT")]
    RefundCredit,
    /// REFUND:DEBIT.
    #[sea_orm(string_value = "REFUND:DEBIT")]
    RefundDebit,
    /// WITHDRAW:CREDIT.
    #[sea_orm(string_value = "WITHDRAW:CREDIT")]
    WithdrawCredit,
    /// WITHDRAW:DEBIT.
    #[sea_orm(string_value = "WITHDRAW:DEBIT")]
    WithdrawDebit,
}

/// Ledger entry status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum EntryStatus {
    /// PENDING.
    #[sea_orm(string_value = "PENDING")]
    Pending,
    /// SUCCESS.
    #[sea_orm(string_value = "SUCCESS")]
    Success,
    /// FAILURE.
    #[sea_orm(string_value = "FAILURE")]
    Failure,
    /// APPROVED.
    #[sea_orm(string_value = "APPROVED")]
    Approved,
    /// REJECTED.
    #[sea_orm(string_value = "REJECTED")]
    Rejected,
}

impl From<core_account::WalletRole> for WalletRole {
    fn from(role: core_account::WalletRole) -> Self {
        match role {
            core_account::WalletRole::Master => Self::Master,
            core_account::WalletRole::Regular => Self::Regular,
        }
    }
}

impl From<WalletRole> for core_account::WalletRole {
    fn from(role: WalletRole) -> Self {
        match role {
            WalletRole::Master => Self::Master,
            WalletRole::Regular => Self::Regular,
        }
    }
}

impl From<core_account::AccountType> for AccountType {
    fn from(account_type: core_account::AccountType) -> Self {
        match account_type {
            core_account::AccountType::Closed => Self::Closed,
            core_account::AccountType::SemiClosed => Self::SemiClosed,
        }
    }
}

impl From<AccountType> for core_account::AccountType {
    fn from(account_type: AccountType) -> Self {
        match account_type {
            AccountType::Closed => Self::Closed,
            AccountType::SemiClosed => Self::SemiClosed,
        }
    }
}

impl From<core_ledger::EntryType> for EntryType {
    fn from(entry_type: core_ledger::EntryType) -> Self {
        match entry_type {
            core_ledger::EntryType::Credit => Self::Credit,
            core_ledger::EntryType::Debit => Self::Debit,
            core_ledger::EntryType::RefundCredit => Self::RefundCredit,
            core_ledger::EntryType::RefundDebit => Self::RefundDebit,
            core_ledger::EntryType::WithdrawCredit => Self::WithdrawCredit,
            core_ledger::EntryType::WithdrawDebit => Self::WithdrawDebit,
        }
    }
}

impl From<EntryType> for core_ledger::EntryType {
    fn from(entry_type: EntryType) -> Self {
        match entry_type {
            EntryType::Credit => Self::Credit,
            EntryType::Debit => Self::Debit,
            EntryType::RefundCredit => Self::RefundCredit,
            EntryType::RefundDebit => Self::RefundDebit,
            EntryType::WithdrawCredit => Self::WithdrawCredit,
            EntryType::WithdrawDebit => Self::WithdrawDebit,
        }
    }
}

impl From<core_ledger::EntryStatus> for EntryStatus {
    fn from(status: core_ledger::EntryStatus) -> Self {
        match status {
            core_ledger::EntryStatus::Pending => Self::Pending,
            core_ledger::EntryStatus::Success => Self::Success,
            core_ledger::EntryStatus::Failure => Self::Failure,
            core_ledger::EntryStatus::Approved => Self::Approved,
            core_ledger::EntryStatus::Rejected => Self::Rejected,
        }
    }
}

impl From<EntryStatus> for core_ledger::EntryStatus {
    fn from(status: EntryStatus) -> Self {
        match status {
            EntryStatus::Pending => Self::Pending,
            EntryStatus::Success => Self::Success,
            EntryStatus::Failure => Self::Failure,
            EntryStatus::Approved => Self::Approved,
            EntryStatus::Rejected => Self::Rejected,
        }
    }
}
