//! `SeaORM` Entity for ledger_entries table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{EntryStatus, EntryType};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "ledger_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(column_name = "uuid", unique)]
    pub entry_uuid: Uuid,
    #[sea_orm(unique)]
    pub txn_id: String,
    pub wallet_id: Uuid,
    pub currency: String,
    /// Amount in minor units (two decimals), always positive.
    pub amount_minor: i64,
    pub entry_type: EntryType,
    pub status: EntryStatus,
    pub description: String,
    pub utr: String,
    pub related_utr: Option<String>,
    pub settled: bool,
    pub bank_reference_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::wallet_accounts::Entity",
        from = "Column::WalletId",
        to = "super::wallet_accounts::Column::Id"
    )]
    WalletAccounts,
    #[sea_orm(
        belongs_to = "super::bank_references::Entity",
        from = "Column::BankReferenceId",
        to = "super::bank_references::Column::Id"
    )]
    BankReferences,
}

impl Related<super::wallet_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WalletAccounts.def()
    }
}

impl Related<super::bank_references::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BankReferences.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
