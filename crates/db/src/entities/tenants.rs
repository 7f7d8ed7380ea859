//! `SeaORM` Entity for tenants table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "tenants")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub name: String,
    #[sea_orm(unique)]
    pub key: String,
    #[sea_orm(unique)]
    pub token_hash: String,
    #[sea_orm(unique)]
    pub account_prefix: String,
    pub enabled: bool,
    pub last_account_seq: i64,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::wallet_accounts::Entity")]
    WalletAccounts,
}

impl Related<super::wallet_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WalletAccounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
