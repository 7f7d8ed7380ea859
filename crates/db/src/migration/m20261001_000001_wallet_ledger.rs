//! Wallet ledger schema: tenants, users, wallets, bank references, entries.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Tenants {
    Table,
    Id,
    Name,
    Key,
    TokenHash,
    AccountPrefix,
    Enabled,
    LastAccountSeq,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Mobile,
    Name,
    Email,
    Enabled,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum WalletAccounts {
    Table,
    Id,
    TenantId,
    MasterTenantId,
    UserId,
    AccountNo,
    AccountPrefix,
    AccountSeq,
    Currency,
    BalanceMinor,
    Role,
    AccountType,
    Enabled,
    AccessTokenHash,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

#[derive(Iden)]
enum BankReferences {
    Table,
    Id,
    BankName,
    Ifsc,
    AccountHolderName,
    AccountNo,
    UtrNo,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum LedgerEntries {
    Table,
    Id,
    Uuid,
    TxnId,
    WalletId,
    Currency,
    AmountMinor,
    EntryType,
    Status,
    Description,
    Utr,
    RelatedUtr,
    Settled,
    BankReferenceId,
    CreatedAt,
    UpdatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tenants::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Tenants::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Tenants::Name).string().not_null().unique_key())
                    .col(ColumnDef::new(Tenants::Key).string().not_null().unique_key())
                    .col(
                        ColumnDef::new(Tenants::TokenHash)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Tenants::AccountPrefix)
                            .string_len(8)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Tenants::Enabled)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Tenants::LastAccountSeq)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Tenants::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Tenants::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Users::Mobile).string().not_null().unique_key())
                    .col(ColumnDef::new(Users::Name).string().not_null())
                    .col(ColumnDef::new(Users::Email).string())
                    .col(
                        ColumnDef::new(Users::Enabled)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Users::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(WalletAccounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WalletAccounts::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(WalletAccounts::TenantId).uuid().not_null())
                    .col(ColumnDef::new(WalletAccounts::MasterTenantId).uuid().unique_key())
                    .col(ColumnDef::new(WalletAccounts::UserId).uuid().unique_key())
                    .col(
                        ColumnDef::new(WalletAccounts::AccountNo)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(WalletAccounts::AccountPrefix)
                            .string_len(8)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WalletAccounts::AccountSeq)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WalletAccounts::Currency)
                            .string_len(3)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WalletAccounts::BalanceMinor)
                            .big_integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(WalletAccounts::BalanceMinor).gte(0)),
                    )
                    .col(ColumnDef::new(WalletAccounts::Role).string_len(16).not_null())
                    .col(
                        ColumnDef::new(WalletAccounts::AccountType)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WalletAccounts::Enabled)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(WalletAccounts::AccessTokenHash)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(WalletAccounts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WalletAccounts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(WalletAccounts::DeletedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-wallet_accounts-tenant_id")
                            .from(WalletAccounts::Table, WalletAccounts::TenantId)
                            .to(Tenants::Table, Tenants::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-wallet_accounts-user_id")
                            .from(WalletAccounts::Table, WalletAccounts::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-wallet_accounts-tenant_id-role")
                    .table(WalletAccounts::Table)
                    .col(WalletAccounts::TenantId)
                    .col(WalletAccounts::Role)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(BankReferences::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BankReferences::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BankReferences::BankName).string().not_null())
                    .col(ColumnDef::new(BankReferences::Ifsc).string_len(11).not_null())
                    .col(
                        ColumnDef::new(BankReferences::AccountHolderName)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(BankReferences::AccountNo).text().not_null())
                    .col(ColumnDef::new(BankReferences::UtrNo).string().unique_key())
                    .col(
                        ColumnDef::new(BankReferences::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BankReferences::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LedgerEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LedgerEntries::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(LedgerEntries::Uuid)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(LedgerEntries::TxnId)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(LedgerEntries::WalletId).uuid().not_null())
                    .col(ColumnDef::new(LedgerEntries::Currency).string_len(3).not_null())
                    .col(
                        ColumnDef::new(LedgerEntries::AmountMinor)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(LedgerEntries::AmountMinor).gt(0)),
                    )
                    .col(ColumnDef::new(LedgerEntries::EntryType).string_len(16).not_null())
                    .col(ColumnDef::new(LedgerEntries::Status).string_len(16).not_null())
                    .col(ColumnDef::new(LedgerEntries::Description).text().not_null())
                    .col(ColumnDef::new(LedgerEntries::Utr).string().not_null())
                    .col(ColumnDef::new(LedgerEntries::RelatedUtr).string())
                    .col(
                        ColumnDef::new(LedgerEntries::Settled)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(LedgerEntries::BankReferenceId).uuid())
                    .col(
                        ColumnDef::new(LedgerEntries::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LedgerEntries::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-ledger_entries-wallet_id")
                            .from(LedgerEntries::Table, LedgerEntries::WalletId)
                            .to(WalletAccounts::Table, WalletAccounts::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-ledger_entries-bank_reference_id")
                            .from(LedgerEntries::Table, LedgerEntries::BankReferenceId)
                            .to(BankReferences::Table, BankReferences::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-ledger_entries-utr-entry_type")
                    .table(LedgerEntries::Table)
                    .col(LedgerEntries::Utr)
                    .col(LedgerEntries::EntryType)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-ledger_entries-wallet_id-created_at")
                    .table(LedgerEntries::Table)
                    .col(LedgerEntries::WalletId)
                    .col(LedgerEntries::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-ledger_entries-related_utr")
                    .table(LedgerEntries::Table)
                    .col(LedgerEntries::RelatedUtr)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LedgerEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BankReferences::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(WalletAccounts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tenants::Table).to_owned())
            .await?;
        Ok(())
    }
}
