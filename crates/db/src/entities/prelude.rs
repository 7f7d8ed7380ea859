//! Entity re-exports.

pub use super::bank_references::Entity as BankReferences;
pub use super::ledger_entries::Entity as LedgerEntries;
pub use super::tenants::Entity as Tenants;
pub use super::users::Entity as Users;
pub use super::wallet_accounts::Entity as WalletAccounts;
