//! Wallet accounts: roles, preconditions, and account numbering.

pub mod error;
pub mod numbering;
pub mod service;
pub mod types;

pub use error::AccountError;
pub use service::AccountService;
pub use types::{AccountType, AccountUpdate, WalletRole, WalletState};
