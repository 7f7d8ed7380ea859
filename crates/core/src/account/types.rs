//! Wallet account domain types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use ledgerloop_shared::types::{TenantId, WalletId};

/// Role of a wallet within its tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WalletRole {
    /// The tenant's own wallet; exactly one per tenant.
    Master,
    /// An end user's wallet.
    Regular,
}

impl WalletRole {
    /// Returns the string representation of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Master => "MASTER",
            Self::Regular => "REGULAR",
        }
    }

    /// Parses a role from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "MASTER" => Some(Self::Master),
            "REGULAR" => Some(Self::Regular),
            _ => None,
        }
    }
}

impl fmt::Display for WalletRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Regulatory category of a wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    /// Usable only within the issuing tenant.
    Closed,
    /// Usable with the tenant and its partner merchants.
    SemiClosed,
}

impl AccountType {
    /// Returns the string representation of the account type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Closed => "CLOSED",
            Self::SemiClosed => "SEMI_CLOSED",
        }
    }

    /// Parses an account type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "CLOSED" => Some(Self::Closed),
            "SEMI_CLOSED" => Some(Self::SemiClosed),
            _ => None,
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The facts about a wallet that access and sufficiency checks need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletState {
    /// Wallet id.
    pub id: WalletId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Human-readable account number.
    pub account_no: String,
    /// Role.
    pub role: WalletRole,
    /// Whether the wallet may transact.
    pub enabled: bool,
    /// Whether the wallet has been soft-deleted.
    pub deleted: bool,
    /// Cached balance.
    pub balance: Decimal,
    /// Currency code.
    pub currency: String,
}

/// Fields an account-management call may change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountUpdate {
    /// New enabled flag.
    pub enabled: Option<bool>,
    /// New account type.
    pub account_type: Option<AccountType>,
}

impl AccountUpdate {
    /// True when nothing would change.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.enabled.is_none() && self.account_type.is_none()
    }
}
