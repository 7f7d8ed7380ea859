//! Collaborator interfaces the workflow engine consumes.
//!
//! Tenant lookup, user lookup, access checks and field encryption are owned
//! by other parts of the system; the engine only sees these traits.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use ledgerloop_shared::types::{TenantId, UserId};
use ledgerloop_shared::{AesGcmCipher, CipherError};

use crate::account::AccountError;
use crate::workflow::WorkflowError;

/// A tenant ("system") as seen by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantProfile {
    /// Tenant id.
    pub id: TenantId,
    /// Display name.
    pub name: String,
    /// API key.
    pub key: String,
    /// Account number prefix.
    pub account_prefix: String,
    /// Whether the tenant may transact.
    pub enabled: bool,
}

/// An end user as seen by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// User id.
    pub id: UserId,
    /// Mobile number, unique per user.
    pub mobile: String,
    /// Display name.
    pub name: String,
    /// Optional email.
    pub email: Option<String>,
    /// Whether the user is active.
    pub enabled: bool,
}

/// Contact details used to find or create a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDetails {
    /// Mobile number.
    pub mobile: String,
    /// Display name.
    pub name: String,
    /// Optional email.
    pub email: Option<String>,
    /// Whether a newly created user starts enabled.
    pub enabled: bool,
}

impl ContactDetails {
    /// Validates and normalizes the contact details.
    pub fn normalized(&self) -> Result<Self, AccountError> {
        let mobile: String = self.mobile.chars().filter(|c| !c.is_whitespace()).collect();
        let digits = mobile.strip_prefix('+').unwrap_or(&mobile);
        if !(10..=15).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(AccountError::InvalidContact(format!(
                "invalid mobile number {:?}",
                self.mobile
            )));
        }

        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(AccountError::InvalidContact("name is required".to_string()));
        }

        let email = self
            .email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_lowercase);
        if email.as_deref().is_some_and(|e| !e.contains('@')) {
            return Err(AccountError::InvalidContact("invalid email".to_string()));
        }

        Ok(Self {
            mobile,
            name,
            email,
            enabled: self.enabled,
        })
    }
}

/// Tenant directory.
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    /// Resolves a tenant from its API credentials.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::Forbidden` for wrong credentials or a disabled tenant.
    async fn lookup_by_credentials(
        &self,
        key: &str,
        token: &str,
    ) -> Result<TenantProfile, WorkflowError>;

    /// Returns the tenant's account number prefix.
    async fn account_prefix(&self, tenant: TenantId) -> Result<String, WorkflowError>;
}

/// User directory.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Finds the user with the given mobile number or creates one.
    async fn find_or_create_by_contact(
        &self,
        contact: &ContactDetails,
    ) -> Result<UserProfile, WorkflowError>;
}

/// Yes/no access checks.
#[async_trait]
pub trait AccessGuard: Send + Sync {
    /// True if the credentials belong to an enabled tenant.
    async fn is_system_authorized(&self, key: &str, token: &str) -> Result<bool, WorkflowError>;

    /// True if `token` is the access token of the enabled wallet `account_no`.
    async fn is_wallet_authorized(
        &self,
        account_no: &str,
        token: &str,
    ) -> Result<bool, WorkflowError>;

    /// True if the calling tenant owns the master wallet of the tenant that
    /// owns the wallet the UTR's entries are booked against.
    async fn is_approving_system_for_utr(
        &self,
        utr: &str,
        key: &str,
        token: &str,
    ) -> Result<bool, WorkflowError>;
}

/// Opaque encryption for sensitive fields.
pub trait FieldCipher: Send + Sync {
    /// Encrypts a value for storage.
    fn encrypt(&self, plaintext: &str) -> Result<String, CipherError>;

    /// Decrypts a stored value.
    fn decrypt(&self, ciphertext: &str) -> Result<String, CipherError>;
}

impl FieldCipher for AesGcmCipher {
    fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        AesGcmCipher::encrypt(self, plaintext)
    }

    fn decrypt(&self, ciphertext: &str) -> Result<String, CipherError> {
        AesGcmCipher::decrypt(self, ciphertext)
    }
}
