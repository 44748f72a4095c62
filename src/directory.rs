//! Collaborator contracts
//!
//! The login pipeline only reads through these traits. Implementations live
//! in [`crate::store`].

use crate::error::AuthError;
use crate::models::{Account, ClinicalRecord};
use async_trait::async_trait;

/// Canonical form for user-name comparison.
///
/// Lookups match case-insensitively: both the stored and the requested
/// name are compared in this form.
pub fn normalize_user_name(user_name: &str) -> String {
    user_name.to_uppercase()
}

/// Account, password and role storage
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// Find an account by user name
    async fn find_by_name(&self, user_name: &str) -> Result<Option<Account>, AuthError>;

    /// Check a candidate password against the stored credential
    async fn check_password(&self, account: &Account, password: &str) -> Result<bool, AuthError>;

    /// Role names held by the account
    async fn roles(&self, account: &Account) -> Result<Vec<String>, AuthError>;
}

/// Clinical record lookup used for token enrichment
#[async_trait]
pub trait ReferenceLookup: Send + Sync {
    /// Find the single clinical record linked to a user name
    async fn find_by_username(&self, user_name: &str) -> Result<Option<ClinicalRecord>, AuthError>;
}
