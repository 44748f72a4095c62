//! Login Orchestration
//!
//! Validates credentials against the account directory and hands verified
//! identities to the [`TokenIssuer`]. Rejected credentials come back as
//! [`AuthOutcome::Failure`]; only infrastructure and configuration problems
//! are returned as `Err`.

use crate::config::{LoginPolicy, RolePolicy};
use crate::directory::AccountDirectory;
use crate::error::AuthError;
use crate::models::*;
use crate::token::TokenIssuer;

use std::sync::Arc;

pub const USER_DOES_NOT_EXIST: &str = "User does not exist.";
pub const INVALID_PASSWORD: &str = "Invalid password.";

/// Login pipeline
pub struct LoginOrchestrator {
    directory: Arc<dyn AccountDirectory>,
    issuer: Arc<TokenIssuer>,
    policy: LoginPolicy,
}

impl LoginOrchestrator {
    pub fn new(
        directory: Arc<dyn AccountDirectory>,
        issuer: Arc<TokenIssuer>,
        policy: LoginPolicy,
    ) -> Self {
        Self {
            directory,
            issuer,
            policy,
        }
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    /// Authenticate a user and issue a token.
    ///
    /// Format errors, an unknown user name and a wrong password are collected
    /// together. A token is issued only when none were found.
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<AuthOutcome, AuthError> {
        let mut errors = credentials.format_errors();

        let account = self.directory.find_by_name(&credentials.user_name).await?;
        match &account {
            None => errors.push(ValidationError::new(USER_NAME_PROPERTY, USER_DOES_NOT_EXIST)),
            Some(account) => {
                if !self
                    .directory
                    .check_password(account, &credentials.password)
                    .await?
                {
                    errors.push(ValidationError::new(PASSWORD_PROPERTY, INVALID_PASSWORD));
                }
            }
        }

        let account = match account {
            Some(account) if errors.is_empty() => account,
            _ => {
                tracing::warn!(
                    user_name = %credentials.user_name,
                    error_count = errors.len(),
                    "Login rejected"
                );
                return Ok(AuthOutcome::Failure { errors });
            }
        };

        let roles = self.select_roles(self.directory.roles(&account).await?);
        if roles.is_empty() {
            tracing::error!(account_id = %account.id, "Account has no role");
            return Err(AuthError::NoRoleAssigned(credentials.user_name.clone()));
        }

        let token = self.issuer.issue(&credentials.user_name, &roles).await?;

        tracing::info!(
            account_id = %account.id,
            roles = ?roles,
            expires_at = %token.expires_at,
            "Access token issued"
        );

        Ok(AuthOutcome::Success { token })
    }

    /// Deduplicate and order roles ordinally, then apply the role policy
    fn select_roles(&self, mut roles: Vec<String>) -> Vec<String> {
        roles.sort();
        roles.dedup();

        match self.policy.role_policy {
            RolePolicy::Primary => roles.into_iter().take(1).collect(),
            RolePolicy::All => roles,
        }
    }
}
