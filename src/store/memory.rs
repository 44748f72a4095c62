//! In-memory collaborators

use super::{hash_password, verify_password};
use crate::directory::{normalize_user_name, AccountDirectory, ReferenceLookup};
use crate::error::AuthError;
use crate::models::{Account, ClinicalRecord};

use argon2::Params;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct StoredAccount {
    account: Account,
    password_hash: String,
    roles: Vec<String>,
}

/// Account directory held in process memory, keyed by normalized user name
#[derive(Debug)]
pub struct InMemoryDirectory {
    accounts: RwLock<HashMap<String, StoredAccount>>,
    params: Params,
    password_checks: AtomicUsize,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::with_params(Params::default())
    }

    /// Use specific Argon2 cost parameters for stored hashes
    pub fn with_params(params: Params) -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            params,
            password_checks: AtomicUsize::new(0),
        }
    }

    /// Add or replace an account
    pub async fn insert(
        &self,
        user_name: &str,
        password: &str,
        roles: &[&str],
    ) -> Result<Account, AuthError> {
        let account = Account {
            id: Uuid::new_v4(),
            user_name: user_name.to_string(),
        };
        let stored = StoredAccount {
            account: account.clone(),
            password_hash: hash_password(password, self.params.clone())?,
            roles: roles.iter().map(|r| r.to_string()).collect(),
        };

        self.accounts
            .write()
            .await
            .insert(normalize_user_name(user_name), stored);

        Ok(account)
    }

    /// Number of `check_password` calls served
    pub fn password_checks(&self) -> usize {
        self.password_checks.load(Ordering::Relaxed)
    }
}

impl Default for InMemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountDirectory for InMemoryDirectory {
    async fn find_by_name(&self, user_name: &str) -> Result<Option<Account>, AuthError> {
        let accounts = self.accounts.read().await;
        Ok(accounts
            .get(&normalize_user_name(user_name))
            .map(|stored| stored.account.clone()))
    }

    async fn check_password(&self, account: &Account, password: &str) -> Result<bool, AuthError> {
        self.password_checks.fetch_add(1, Ordering::Relaxed);

        let accounts = self.accounts.read().await;
        match accounts.get(&normalize_user_name(&account.user_name)) {
            Some(stored) if stored.account.id == account.id => {
                verify_password(password, &stored.password_hash)
            }
            _ => Ok(false),
        }
    }

    async fn roles(&self, account: &Account) -> Result<Vec<String>, AuthError> {
        let accounts = self.accounts.read().await;
        Ok(accounts
            .get(&normalize_user_name(&account.user_name))
            .map(|stored| stored.roles.clone())
            .unwrap_or_default())
    }
}

/// Patient records held in process memory
#[derive(Debug, Default)]
pub struct InMemoryReferences {
    records: RwLock<HashMap<String, Vec<ClinicalRecord>>>,
}

impl InMemoryReferences {
    pub fn new() -> Self {
        Self::default()
    }

    /// Link a clinical record to a user name
    pub async fn insert(&self, user_name: &str, reference_id: Uuid) {
        self.records
            .write()
            .await
            .entry(normalize_user_name(user_name))
            .or_default()
            .push(ClinicalRecord { reference_id });
    }
}

#[async_trait]
impl ReferenceLookup for InMemoryReferences {
    async fn find_by_username(&self, user_name: &str) -> Result<Option<ClinicalRecord>, AuthError> {
        let records = self.records.read().await;
        match records.get(&normalize_user_name(user_name)).map(Vec::as_slice) {
            None | Some([]) => Ok(None),
            Some([record]) => Ok(Some(*record)),
            Some(_) => Err(AuthError::Collaborator(format!(
                "multiple clinical records linked to '{user_name}'"
            ))),
        }
    }
}
