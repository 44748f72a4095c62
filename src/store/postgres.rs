//! PostgreSQL collaborators
//!
//! Tables are created by [`AuthModule::activate`](crate::AuthModule::activate).
//! User names are matched on `normalized_user_name`.

use super::verify_password;
use crate::directory::{normalize_user_name, AccountDirectory, ReferenceLookup};
use crate::error::AuthError;
use crate::models::{Account, ClinicalRecord};

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

/// Account directory backed by the `users`, `roles` and `user_roles` tables
#[derive(Debug, Clone)]
pub struct PgAccountDirectory {
    db: PgPool,
}

impl PgAccountDirectory {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AccountDirectory for PgAccountDirectory {
    async fn find_by_name(&self, user_name: &str) -> Result<Option<Account>, AuthError> {
        let row: Option<(Uuid, String)> =
            sqlx::query_as("SELECT id, user_name FROM users WHERE normalized_user_name = $1")
                .bind(normalize_user_name(user_name))
                .fetch_optional(&self.db)
                .await?;

        Ok(row.map(|(id, user_name)| Account { id, user_name }))
    }

    async fn check_password(&self, account: &Account, password: &str) -> Result<bool, AuthError> {
        let hash: Option<(String,)> =
            sqlx::query_as("SELECT password_hash FROM users WHERE id = $1")
                .bind(account.id)
                .fetch_optional(&self.db)
                .await?;

        match hash {
            Some((hash,)) => verify_password(password, &hash),
            None => Ok(false),
        }
    }

    async fn roles(&self, account: &Account) -> Result<Vec<String>, AuthError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT r.name FROM roles r
            INNER JOIN user_roles ur ON ur.role_id = r.id
            WHERE ur.user_id = $1
            ORDER BY r.name
            "#,
        )
        .bind(account.id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(|(name,)| name).collect())
    }
}

/// Patient reference lookup backed by the `patients` table
#[derive(Debug, Clone)]
pub struct PgReferenceLookup {
    db: PgPool,
}

impl PgReferenceLookup {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ReferenceLookup for PgReferenceLookup {
    async fn find_by_username(&self, user_name: &str) -> Result<Option<ClinicalRecord>, AuthError> {
        // Two rows are enough to detect an ambiguous link
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT p.reference_id FROM patients p
            INNER JOIN users u ON u.id = p.user_id
            WHERE u.normalized_user_name = $1
            LIMIT 2
            "#,
        )
        .bind(normalize_user_name(user_name))
        .fetch_all(&self.db)
        .await?;

        match rows.as_slice() {
            [] => Ok(None),
            [(reference_id,)] => Ok(Some(ClinicalRecord {
                reference_id: *reference_id,
            })),
            _ => Err(AuthError::Collaborator(format!(
                "multiple clinical records linked to '{user_name}'"
            ))),
        }
    }
}
