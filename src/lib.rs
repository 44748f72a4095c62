//! Clinic Authentication
//!
//! Login and token issuance for the clinic scheduling platform:
//! - Credential format validation
//! - Account lookup and password verification through an account directory
//! - Role claims (primary role or the full role set)
//! - Patient reference enrichment for patient logins
//! - HS256 signed JWT access tokens
//!
//! # Configuration
//!
//! Keys are read through a [`ConfigurationSource`]; [`EnvSource`] maps
//! `Jwt:SecretKey` to the `JWT__SECRETKEY` environment variable:
//! - `Jwt:SecretKey` - HMAC signing secret (required)
//! - `Jwt:Issuer` - `iss` claim
//! - `Jwt:Audience` - `aud` claim
//! - `Jwt:ExpiryInMinutes` - token lifetime (required, positive)
//! - `Auth:RolePolicy` - `primary` (default) or `all`
//!
//! # Usage
//!
//! ```rust,ignore
//! use clinic_auth::{AuthModule, Credentials, EnvSource};
//!
//! let module = AuthModule::new();
//! module.activate(db_pool, &EnvSource).await?;
//!
//! let login = module.orchestrator().await.unwrap();
//! let outcome = login.authenticate(&Credentials::new("dr.smith", "secret")).await?;
//! ```

pub mod claims;
pub mod config;
pub mod directory;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod service;
pub mod store;
pub mod token;

// Re-export commonly used types
pub use config::{ConfigurationSource, EnvSource, LoginPolicy, RolePolicy, TokenConfig};
pub use directory::{AccountDirectory, ReferenceLookup};
pub use error::AuthError;
pub use extractors::AuthUser;
pub use handlers::AuthState;
pub use models::*;
pub use service::LoginOrchestrator;
pub use token::{TokenIssuer, TokenVerifier};

use axum::Router;
use sqlx::PgPool;
use std::sync::Arc;
use store::{PgAccountDirectory, PgReferenceLookup};
use tokio::sync::RwLock;

/// Module lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
    Inactive,
    Active,
}

/// Wires the PostgreSQL collaborators, configuration and login pipeline
pub struct AuthModule {
    state: RwLock<ModuleState>,
    auth_state: RwLock<Option<AuthState>>,
}

impl AuthModule {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(ModuleState::Inactive),
            auth_state: RwLock::new(None),
        }
    }

    pub async fn state(&self) -> ModuleState {
        *self.state.read().await
    }

    /// Get the login pipeline
    pub async fn orchestrator(&self) -> Option<Arc<LoginOrchestrator>> {
        self.auth_state
            .read()
            .await
            .as_ref()
            .map(|s| s.orchestrator.clone())
    }

    /// Get authentication routes, once activated
    pub async fn routes(&self) -> Option<Router> {
        self.auth_state.read().await.clone().map(create_routes)
    }

    /// Create tables, load configuration and build the login pipeline.
    ///
    /// Configuration problems fail here rather than on the first login.
    pub async fn activate(
        &self,
        db: PgPool,
        source: &dyn ConfigurationSource,
    ) -> Result<(), AuthError> {
        tracing::info!("Activating clinic authentication");

        let token_config = Arc::new(TokenConfig::load(source)?);
        let policy = LoginPolicy::load(source)?;

        self.run_migrations(&db).await?;

        let references = Arc::new(PgReferenceLookup::new(db.clone()));
        let directory = Arc::new(PgAccountDirectory::new(db));
        let issuer = Arc::new(TokenIssuer::new(token_config, references));
        let orchestrator = Arc::new(LoginOrchestrator::new(directory, issuer, policy));

        *self.auth_state.write().await = Some(AuthState::new(orchestrator));
        *self.state.write().await = ModuleState::Active;

        tracing::info!("Clinic authentication activated");
        Ok(())
    }

    pub async fn deactivate(&self) {
        *self.auth_state.write().await = None;
        *self.state.write().await = ModuleState::Inactive;

        tracing::info!("Clinic authentication deactivated");
    }

    /// Run database migrations
    async fn run_migrations(&self, db: &PgPool) -> Result<(), AuthError> {
        tracing::info!("Running authentication database migrations");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                user_name VARCHAR(256) NOT NULL,
                normalized_user_name VARCHAR(256) NOT NULL UNIQUE,
                password_hash VARCHAR(255) NOT NULL,
                created_at TIMESTAMPTZ DEFAULT NOW(),
                updated_at TIMESTAMPTZ DEFAULT NOW()
            );
            "#,
        )
        .execute(db)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS roles (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                name VARCHAR(256) NOT NULL UNIQUE
            );
            "#,
        )
        .execute(db)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS user_roles (
                user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                role_id UUID NOT NULL REFERENCES roles(id) ON DELETE CASCADE,
                PRIMARY KEY (user_id, role_id)
            );
            "#,
        )
        .execute(db)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS patients (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                reference_id UUID NOT NULL UNIQUE DEFAULT gen_random_uuid(),
                user_id UUID UNIQUE REFERENCES users(id) ON DELETE SET NULL,
                first_name VARCHAR(100) NOT NULL,
                last_name VARCHAR(100) NOT NULL,
                created_at TIMESTAMPTZ DEFAULT NOW()
            );
            "#,
        )
        .execute(db)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_patients_user ON patients(user_id);")
            .execute(db)
            .await?;

        tracing::info!("Authentication migrations completed successfully");
        Ok(())
    }
}

impl Default for AuthModule {
    fn default() -> Self {
        Self::new()
    }
}

/// Create authentication routes
pub fn create_routes(state: AuthState) -> Router {
    handlers::create_routes(state)
}

// ============================================
// Module Tests
// ============================================
