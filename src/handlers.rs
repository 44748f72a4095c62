//! Authentication HTTP Handlers
//!
//! REST API endpoints for authentication operations.

use crate::error::AuthError;
use crate::extractors::AuthUser;
use crate::middleware;
use crate::models::*;
use crate::service::LoginOrchestrator;
use crate::token::TokenVerifier;

use axum::{
    extract::State,
    http::StatusCode,
    middleware as axum_middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared state for the auth routes
#[derive(Clone)]
pub struct AuthState {
    pub orchestrator: Arc<LoginOrchestrator>,
    pub verifier: Arc<TokenVerifier>,
}

impl AuthState {
    pub fn new(orchestrator: Arc<LoginOrchestrator>) -> Self {
        let verifier = Arc::new(TokenVerifier::new(orchestrator.issuer().config()));
        Self {
            orchestrator,
            verifier,
        }
    }
}

// ============================================
// Route Builder
// ============================================

/// Create authentication routes
pub fn create_routes(state: AuthState) -> Router {
    let public = Router::new().route("/auth/login", post(login));

    let protected = Router::new()
        .route("/auth/me", get(get_current_user))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================
// Login
// ============================================

/// POST /auth/login
///
/// Validate credentials and return a signed access token, or the list of
/// field errors that prevented it.
pub async fn login(
    State(state): State<AuthState>,
    Json(credentials): Json<Credentials>,
) -> Result<impl IntoResponse, AuthError> {
    let outcome = state.orchestrator.authenticate(&credentials).await?;

    let status = if outcome.is_success() {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };

    Ok((status, Json(LoginResponse::from(outcome))))
}

// ============================================
// User Profile
// ============================================

/// GET /auth/me
///
/// Identity carried by the presented token
pub async fn get_current_user(user: AuthUser) -> Result<impl IntoResponse, AuthError> {
    Ok(Json(serde_json::json!({
        "user": {
            "userName": user.user_name,
            "roles": user.roles,
            "patientReferenceId": user.patient_reference_id,
            "isPatient": user.is_patient()
        }
    })))
}
