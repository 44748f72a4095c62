//! Authentication Middleware
//!
//! Bearer token verification for routes that sit behind a login.

use crate::error::AuthError;
use crate::extractors::AuthUser;
use crate::handlers::AuthState;
use crate::models::AccessTokenClaims;

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::future::Future;
use std::pin::Pin;

/// Extract and validate the bearer token from the Authorization header
fn validate_token(state: &AuthState, req: &Request) -> Result<AccessTokenClaims, AuthError> {
    let value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::Unauthorized)?;

    let token = value
        .strip_prefix("Bearer ")
        .ok_or(AuthError::Unauthorized)?;

    state.verifier.verify(token)
}

/// Require an authenticated user.
///
/// Verified claims are stored in request extensions for the
/// [`AuthUser`](crate::extractors::AuthUser) extractor.
pub async fn require_auth(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    let claims = validate_token(&state, &req).map_err(IntoResponse::into_response)?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Require one of the given roles.
///
/// Use with `axum::middleware::from_fn_with_state`.
pub fn require_role(
    roles: &'static [&'static str],
) -> impl Fn(State<AuthState>, Request, Next) -> Pin<Box<dyn Future<Output = Result<Response, Response>> + Send>>
       + Clone
       + Send {
    move |State(state): State<AuthState>, mut req: Request, next: Next| {
        Box::pin(async move {
            let claims = validate_token(&state, &req).map_err(IntoResponse::into_response)?;

            let user = AuthUser::from_claims(&claims);
            if !roles.iter().any(|role| user.has_role(role)) {
                tracing::warn!(user_name = %claims.sub, "Role check failed");
                return Err(AuthError::Forbidden.into_response());
            }

            req.extensions_mut().insert(claims);

            Ok(next.run(req).await)
        })
    }
}
