//! Authentication Extractors
//!
//! Axum extractors for the identity carried by a verified access token.

use crate::error::AuthError;
use crate::models::AccessTokenClaims;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Response},
};

/// Authenticated user information extracted from JWT claims
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_name: String,
    pub roles: Vec<String>,
    pub patient_reference_id: Option<String>,
}

impl AuthUser {
    /// Create user from JWT claims
    pub fn from_claims(claims: &AccessTokenClaims) -> Self {
        Self {
            user_name: claims.sub.clone(),
            roles: claims.role.to_vec(),
            patient_reference_id: claims.patient_reference_id.clone(),
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Whether the login is linked to a patient record
    pub fn is_patient(&self) -> bool {
        self.patient_reference_id.is_some()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Claims are placed here by `require_auth` / `require_role`
        parts
            .extensions
            .get::<AccessTokenClaims>()
            .map(AuthUser::from_claims)
            .ok_or_else(|| AuthError::Unauthorized.into_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RoleClaim;

    fn claims(role: RoleClaim, reference: Option<&str>) -> AccessTokenClaims {
        AccessTokenClaims {
            sub: "jane.patient".to_string(),
            unique_name: "jane.patient".to_string(),
            role,
            jti: "b0a5e6a2-4c1f-4f63-9d8e-1f0f2f7f0a11".to_string(),
            patient_reference_id: reference.map(str::to_string),
            exp: 0,
            iss: "dental-system".to_string(),
            aud: "dental-clients".to_string(),
            iat: 0,
        }
    }

    #[test]
    fn test_from_claims() {
        let user = AuthUser::from_claims(&claims(
            RoleClaim::One("Patient".to_string()),
            Some("7d1b8a56-1d0c-4c55-9d8c-2d3b7c0e4a9f"),
        ));
        assert_eq!(user.user_name, "jane.patient");
        assert!(user.has_role("Patient"));
        assert!(!user.has_role("Dentist"));
        assert!(user.is_patient());

        let staff = AuthUser::from_claims(&claims(
            RoleClaim::Many(vec!["Admin".to_string(), "Dentist".to_string()]),
            None,
        ));
        assert!(staff.has_role("Dentist"));
        assert!(!staff.is_patient());
    }
}
