//! Token issuance and verification
//!
//! Tokens are compact HS256 JWS values:
//! `base64url(header).base64url(payload).base64url(hmac)`.
//!
//! The payload carries, in order: `sub`, `unique_name`, `role` (one entry per
//! role), `jti`, the optional `PatientReferenceId`, then `exp`, `iss`, `aud`
//! and `iat`.

use crate::claims::{ClaimSet, JWT_ID, PATIENT_REFERENCE_ID, ROLE, SUBJECT, UNIQUE_NAME};
use crate::config::TokenConfig;
use crate::directory::ReferenceLookup;
use crate::error::AuthError;
use crate::models::{AccessTokenClaims, IssuedToken};

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

/// Builds and signs access tokens
pub struct TokenIssuer {
    config: Arc<TokenConfig>,
    references: Arc<dyn ReferenceLookup>,
}

impl TokenIssuer {
    pub fn new(config: Arc<TokenConfig>, references: Arc<dyn ReferenceLookup>) -> Self {
        Self { config, references }
    }

    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    /// Issue a token for an authenticated user.
    ///
    /// `roles` must be non-empty and already in the order they should appear.
    pub async fn issue(&self, user_name: &str, roles: &[String]) -> Result<IssuedToken, AuthError> {
        self.config.validate()?;

        if roles.is_empty() {
            return Err(AuthError::NoRoleAssigned(user_name.to_string()));
        }

        let record = self.references.find_by_username(user_name).await?;
        if let Some(record) = &record {
            tracing::debug!(
                user_name = %user_name,
                reference_id = %record.reference_id,
                "Adding patient reference claim"
            );
        }

        let claims = ClaimSet::builder()
            .claim(SUBJECT, user_name)
            .claim(UNIQUE_NAME, user_name)
            .claims(ROLE, roles.iter().map(String::as_str))
            .claim(JWT_ID, Uuid::new_v4().to_string())
            .claim_if_some(
                PATIENT_REFERENCE_ID,
                record.map(|r| r.reference_id.to_string()),
            )
            .build();

        self.sign(&claims)
    }

    /// Sign an assembled claim set, adding the registered time and party claims
    fn sign(&self, claims: &ClaimSet) -> Result<IssuedToken, AuthError> {
        self.config.validate()?;

        let now = Utc::now();
        let expires_at = Duration::try_minutes(self.config.expiry_minutes)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| AuthError::Config("token lifetime is out of range".to_string()))?;

        let mut payload = claims.to_json_map();
        payload.insert("exp".to_string(), Value::from(expires_at.timestamp()));
        payload.insert("iss".to_string(), Value::from(self.config.issuer.clone()));
        payload.insert("aud".to_string(), Value::from(self.config.audience.clone()));
        payload.insert("iat".to_string(), Value::from(now.timestamp()));

        let key = EncodingKey::from_secret(self.config.secret_key.as_bytes());
        let serialized = encode(&Header::new(Algorithm::HS256), &payload, &key)
            .map_err(|e| AuthError::Signing(e.to_string()))?;

        Ok(IssuedToken {
            serialized,
            expires_at,
        })
    }
}

/// Validates tokens produced by [`TokenIssuer`]
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(config: &TokenConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&config.issuer]);
        validation.set_audience(&[&config.audience]);

        Self {
            decoding_key: DecodingKey::from_secret(config.secret_key.as_bytes()),
            validation,
        }
    }

    /// Check signature, expiry, issuer and audience
    pub fn verify(&self, token: &str) -> Result<AccessTokenClaims, AuthError> {
        let token_data = decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation)?;
        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RoleClaim;
    use crate::store::InMemoryReferences;

    fn config() -> TokenConfig {
        TokenConfig {
            secret_key: "clinic-test-secret-with-enough-length".to_string(),
            issuer: "dental-system".to_string(),
            audience: "dental-clients".to_string(),
            expiry_minutes: 30,
        }
    }

    fn issuer_with(config: TokenConfig, references: InMemoryReferences) -> TokenIssuer {
        TokenIssuer::new(Arc::new(config), Arc::new(references))
    }

    fn roles(names: &[&str]) -> Vec<String> {
        names.iter().map(|r| r.to_string()).collect()
    }

    #[test]
    fn test_issue_and_verify() {
        let issuer = issuer_with(config(), InMemoryReferences::new());
        let before = Utc::now().timestamp();
        let token = tokio_test::block_on(issuer.issue("dr.smith", &roles(&["Dentist"]))).unwrap();

        assert_eq!(token.serialized.split('.').count(), 3);

        let claims = TokenVerifier::new(&config()).verify(&token.serialized).unwrap();
        assert_eq!(claims.sub, "dr.smith");
        assert_eq!(claims.unique_name, "dr.smith");
        assert_eq!(claims.role, RoleClaim::One("Dentist".to_string()));
        assert_eq!(claims.iss, "dental-system");
        assert_eq!(claims.aud, "dental-clients");
        assert!(claims.patient_reference_id.is_none());
        assert!(Uuid::parse_str(&claims.jti).is_ok());

        let expected_exp = before + 30 * 60;
        assert!((claims.exp - expected_exp).abs() <= 2);
        assert_eq!(claims.exp, token.expires_at.timestamp());
    }

    #[test]
    fn test_header_and_payload_layout() {
        let references = InMemoryReferences::new();
        let reference_id = Uuid::new_v4();
        tokio_test::block_on(references.insert("patient.one", reference_id));

        let issuer = issuer_with(config(), references);
        let token = tokio_test::block_on(issuer.issue("Patient.One", &roles(&["Patient"]))).unwrap();

        let header = jsonwebtoken::decode_header(&token.serialized).unwrap();
        assert_eq!(header.alg, Algorithm::HS256);
        assert_eq!(header.typ.as_deref(), Some("JWT"));

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&["dental-clients"]);
        let payload = decode::<serde_json::Map<String, Value>>(
            &token.serialized,
            &DecodingKey::from_secret(config().secret_key.as_bytes()),
            &validation,
        )
        .unwrap()
        .claims;

        let keys: Vec<&str> = payload.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            [
                "sub",
                "unique_name",
                "role",
                "jti",
                "PatientReferenceId",
                "exp",
                "iss",
                "aud",
                "iat"
            ]
        );
        assert_eq!(payload["PatientReferenceId"], reference_id.to_string());
    }

    #[test]
    fn test_jti_is_unique_per_token() {
        let issuer = issuer_with(config(), InMemoryReferences::new());
        let verifier = TokenVerifier::new(&config());

        let first = tokio_test::block_on(issuer.issue("nurse", &roles(&["Nurse"]))).unwrap();
        let second = tokio_test::block_on(issuer.issue("nurse", &roles(&["Nurse"]))).unwrap();

        assert_ne!(first.serialized, second.serialized);
        assert_ne!(
            verifier.verify(&first.serialized).unwrap().jti,
            verifier.verify(&second.serialized).unwrap().jti
        );
    }

    #[test]
    fn test_multiple_roles_are_additive() {
        let issuer = issuer_with(config(), InMemoryReferences::new());
        let token =
            tokio_test::block_on(issuer.issue("admin", &roles(&["Admin", "Dentist"]))).unwrap();

        let claims = TokenVerifier::new(&config()).verify(&token.serialized).unwrap();
        assert_eq!(
            claims.role,
            RoleClaim::Many(vec!["Admin".to_string(), "Dentist".to_string()])
        );
    }

    #[test]
    fn test_empty_secret_is_config_error() {
        let mut bad = config();
        bad.secret_key = String::new();
        let issuer = issuer_with(bad, InMemoryReferences::new());

        let result = tokio_test::block_on(issuer.issue("dr.smith", &roles(&["Dentist"])));
        assert!(matches!(result, Err(AuthError::Config(_))));
    }

    #[test]
    fn test_non_positive_expiry_is_config_error() {
        let mut bad = config();
        bad.expiry_minutes = 0;
        let issuer = issuer_with(bad, InMemoryReferences::new());

        let result = tokio_test::block_on(issuer.issue("dr.smith", &roles(&["Dentist"])));
        assert!(matches!(result, Err(AuthError::Config(_))));

        let mut huge = config();
        huge.expiry_minutes = i64::MAX;
        let issuer = issuer_with(huge, InMemoryReferences::new());
        let result = tokio_test::block_on(issuer.issue("dr.smith", &roles(&["Dentist"])));
        assert!(matches!(result, Err(AuthError::Config(_))));
    }

    #[test]
    fn test_no_roles_rejected() {
        let issuer = issuer_with(config(), InMemoryReferences::new());
        let result = tokio_test::block_on(issuer.issue("ghost", &[]));
        assert!(matches!(result, Err(AuthError::NoRoleAssigned(_))));
    }

    #[test]
    fn test_verifier_rejects_foreign_tokens() {
        let issuer = issuer_with(config(), InMemoryReferences::new());
        let token = tokio_test::block_on(issuer.issue("dr.smith", &roles(&["Dentist"]))).unwrap();

        let mut other = config();
        other.secret_key = "a-completely-different-signing-secret".to_string();
        assert!(matches!(
            TokenVerifier::new(&other).verify(&token.serialized),
            Err(AuthError::InvalidToken)
        ));

        let mut other = config();
        other.audience = "billing".to_string();
        assert!(TokenVerifier::new(&other).verify(&token.serialized).is_err());

        assert!(TokenVerifier::new(&config()).verify("not.a.token").is_err());
    }
}
