//! Authentication Models
//!
//! Login input, outcomes, directory records and decoded token claims.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

// ============================================
// Directory Records
// ============================================

/// Account resolved by an [`AccountDirectory`](crate::directory::AccountDirectory)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: Uuid,
    pub user_name: String,
}

/// Patient record linked to a login identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClinicalRecord {
    pub reference_id: Uuid,
}

// ============================================
// Request DTOs
// ============================================

/// Property names reported in validation errors
pub const USER_NAME_PROPERTY: &str = "UserName";
pub const PASSWORD_PROPERTY: &str = "Password";

/// Login request
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    #[serde(default, deserialize_with = "null_as_empty")]
    #[validate(length(min = 1, max = 256, message = "User name must be between 1 and 256 characters."))]
    pub user_name: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    #[validate(length(min = 1, message = "Password is required."))]
    pub password: String,
}

/// Missing and `null` fields reach format validation as empty strings
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Credentials {
    pub fn new(user_name: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            password: password.into(),
        }
    }

    /// Run format validation, reporting errors against `UserName` / `Password`
    pub fn format_errors(&self) -> Vec<ValidationError> {
        let Err(errors) = self.validate() else {
            return Vec::new();
        };

        let field_errors = errors.field_errors();
        [("user_name", USER_NAME_PROPERTY), ("password", PASSWORD_PROPERTY)]
            .into_iter()
            .filter_map(|(field, property)| {
                let messages: Vec<String> = field_errors
                    .get(field)?
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                Some(ValidationError {
                    property_name: property.to_string(),
                    messages,
                })
            })
            .collect()
    }
}

// ============================================
// Outcomes
// ============================================

/// Field-scoped, user-facing validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    #[serde(rename = "field")]
    pub property_name: String,
    pub messages: Vec<String>,
}

impl ValidationError {
    pub fn new(property_name: &str, message: &str) -> Self {
        Self {
            property_name: property_name.to_string(),
            messages: vec![message.to_string()],
        }
    }
}

/// Signed compact token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub serialized: String,
    pub expires_at: DateTime<Utc>,
}

/// Result of a login attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Success { token: IssuedToken },
    Failure { errors: Vec<ValidationError> },
}

impl AuthOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AuthOutcome::Success { .. })
    }

    pub fn errors(&self) -> &[ValidationError] {
        match self {
            AuthOutcome::Success { .. } => &[],
            AuthOutcome::Failure { errors } => errors,
        }
    }
}

// ============================================
// Response DTOs
// ============================================

/// Login response body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ValidationError>>,
}

impl From<AuthOutcome> for LoginResponse {
    fn from(outcome: AuthOutcome) -> Self {
        match outcome {
            AuthOutcome::Success { token } => Self {
                success: true,
                token: Some(token.serialized),
                expires_at: Some(token.expires_at),
                errors: None,
            },
            AuthOutcome::Failure { errors } => Self {
                success: false,
                token: None,
                expires_at: None,
                errors: Some(errors),
            },
        }
    }
}

// ============================================
// JWT Claims
// ============================================

/// `role` is a string for one role and an array for several
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoleClaim {
    One(String),
    Many(Vec<String>),
}

impl RoleClaim {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            RoleClaim::One(r) => vec![r.clone()],
            RoleClaim::Many(roles) => roles.clone(),
        }
    }
}

/// Decoded access token payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject (user name)
    pub sub: String,
    pub unique_name: String,
    pub role: RoleClaim,
    /// JWT ID (unique identifier)
    pub jti: String,
    #[serde(rename = "PatientReferenceId", default)]
    pub patient_reference_id: Option<String>,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
}
