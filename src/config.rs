//! Authentication Configuration
//!
//! Values come from a [`ConfigurationSource`] using colon-separated keys
//! (`Jwt:SecretKey`). They are read and validated once at startup; the
//! resulting [`TokenConfig`] is immutable and shared behind an `Arc`.

use crate::error::AuthError;
use std::collections::HashMap;
use std::env;

pub const SECRET_KEY: &str = "Jwt:SecretKey";
pub const ISSUER: &str = "Jwt:Issuer";
pub const AUDIENCE: &str = "Jwt:Audience";
pub const EXPIRY_IN_MINUTES: &str = "Jwt:ExpiryInMinutes";
pub const ROLE_POLICY: &str = "Auth:RolePolicy";

/// Key/value configuration provider
pub trait ConfigurationSource: Send + Sync {
    /// Look up a colon-separated key such as `Jwt:Issuer`
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads configuration from environment variables.
///
/// `Jwt:SecretKey` is read from `JWT__SECRETKEY`.
#[derive(Debug, Clone, Default)]
pub struct EnvSource;

impl EnvSource {
    pub fn var_name(key: &str) -> String {
        key.replace(':', "__").to_uppercase()
    }
}

impl ConfigurationSource for EnvSource {
    fn get(&self, key: &str) -> Option<String> {
        env::var(Self::var_name(key)).ok()
    }
}

impl ConfigurationSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

/// Token signing configuration
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// Shared secret for HMAC-SHA256 signing (from `Jwt:SecretKey`)
    pub secret_key: String,

    /// `iss` claim (from `Jwt:Issuer`)
    pub issuer: String,

    /// `aud` claim (from `Jwt:Audience`)
    pub audience: String,

    /// Token lifetime in minutes (from `Jwt:ExpiryInMinutes`)
    pub expiry_minutes: i64,
}

impl TokenConfig {
    /// Load and validate the token configuration
    pub fn load(source: &dyn ConfigurationSource) -> Result<Self, AuthError> {
        let secret_key = source.get(SECRET_KEY).unwrap_or_default();
        let issuer = source.get(ISSUER).unwrap_or_default();
        let audience = source.get(AUDIENCE).unwrap_or_default();

        let raw_expiry = source.get(EXPIRY_IN_MINUTES).ok_or_else(|| {
            AuthError::Config(format!("{EXPIRY_IN_MINUTES} must be set"))
        })?;
        let expiry_minutes = raw_expiry.trim().parse::<i64>().map_err(|_| {
            AuthError::Config(format!(
                "{EXPIRY_IN_MINUTES} must be an integer, got '{raw_expiry}'"
            ))
        })?;

        let config = Self {
            secret_key,
            issuer,
            audience,
            expiry_minutes,
        };
        config.validate()?;

        tracing::info!(
            issuer = %config.issuer,
            audience = %config.audience,
            expiry_minutes = config.expiry_minutes,
            "Token configuration loaded"
        );

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.secret_key.is_empty() {
            return Err(AuthError::Config(format!("{SECRET_KEY} must be set")));
        }

        if self.expiry_minutes <= 0 {
            return Err(AuthError::Config(format!(
                "{EXPIRY_IN_MINUTES} must be positive"
            )));
        }

        Ok(())
    }
}

/// How the directory's role set becomes `role` claims
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RolePolicy {
    /// First role in ordinal order
    #[default]
    Primary,
    /// Every role, in ordinal order
    All,
}

impl std::str::FromStr for RolePolicy {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "primary" => Ok(RolePolicy::Primary),
            "all" => Ok(RolePolicy::All),
            other => Err(AuthError::Config(format!(
                "{ROLE_POLICY} must be 'primary' or 'all', got '{other}'"
            ))),
        }
    }
}

/// Login behaviour not tied to token signing
#[derive(Debug, Clone, Copy, Default)]
pub struct LoginPolicy {
    pub role_policy: RolePolicy,
}

impl LoginPolicy {
    pub fn load(source: &dyn ConfigurationSource) -> Result<Self, AuthError> {
        let role_policy = match source.get(ROLE_POLICY) {
            Some(value) => value.parse()?,
            None => RolePolicy::default(),
        };

        Ok(Self { role_policy })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_config_load() {
        let src = source(&[
            (SECRET_KEY, "clinic-signing-secret"),
            (ISSUER, "dental-system"),
            (AUDIENCE, "dental-clients"),
            (EXPIRY_IN_MINUTES, "60"),
        ]);

        let config = TokenConfig::load(&src).unwrap();
        assert_eq!(config.issuer, "dental-system");
        assert_eq!(config.audience, "dental-clients");
        assert_eq!(config.expiry_minutes, 60);
    }

    #[test]
    fn test_config_missing_secret() {
        let src = source(&[(ISSUER, "i"), (AUDIENCE, "a"), (EXPIRY_IN_MINUTES, "60")]);
        assert!(matches!(TokenConfig::load(&src), Err(AuthError::Config(_))));

        let src = source(&[(SECRET_KEY, ""), (EXPIRY_IN_MINUTES, "60")]);
        assert!(matches!(TokenConfig::load(&src), Err(AuthError::Config(_))));
    }

    #[test]
    fn test_config_bad_expiry() {
        for expiry in ["0", "-5", "soon", "1.5"] {
            let src = source(&[(SECRET_KEY, "secret"), (EXPIRY_IN_MINUTES, expiry)]);
            assert!(
                matches!(TokenConfig::load(&src), Err(AuthError::Config(_))),
                "expiry {expiry} should be rejected"
            );
        }

        let src = source(&[(SECRET_KEY, "secret")]);
        assert!(matches!(TokenConfig::load(&src), Err(AuthError::Config(_))));
    }

    #[test]
    fn test_env_var_name() {
        assert_eq!(EnvSource::var_name(SECRET_KEY), "JWT__SECRETKEY");
        assert_eq!(EnvSource::var_name(EXPIRY_IN_MINUTES), "JWT__EXPIRYINMINUTES");
    }

    #[test]
    fn test_role_policy() {
        assert_eq!(
            LoginPolicy::load(&source(&[])).unwrap().role_policy,
            RolePolicy::Primary
        );
        assert_eq!(
            LoginPolicy::load(&source(&[(ROLE_POLICY, "All")]))
                .unwrap()
                .role_policy,
            RolePolicy::All
        );
        assert!(LoginPolicy::load(&source(&[(ROLE_POLICY, "random")])).is_err());
    }
}
