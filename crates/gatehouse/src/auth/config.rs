//! Authentication configuration.

use serde::{Deserialize, Serialize};

use super::token::TOKEN_TTL_SECS;

/// Authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// JWT signing secret for HS256. REQUIRED. Supports `env:VAR_NAME`
    /// indirection, resolved once at startup.
    pub jwt_secret: Option<String>,

    /// Token lifetime in seconds.
    pub token_ttl_secs: i64,

    /// Mark auth cookies `Secure`. Disable only for plain-http local setups.
    pub secure_cookies: bool,

    /// Trust `X-Forwarded-For` from a fronting reverse proxy when keying the
    /// login throttle. Leave off for direct deployments, where the header is
    /// client-controlled and spoofable.
    pub behind_proxy: bool,

    /// Allowed CORS origins. If empty, cross-origin requests are denied.
    pub allowed_origins: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            // No default secret - must be explicitly configured
            jwt_secret: None,
            token_ttl_secs: TOKEN_TTL_SECS,
            secure_cookies: true,
            behind_proxy: false,
            allowed_origins: Vec::new(),
        }
    }
}

impl AuthConfig {
    /// Resolve the JWT secret, expanding `env:VAR_NAME` syntax.
    pub fn resolve_jwt_secret(&self) -> Result<Option<String>, ConfigValidationError> {
        match &self.jwt_secret {
            None => Ok(None),
            Some(value) => {
                if let Some(var_name) = value.strip_prefix("env:") {
                    match std::env::var(var_name) {
                        Ok(secret) if !secret.is_empty() => Ok(Some(secret)),
                        Ok(_) => Err(ConfigValidationError::EnvVarEmpty(var_name.to_string())),
                        Err(_) => Err(ConfigValidationError::EnvVarNotFound(var_name.to_string())),
                    }
                } else {
                    Ok(Some(value.clone()))
                }
            }
        }
    }

    /// Validate the configuration and return the resolved signing secret.
    ///
    /// A missing or weak secret is a startup-time fatal error; the issuer is
    /// never constructed without one.
    pub fn validate(&self) -> Result<String, ConfigValidationError> {
        let secret = self
            .resolve_jwt_secret()?
            .ok_or(ConfigValidationError::MissingJwtSecret)?;

        if secret.len() < 32 {
            return Err(ConfigValidationError::JwtSecretTooShort);
        }

        if self.token_ttl_secs <= 0 {
            return Err(ConfigValidationError::InvalidTokenTtl);
        }

        Ok(secret)
    }

    /// Generate a secure random JWT secret.
    ///
    /// Uses `ThreadRng`, which is backed by the OS CSPRNG.
    pub fn generate_jwt_secret() -> String {
        use rand::Rng;

        const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
        const SECRET_LENGTH: usize = 64;

        let mut rng = rand::rng();
        (0..SECRET_LENGTH)
            .map(|_| {
                let idx = rng.random_range(0..CHARSET.len());
                CHARSET[idx] as char
            })
            .collect()
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigValidationError {
    #[error(
        "JWT secret is required. Set auth.jwt_secret in config or point it at an environment variable with env:VAR_NAME."
    )]
    MissingJwtSecret,

    #[error("JWT secret must be at least 32 characters long.")]
    JwtSecretTooShort,

    #[error("auth.token_ttl_secs must be a positive number of seconds.")]
    InvalidTokenTtl,

    #[error("environment variable '{0}' not found (referenced via env:{0} in config)")]
    EnvVarNotFound(String),

    #[error("environment variable '{0}' is empty (referenced via env:{0} in config)")]
    EnvVarEmpty(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_no_secret() {
        let config = AuthConfig::default();
        assert!(config.jwt_secret.is_none());
        assert_eq!(config.token_ttl_secs, TOKEN_TTL_SECS);
        assert_eq!(
            config.validate().unwrap_err(),
            ConfigValidationError::MissingJwtSecret
        );
    }

    #[test]
    fn test_short_secret_rejected() {
        let config = AuthConfig {
            jwt_secret: Some("tooshort".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.validate().unwrap_err(),
            ConfigValidationError::JwtSecretTooShort
        );
    }

    #[test]
    fn test_valid_secret_is_returned() {
        let config = AuthConfig {
            jwt_secret: Some("a-very-long-and-secure-jwt-secret-at-least-32".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.validate().unwrap(),
            "a-very-long-and-secure-jwt-secret-at-least-32"
        );
    }

    #[test]
    fn test_invalid_ttl_rejected() {
        let config = AuthConfig {
            jwt_secret: Some("a-very-long-and-secure-jwt-secret-at-least-32".to_string()),
            token_ttl_secs: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate().unwrap_err(),
            ConfigValidationError::InvalidTokenTtl
        );
    }

    #[test]
    fn test_resolve_secret_env_indirection() {
        // SAFETY: test-only environment variable with a unique name
        unsafe {
            std::env::set_var("GATEHOUSE_TEST_SECRET_91827", "secret-from-env-at-least-32-chars!!");
        }

        let config = AuthConfig {
            jwt_secret: Some("env:GATEHOUSE_TEST_SECRET_91827".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.resolve_jwt_secret().unwrap(),
            Some("secret-from-env-at-least-32-chars!!".to_string())
        );

        // SAFETY: cleaning up test environment variable
        unsafe {
            std::env::remove_var("GATEHOUSE_TEST_SECRET_91827");
        }
    }

    #[test]
    fn test_resolve_secret_env_missing() {
        let config = AuthConfig {
            jwt_secret: Some("env:GATEHOUSE_NONEXISTENT_VAR_55".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.resolve_jwt_secret().unwrap_err(),
            ConfigValidationError::EnvVarNotFound("GATEHOUSE_NONEXISTENT_VAR_55".to_string())
        );
    }

    #[test]
    fn test_generated_secret_passes_validation() {
        let config = AuthConfig {
            jwt_secret: Some(AuthConfig::generate_jwt_secret()),
            ..Default::default()
        };
        let secret = config.validate().unwrap();
        assert_eq!(secret.len(), 64);
        assert!(secret.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
