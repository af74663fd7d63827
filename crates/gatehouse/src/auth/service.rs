//! Authentication state machine.
//!
//! Orchestrates register/login over the personnel store, the password
//! hasher, and the token issuer. Every operation returns a typed result;
//! the HTTP mapping happens only at the boundary.

use std::sync::Arc;
use tracing::{info, instrument};

use super::{password, AuthError, LoginThrottle, TokenIssuer};
use crate::store::{PersonnelStore, UserInfo};

/// A successful register or login: the bearer token plus the sanitized user
/// projection.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub token: String,
    pub user: UserInfo,
}

/// Credential-lifecycle service.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn PersonnelStore>,
    tokens: TokenIssuer,
    throttle: Arc<LoginThrottle>,
}

impl AuthService {
    /// Create a new authentication service.
    pub fn new(
        store: Arc<dyn PersonnelStore>,
        tokens: TokenIssuer,
        throttle: Arc<LoginThrottle>,
    ) -> Self {
        Self {
            store,
            tokens,
            throttle,
        }
    }

    /// First-time password creation.
    ///
    /// The record must pre-exist in the personnel registry and must not have
    /// a password yet; registration is strictly one-time. Two concurrent
    /// registrations for the same record race read-then-write and resolve
    /// last-write-wins at the store.
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        email: Option<&str>,
        password: Option<&str>,
    ) -> Result<Authenticated, AuthError> {
        let (email, plaintext) = required_input(email, password)?;

        let record = self
            .store
            .find_by_email(email)
            .await?
            .ok_or(AuthError::NotFound)?;

        if record.is_registered() {
            return Err(AuthError::AlreadyRegistered);
        }

        let hash = password::hash(plaintext)?;
        let record = self.store.set_password_hash(&record.id, &hash).await?;

        let token = self.tokens.issue(&record)?;
        info!(user_id = %record.id, "user registered");

        Ok(Authenticated {
            token,
            user: record.into(),
        })
    }

    /// Credential verification.
    ///
    /// The throttle is consulted before any store lookup or hashing work, so
    /// a blocked client never exercises the credential path.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        client_key: &str,
        email: Option<&str>,
        password: Option<&str>,
    ) -> Result<Authenticated, AuthError> {
        self.throttle.check(client_key)?;

        let (email, plaintext) = required_input(email, password)?;

        let record = self
            .store
            .find_by_email(email)
            .await?
            .ok_or(AuthError::NotFound)?;

        // Distinct from NotFound: the registry knows the user, but they have
        // not completed first-time registration.
        let hash = record
            .password_hash
            .as_deref()
            .ok_or(AuthError::NotRegistered)?;

        if !password::verify(plaintext, hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.tokens.issue(&record)?;
        info!(user_id = %record.id, "user logged in");

        Ok(Authenticated {
            token,
            user: record.into(),
        })
    }
}

/// Reject absent or blank credential fields with `MissingInput`.
fn required_input<'a>(
    email: Option<&'a str>,
    password: Option<&'a str>,
) -> Result<(&'a str, &'a str), AuthError> {
    match (email, password) {
        (Some(e), Some(p)) if !e.trim().is_empty() && !p.is_empty() => Ok((e, p)),
        _ => Err(AuthError::MissingInput),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TOKEN_TTL_SECS;
    use crate::db::Database;
    use crate::store::{PersonnelRepository, Role};

    const CLIENT: &str = "10.0.0.1";

    async fn test_service() -> (AuthService, PersonnelRepository) {
        let db = Database::in_memory().await.expect("in-memory db");
        let repo = PersonnelRepository::new(db.pool().clone());
        let service = AuthService::new(
            Arc::new(repo.clone()),
            TokenIssuer::new("test-secret-for-unit-tests-minimum-32-chars", TOKEN_TTL_SECS),
            Arc::new(LoginThrottle::new()),
        );
        (service, repo)
    }

    async fn seed_alice(repo: &PersonnelRepository) {
        repo.create("Alice", "alice@x.com", "ou_eng", "DOC-1", Role::Employee)
            .await
            .expect("seed record");
    }

    #[tokio::test]
    async fn test_register_unknown_email_is_not_found() {
        let (service, _repo) = test_service().await;
        let result = service.register(Some("ghost@x.com"), Some("pw123")).await;
        assert!(matches!(result, Err(AuthError::NotFound)));
    }

    #[tokio::test]
    async fn test_register_is_one_shot() {
        let (service, repo) = test_service().await;
        seed_alice(&repo).await;

        let first = service
            .register(Some("alice@x.com"), Some("pw123"))
            .await
            .unwrap();
        assert!(!first.token.is_empty());
        assert_eq!(first.user.email, "alice@x.com");

        let second = service.register(Some("alice@x.com"), Some("pw123")).await;
        assert!(matches!(second, Err(AuthError::AlreadyRegistered)));
    }

    #[tokio::test]
    async fn test_register_missing_input() {
        let (service, _repo) = test_service().await;
        assert!(matches!(
            service.register(None, Some("pw123")).await,
            Err(AuthError::MissingInput)
        ));
        assert!(matches!(
            service.register(Some("alice@x.com"), Some("")).await,
            Err(AuthError::MissingInput)
        ));
    }

    #[tokio::test]
    async fn test_login_before_register_is_not_registered() {
        let (service, repo) = test_service().await;
        seed_alice(&repo).await;

        let result = service
            .login(CLIENT, Some("alice@x.com"), Some("pw123"))
            .await;
        assert!(matches!(result, Err(AuthError::NotRegistered)));
    }

    #[tokio::test]
    async fn test_login_flow() {
        let (service, repo) = test_service().await;
        seed_alice(&repo).await;

        let registered = service
            .register(Some("alice@x.com"), Some("pw123"))
            .await
            .unwrap();

        let logged_in = service
            .login(CLIENT, Some("alice@x.com"), Some("pw123"))
            .await
            .unwrap();
        assert_eq!(logged_in.user.id, registered.user.id);

        let wrong = service
            .login(CLIENT, Some("alice@x.com"), Some("wrong"))
            .await;
        assert!(matches!(wrong, Err(AuthError::InvalidCredentials)));

        let unknown = service.login(CLIENT, Some("ghost@x.com"), Some("pw123")).await;
        assert!(matches!(unknown, Err(AuthError::NotFound)));
    }

    #[tokio::test]
    async fn test_login_throttle_blocks_regardless_of_credentials() {
        let (service, repo) = test_service().await;
        seed_alice(&repo).await;
        service
            .register(Some("alice@x.com"), Some("pw123"))
            .await
            .unwrap();

        // Exhaust the window; every attempt reaches credential checking.
        for _ in 0..20 {
            let result = service
                .login(CLIENT, Some("alice@x.com"), Some("wrong"))
                .await;
            assert!(matches!(result, Err(AuthError::InvalidCredentials)));
        }

        // The 21st is rejected even with valid credentials.
        let blocked = service
            .login(CLIENT, Some("alice@x.com"), Some("pw123"))
            .await;
        assert!(matches!(blocked, Err(AuthError::Throttled)));

        // Other clients are unaffected.
        let other = service
            .login("10.0.0.2", Some("alice@x.com"), Some("pw123"))
            .await;
        assert!(other.is_ok());
    }
}
