//! Test utilities and common setup.

use std::sync::Arc;

use axum::Router;
use gatehouse::api;
use gatehouse::auth::{AuthConfig, LoginThrottle, TOKEN_TTL_SECS, TokenIssuer};
use gatehouse::db::Database;
use gatehouse::store::{PersonnelRepository, Role};

/// JWT secret for tests (must be at least 32 characters).
pub const TEST_SECRET: &str = "test-secret-for-integration-tests-minimum-32-chars";

async fn build_app(behind_proxy: bool) -> Router {
    let db = Database::in_memory().await.unwrap();
    let repo = PersonnelRepository::new(db.pool().clone());

    repo.create(
        "Alice Example",
        "alice@example.com",
        "ou_engineering",
        "DOC-1001",
        Role::Employee,
    )
    .await
    .unwrap();
    repo.create(
        "Bob Example",
        "bob@example.com",
        "ou_finance",
        "DOC-1002",
        Role::Manager,
    )
    .await
    .unwrap();

    let tokens = TokenIssuer::new(TEST_SECRET, TOKEN_TTL_SECS);
    let throttle = Arc::new(LoginThrottle::default());

    let config = AuthConfig {
        jwt_secret: Some(TEST_SECRET.to_string()),
        // secure_cookies off: test requests are plain http
        secure_cookies: false,
        behind_proxy,
        ..Default::default()
    };

    let state = api::AppState::new(Arc::new(repo), tokens, throttle, &config);
    api::create_router(state)
}

/// Create a proxy-fronted test application backed by an in-memory database
/// and seeded with a few personnel records. None of them have registered yet.
pub async fn test_app() -> Router {
    build_app(true).await
}

/// Same as [`test_app`] but serving clients directly (X-Forwarded-For is
/// not trusted).
pub async fn test_app_direct() -> Router {
    build_app(false).await
}
