//! Application state shared across handlers.

use std::sync::Arc;

use crate::auth::{AuthConfig, AuthService, LoginThrottle, TokenIssuer};
use crate::store::PersonnelStore;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Credential-lifecycle service.
    pub auth: AuthService,
    /// Personnel registry access (for authenticated profile lookups).
    pub store: Arc<dyn PersonnelStore>,
    /// Token issuer, also used by the validation middleware.
    pub tokens: TokenIssuer,
    /// Whether auth cookies carry the `Secure` attribute.
    pub secure_cookies: bool,
    /// Whether `X-Forwarded-For` is trusted for throttle keying.
    pub behind_proxy: bool,
    /// Allowed CORS origins.
    pub allowed_origins: Vec<String>,
}

impl AppState {
    /// Create new application state.
    pub fn new(
        store: Arc<dyn PersonnelStore>,
        tokens: TokenIssuer,
        throttle: Arc<LoginThrottle>,
        config: &AuthConfig,
    ) -> Self {
        let auth = AuthService::new(store.clone(), tokens.clone(), throttle);
        Self {
            auth,
            store,
            tokens,
            secure_cookies: config.secure_cookies,
            behind_proxy: config.behind_proxy,
            allowed_origins: config.allowed_origins.clone(),
        }
    }
}
