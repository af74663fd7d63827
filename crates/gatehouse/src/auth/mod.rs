//! Authentication core.
//!
//! Credential lifecycle state machine (register/login/logout), per-client
//! login throttling, token issuance, and the JWT validation middleware.

mod config;
mod error;
mod middleware;
mod password;
mod service;
mod throttle;
mod token;

pub use config::{AuthConfig, ConfigValidationError};
pub use error::{AuthError, AuthErrorResponse};
pub use middleware::{auth_middleware, CurrentUser};
pub use service::AuthService;
pub use throttle::LoginThrottle;
pub use token::{Claims, TokenIssuer, TOKEN_TTL_SECS};
