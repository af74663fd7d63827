//! HTTP handlers.

use std::net::SocketAddr;

use axum::{
    extract::{rejection::ExtensionRejection, ConnectInfo, State},
    http::{header::SET_COOKIE, HeaderMap},
    response::{AppendHeaders, IntoResponse},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::auth::{AuthError, CurrentUser};
use crate::store::UserInfo;

use super::state::AppState;

/// Credential request body. Fields are optional so that absent input maps to
/// the documented 400 rather than a serde rejection.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Successful register/login response.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub ok: bool,
    pub token: String,
    pub user: UserInfo,
}

/// Plain acknowledgement body.
#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Derive the throttle key from the client's network identity.
///
/// The peer address is the base identity. The first `X-Forwarded-For` hop
/// takes precedence only when the deployment declares a fronting proxy;
/// otherwise the header is client-controlled and ignored.
fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>, behind_proxy: bool) -> String {
    if behind_proxy {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|h| h.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty());
        if let Some(ip) = forwarded {
            return ip.to_string();
        }
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Build the auth cookie carrying the issued token.
fn auth_cookie(token: &str, max_age_secs: i64, secure: bool) -> String {
    let secure_flag = if secure { " Secure;" } else { "" };
    format!(
        "auth_token={token}; Path=/; HttpOnly; SameSite=Lax;{secure_flag} Max-Age={max_age_secs}"
    )
}

/// First-time password creation.
#[instrument(skip(state, request))]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let authenticated = state
        .auth
        .register(request.email.as_deref(), request.password.as_deref())
        .await?;

    let cookie = auth_cookie(
        &authenticated.token,
        state.tokens.ttl_secs(),
        state.secure_cookies,
    );

    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(AuthResponse {
            ok: true,
            token: authenticated.token,
            user: authenticated.user,
        }),
    ))
}

/// Credential verification.
#[instrument(skip(state, headers, peer, request))]
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    peer: Result<ConnectInfo<SocketAddr>, ExtensionRejection>,
    Json(request): Json<CredentialsRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let key = client_key(&headers, peer.ok().map(|ConnectInfo(addr)| addr), state.behind_proxy);
    let authenticated = state
        .auth
        .login(&key, request.email.as_deref(), request.password.as_deref())
        .await?;

    let cookie = auth_cookie(
        &authenticated.token,
        state.tokens.ttl_secs(),
        state.secure_cookies,
    );

    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(AuthResponse {
            ok: true,
            token: authenticated.token,
            user: authenticated.user,
        }),
    ))
}

/// Session termination.
///
/// Stateless: clears the client-held cookie. Issued tokens stay valid until
/// natural expiry; there is no server-side revocation.
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    let cookie = auth_cookie("", 0, state.secure_cookies);

    (
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(OkResponse { ok: true }),
    )
}

/// Current user profile (protected).
#[instrument(skip(state, user))]
pub async fn me(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<UserInfo>, AuthError> {
    let record = state
        .store
        .find_by_email(&user.claims.email)
        .await?
        .ok_or(AuthError::NotFound)?;

    Ok(Json(record.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(addr: &str) -> Option<SocketAddr> {
        Some(addr.parse().unwrap())
    }

    #[test]
    fn test_client_key_prefers_first_forwarded_hop_behind_proxy() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
        assert_eq!(
            client_key(&headers, peer("10.0.0.1:9999"), true),
            "203.0.113.7"
        );
    }

    #[test]
    fn test_client_key_ignores_forwarded_header_when_direct() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.7".parse().unwrap());
        assert_eq!(
            client_key(&headers, peer("192.0.2.50:4242"), false),
            "192.0.2.50"
        );
    }

    #[test]
    fn test_client_key_uses_peer_address() {
        assert_eq!(
            client_key(&HeaderMap::new(), peer("192.0.2.50:4242"), false),
            "192.0.2.50"
        );
        // Same host, different source port: one bucket.
        assert_eq!(
            client_key(&HeaderMap::new(), peer("192.0.2.50:5555"), false),
            "192.0.2.50"
        );
    }

    #[test]
    fn test_client_key_falls_back_when_peer_unknown() {
        assert_eq!(client_key(&HeaderMap::new(), None, false), "unknown");
    }

    #[test]
    fn test_auth_cookie_attributes() {
        let cookie = auth_cookie("tok", 3600, true);
        assert!(cookie.starts_with("auth_token=tok;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("Max-Age=3600"));

        let insecure = auth_cookie("tok", 3600, false);
        assert!(!insecure.contains("Secure"));
    }
}
