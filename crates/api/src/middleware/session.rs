//! Session resolution and page-level route guards.
//!
//! Every request passes through [`session_middleware`]: the session cookies
//! are resolved into an identity (refreshing near-expiry tokens), then the
//! locale-stripped path decides whether the caller is redirected.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use domain::services::{IdentityError, IdentityUser};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use shared::locale::{localized, split_locale};

use crate::app::AppState;
use crate::services::cookies::CookieHelper;

const PROTECTED_PREFIXES: &[&str] = &["/dashboard", "/admin", "/tenant"];
const AUTH_ONLY_PREFIXES: &[&str] = &["/login", "/register", "/forgot-password"];

/// Identity resolved from session cookies, stored in request extensions.
#[derive(Debug, Clone)]
pub struct SessionUser(pub IdentityUser);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Protected,
    AuthOnly,
    Public,
}

fn matches_prefix(path: &str, prefix: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Classifies a path that has already had its locale segment removed.
pub fn classify(path: &str) -> RouteClass {
    if PROTECTED_PREFIXES.iter().any(|p| matches_prefix(path, p)) {
        RouteClass::Protected
    } else if AUTH_ONLY_PREFIXES.iter().any(|p| matches_prefix(path, p)) {
        RouteClass::AuthOnly
    } else {
        RouteClass::Public
    }
}

#[derive(Debug, Deserialize)]
struct ExpiryClaims {
    exp: i64,
}

/// Reads `exp` from a JWT without checking its signature.
///
/// The provider remains the authority on validity; this only decides
/// whether to refresh ahead of expiry.
fn token_expiry(token: &str) -> Option<i64> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    decode::<ExpiryClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .ok()
        .map(|data| data.claims.exp)
}

fn expires_within(token: &str, margin_secs: i64, now: i64) -> bool {
    token_expiry(token).is_some_and(|exp| exp - now <= margin_secs)
}

/// Outcome of resolving the session cookies.
#[derive(Debug, Default)]
pub struct Resolution {
    pub user: Option<IdentityUser>,
    /// Set-Cookie values to attach to whatever response is produced.
    pub cookies: Vec<String>,
}

impl Resolution {
    fn anonymous() -> Self {
        Self::default()
    }
}

/// Resolves the caller from session cookies, refreshing when the access
/// token is near expiry or rejected.
pub async fn resolve_session(state: &AppState, headers: &HeaderMap) -> Resolution {
    let access = state.cookies.access_token(headers);
    let refresh = state.cookies.refresh_token(headers);
    if access.is_none() && refresh.is_none() {
        return Resolution::anonymous();
    }

    if let Some(token) = access {
        let margin = state.config.session.refresh_margin_secs;
        if !expires_within(token, margin, Utc::now().timestamp()) {
            match state.identity.get_user(token).await {
                Ok(user) => {
                    return Resolution {
                        user: Some(user),
                        cookies: Vec::new(),
                    }
                }
                Err(IdentityError::InvalidCredentials) => {}
                Err(IdentityError::NotConfigured(detail)) => {
                    tracing::warn!(detail = %detail, "Identity provider not configured; session ignored");
                    return Resolution::anonymous();
                }
                Err(err) => {
                    tracing::warn!(error = %err, "Session validation failed");
                    return Resolution::anonymous();
                }
            }
        }
    }

    let Some(refresh_token) = refresh else {
        return Resolution::anonymous();
    };

    match state.identity.refresh_session(refresh_token).await {
        Ok(session) => {
            tracing::debug!(user_id = %session.user.id, "Session refreshed");
            Resolution {
                cookies: state.cookies.session_cookies(&session),
                user: Some(session.user),
            }
        }
        Err(IdentityError::NotConfigured(detail)) => {
            tracing::warn!(detail = %detail, "Identity provider not configured; session ignored");
            Resolution::anonymous()
        }
        Err(err) => {
            tracing::info!(error = %err, "Session refresh failed; clearing cookies");
            Resolution {
                user: None,
                cookies: state.cookies.clear_cookies(),
            }
        }
    }
}

fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Resolves the session and applies the page guards.
///
/// Cookies produced by the resolution are attached to the response unless
/// the handler already set cookies of its own.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let resolution = resolve_session(&state, req.headers()).await;

    let path = req.uri().path().to_string();
    let split = split_locale(&path);
    let locale = split.locale();
    let class = classify(split.rest);

    let mut response = match (class, resolution.user) {
        (RouteClass::Protected, None) => found(&localized(locale, "/login")),
        (RouteClass::AuthOnly, Some(_)) => found(&localized(locale, "/dashboard")),
        (_, user) => {
            if let Some(user) = user {
                req.extensions_mut().insert(SessionUser(user));
            }
            next.run(req).await
        }
    };

    if !response.headers().contains_key(header::SET_COOKIE) {
        CookieHelper::append_all(response.headers_mut(), &resolution.cookies);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;

    #[derive(Serialize)]
    struct Claims {
        sub: String,
        exp: i64,
    }

    fn jwt(exp: i64) -> String {
        encode(
            &Header::default(),
            &Claims {
                sub: "user".to_string(),
                exp,
            },
            &EncodingKey::from_secret(b"provider-secret"),
        )
        .unwrap()
    }

    #[test]
    fn test_classify_prefixes() {
        assert_eq!(classify("/dashboard"), RouteClass::Protected);
        assert_eq!(classify("/dashboard/payments"), RouteClass::Protected);
        assert_eq!(classify("/admin/users"), RouteClass::Protected);
        assert_eq!(classify("/tenant"), RouteClass::Protected);
        assert_eq!(classify("/login"), RouteClass::AuthOnly);
        assert_eq!(classify("/forgot-password"), RouteClass::AuthOnly);
        assert_eq!(classify("/"), RouteClass::Public);
        assert_eq!(classify("/api/me"), RouteClass::Public);
    }

    #[test]
    fn test_classify_is_segment_aware() {
        assert_eq!(classify("/dashboards"), RouteClass::Public);
        assert_eq!(classify("/administrator"), RouteClass::Public);
        assert_eq!(classify("/login-help"), RouteClass::Public);
        assert_eq!(classify("/registered"), RouteClass::Public);
    }

    #[test]
    fn test_token_expiry_ignores_signature() {
        let exp = Utc::now().timestamp() + 600;
        assert_eq!(token_expiry(&jwt(exp)), Some(exp));
    }

    #[test]
    fn test_token_expiry_opaque_token() {
        assert_eq!(token_expiry("access-abc"), None);
    }

    #[test]
    fn test_expires_within_margin() {
        let now = Utc::now().timestamp();
        assert!(expires_within(&jwt(now + 30), 60, now));
        assert!(expires_within(&jwt(now - 10), 60, now));
        assert!(!expires_within(&jwt(now + 3600), 60, now));
        assert!(!expires_within("opaque", 60, now));
    }
}
