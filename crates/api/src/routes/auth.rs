//! Auth callback and sign-out handlers for browser sessions.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use domain::services::ClaimOutcome;
use serde::Deserialize;
use shared::locale::{localized, Locale};
use tracing::{info, warn};

use crate::app::AppState;
use crate::middleware::record_onboarding_outcome;
use crate::services::CookieHelper;

/// Query string of the identity provider's redirect back to the app.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    #[serde(rename = "type")]
    pub link_type: Option<String>,
    pub next: Option<String>,
    pub locale: Option<String>,
}

impl CallbackQuery {
    fn locale(&self) -> Locale {
        self.locale
            .as_deref()
            .and_then(|l| l.parse().ok())
            .unwrap_or_default()
    }
}

/// Only same-origin absolute paths are followed; `//host` is rejected, as
/// is any path with control or whitespace characters (browsers strip them).
fn is_local_path(path: &str) -> bool {
    path.starts_with('/')
        && !path.starts_with("//")
        && !path.starts_with("/\\")
        && !path.chars().any(|c| c.is_control() || c.is_whitespace())
}

/// Redirect target after a successful code exchange.
pub fn success_redirect(query: &CallbackQuery) -> String {
    let locale = query.locale();
    match query.link_type.as_deref() {
        Some("recovery") => localized(locale, "/reset-password"),
        Some("signup") | Some("email") => localized(locale, "/login?verified=true"),
        _ => match query.next.as_deref() {
            Some(next) if is_local_path(next) => next.to_string(),
            _ => localized(locale, "/dashboard"),
        },
    }
}

fn failure_redirect(locale: Locale) -> String {
    localized(locale, "/login?error=auth_callback_failed")
}

fn redirect_with_cookies(location: &str, cookies: &[String]) -> Response {
    let mut response = (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response();
    CookieHelper::append_all(response.headers_mut(), cookies);
    response
}

/// Exchange an email-link or OAuth code for a session.
///
/// GET /auth/callback?code&type&next&locale
///
/// Sets the session cookies and, except for recovery links, claims any
/// invite staged for the user's email. Claim failures are logged and never
/// block the redirect.
pub async fn callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
    headers: HeaderMap,
) -> Response {
    let locale = query.locale();
    let Some(code) = query.code.as_deref().filter(|c| !c.is_empty()) else {
        return redirect_with_cookies(&failure_redirect(locale), &[]);
    };

    let verifier = state.cookies.code_verifier(&headers);
    let session = match state.identity.exchange_code(code, verifier).await {
        Ok(session) => session,
        Err(e) => {
            warn!(error = %e, "Auth code exchange failed");
            return redirect_with_cookies(&failure_redirect(locale), &[]);
        }
    };

    if query.link_type.as_deref() != Some("recovery") {
        match state
            .onboarding()
            .claim_pending_invite(&session.user, Utc::now())
            .await
        {
            Ok(outcome) => {
                let label = match &outcome {
                    ClaimOutcome::NoPendingInvite => "none",
                    ClaimOutcome::Joined { .. } => "joined",
                    ClaimOutcome::AlreadyMember { .. } => "already_member",
                    ClaimOutcome::Rejected { .. } => "rejected",
                };
                record_onboarding_outcome("claim_invite", label);
                info!(user_id = %session.user.id, outcome = ?outcome, "Post-auth invite claim");
            }
            Err(e) => {
                record_onboarding_outcome("claim_invite", "error");
                warn!(user_id = %session.user.id, error = %e, "Post-auth invite claim failed");
            }
        }
    }

    let mut cookies = state.cookies.session_cookies(&session);
    if verifier.is_some() {
        cookies.push(state.cookies.clear_verifier_cookie());
    }
    redirect_with_cookies(&success_redirect(&query), &cookies)
}

/// Revoke the session (best effort) and clear the cookies.
///
/// POST /auth/signout
pub async fn signout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = state.cookies.access_token(&headers) {
        if let Err(e) = state.identity.sign_out(token).await {
            warn!(error = %e, "Provider sign-out failed");
        }
    }

    let mut response = StatusCode::NO_CONTENT.into_response();
    CookieHelper::append_all(response.headers_mut(), &state.cookies.clear_cookies());
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(link_type: Option<&str>, next: Option<&str>, locale: Option<&str>) -> CallbackQuery {
        CallbackQuery {
            code: Some("c".to_string()),
            link_type: link_type.map(str::to_string),
            next: next.map(str::to_string),
            locale: locale.map(str::to_string),
        }
    }

    #[test]
    fn test_recovery_redirect() {
        assert_eq!(
            success_redirect(&query(Some("recovery"), Some("/x"), Some("en"))),
            "/en/reset-password"
        );
    }

    #[test]
    fn test_signup_and_email_redirect() {
        assert_eq!(
            success_redirect(&query(Some("signup"), None, None)),
            "/he/login?verified=true"
        );
        assert_eq!(
            success_redirect(&query(Some("email"), None, Some("en"))),
            "/en/login?verified=true"
        );
    }

    #[test]
    fn test_next_must_be_local() {
        assert_eq!(
            success_redirect(&query(None, Some("/he/dashboard/payments"), None)),
            "/he/dashboard/payments"
        );
        assert_eq!(
            success_redirect(&query(None, Some("//evil.example.com"), None)),
            "/he/dashboard"
        );
        assert_eq!(
            success_redirect(&query(None, Some("https://evil.example.com"), None)),
            "/he/dashboard"
        );
    }

    #[test]
    fn test_next_with_control_or_whitespace_is_rejected() {
        for next in ["/\t/evil.example.com", "/\n/evil.example.com", "/ /evil.example.com"] {
            assert_eq!(
                success_redirect(&query(None, Some(next), None)),
                "/he/dashboard",
                "{next:?}"
            );
        }
    }

    #[test]
    fn test_unknown_locale_defaults() {
        assert_eq!(
            success_redirect(&query(None, None, Some("fr"))),
            "/he/dashboard"
        );
    }
}
