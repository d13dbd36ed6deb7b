//! Integration tests for cookie sessions, page guards and the auth callback.

mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use common::{
    get_request, json_request, location, request_with_cookies, set_cookies, TestContext,
    ACCESS_COOKIE, REFRESH_COOKIE,
};
use domain::models::{MemberRole, PlatformRole};
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn test_protected_page_redirects_anonymous_to_login() {
    let ctx = TestContext::new();

    let response = ctx
        .app
        .clone()
        .oneshot(get_request("/en/dashboard/payments"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response).as_deref(), Some("/en/login"));
}

#[tokio::test]
async fn test_protected_page_without_locale_uses_default() {
    let ctx = TestContext::new();

    let response = ctx.app.clone().oneshot(get_request("/admin")).await.unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response).as_deref(), Some("/he/login"));
}

#[tokio::test]
async fn test_similar_prefix_is_not_protected() {
    let ctx = TestContext::new();

    let response = ctx
        .app
        .clone()
        .oneshot(get_request("/he/dashboards"))
        .await
        .unwrap();

    assert_ne!(response.status(), StatusCode::FOUND);
}

#[tokio::test]
async fn test_login_page_redirects_signed_in_user() {
    let ctx = TestContext::new();
    let user = ctx.sign_in("tenant@example.com", PlatformRole::Tenant).await;

    let response = ctx
        .app
        .clone()
        .oneshot(request_with_cookies(
            Method::GET,
            "/he/login",
            &user.cookie_header(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response).as_deref(), Some("/he/dashboard"));
}

#[tokio::test]
async fn test_valid_session_passes_guard_without_new_cookies() {
    let ctx = TestContext::new();
    let user = ctx.sign_in("tenant@example.com", PlatformRole::Tenant).await;

    let response = ctx
        .app
        .clone()
        .oneshot(request_with_cookies(
            Method::GET,
            "/he/dashboard",
            &user.cookie_header(),
        ))
        .await
        .unwrap();

    assert_ne!(response.status(), StatusCode::FOUND);
    assert!(set_cookies(&response).is_empty());
}

#[tokio::test]
async fn test_expired_access_token_is_refreshed() {
    let ctx = TestContext::new();
    let user = ctx.sign_in("tenant@example.com", PlatformRole::Tenant).await;
    ctx.identity.expire_access_token(user.token()).await;

    let response = ctx
        .app
        .clone()
        .oneshot(request_with_cookies(
            Method::GET,
            "/api/me",
            &user.cookie_header(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 2);
    assert!(cookies
        .iter()
        .any(|c| c.starts_with(&format!("{}=access-", ACCESS_COOKIE))));
    assert!(cookies
        .iter()
        .any(|c| c.starts_with(&format!("{}=refresh-", REFRESH_COOKIE))));
    assert!(cookies.iter().all(|c| c.contains("HttpOnly")));
}

#[tokio::test]
async fn test_failed_refresh_clears_cookies_and_redirects() {
    let ctx = TestContext::new();
    let cookies = format!("{}=stale; {}=revoked", ACCESS_COOKIE, REFRESH_COOKIE);

    let response = ctx
        .app
        .clone()
        .oneshot(request_with_cookies(Method::GET, "/he/dashboard", &cookies))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response).as_deref(), Some("/he/login"));
    let cleared = set_cookies(&response);
    assert_eq!(cleared.len(), 2);
    assert!(cleared.iter().all(|c| c.contains("Max-Age=0")));
}

#[tokio::test]
async fn test_session_cookie_authenticates_api_calls() {
    let ctx = TestContext::new();
    let user = ctx.sign_in("tenant@example.com", PlatformRole::Tenant).await;
    let building = ctx.store.seed_building("Herzl 12").await;
    ctx.store
        .seed_member(building.id, user.user.id, MemberRole::Tenant)
        .await;

    let response = ctx
        .app
        .clone()
        .oneshot(request_with_cookies(
            Method::GET,
            "/api/me",
            &user.cookie_header(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::parse_response_body(response).await;
    assert_eq!(body["email"], "tenant@example.com");
    assert_eq!(body["memberships"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_callback_sets_session_and_claims_pending_invite() {
    let ctx = TestContext::new();
    let building = ctx.store.seed_building("Herzl 12").await;
    let manager = ctx.store.seed_profile(PlatformRole::Admin).await;
    let invite = ctx.seed_invite(building.id, manager.id).await;

    let response = ctx
        .app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/invites/pending",
            json!({
                "user_email": "new@example.com",
                "building_id": building.id,
                "invite_id": invite.id,
                "apartment_number": "4"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let user = ctx.identity.seed_user("new@example.com").await;
    let code = ctx.identity.issue_code(user.id).await;

    let response = ctx
        .app
        .clone()
        .oneshot(get_request(&format!(
            "/auth/callback?code={}&type=signup&locale=en",
            code
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        location(&response).as_deref(),
        Some("/en/login?verified=true")
    );
    let cookies = set_cookies(&response);
    assert!(cookies.iter().any(|c| c.starts_with(ACCESS_COOKIE)));
    assert!(cookies.iter().any(|c| c.starts_with(REFRESH_COOKIE)));

    let members = ctx.store.members_for(user.id).await;
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].building_id, building.id);
    assert_eq!(members[0].apartment_number.as_deref(), Some("4"));
    assert!(ctx.store.pending("new@example.com").await.is_none());
    assert_eq!(ctx.store.invite(invite.id).await.unwrap().uses_count, 1);
    assert!(ctx.store.profile(user.id).await.is_some());
}

#[tokio::test]
async fn test_recovery_callback_skips_invite_claim() {
    let ctx = TestContext::new();
    let user = ctx.identity.seed_user("reset@example.com").await;
    let code = ctx.identity.issue_code(user.id).await;

    let response = ctx
        .app
        .clone()
        .oneshot(get_request(&format!(
            "/auth/callback?code={}&type=recovery",
            code
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response).as_deref(), Some("/he/reset-password"));
    assert!(ctx.store.members_for(user.id).await.is_empty());
}

#[tokio::test]
async fn test_callback_ignores_next_with_encoded_tab() {
    let ctx = TestContext::new();
    let user = ctx.identity.seed_user("oauth@example.com").await;
    let code = ctx.identity.issue_code(user.id).await;

    let response = ctx
        .app
        .clone()
        .oneshot(get_request(&format!(
            "/auth/callback?code={}&next=/%09/evil.example.com",
            code
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response).as_deref(), Some("/he/dashboard"));
}

#[tokio::test]
async fn test_callback_with_bad_code_redirects_to_login_error() {
    let ctx = TestContext::new();

    let response = ctx
        .app
        .clone()
        .oneshot(get_request("/auth/callback?code=nope&locale=en"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        location(&response).as_deref(),
        Some("/en/login?error=auth_callback_failed")
    );
    assert!(set_cookies(&response).is_empty());
}

#[tokio::test]
async fn test_signout_clears_cookies_and_revokes_session() {
    let ctx = TestContext::new();
    let user = ctx.sign_in("tenant@example.com", PlatformRole::Tenant).await;

    let response = ctx
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/auth/signout")
                .header(header::COOKIE, user.cookie_header())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 2);
    assert!(cookies.iter().all(|c| c.contains("Max-Age=0")));

    let response = ctx
        .app
        .clone()
        .oneshot(request_with_cookies(
            Method::GET,
            "/he/dashboard",
            &user.cookie_header(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
}
