//! Integration tests for building invites, documents and the own-profile
//! endpoints.

mod common;

use axum::http::{Method, StatusCode};
use common::{
    delete_request_with_auth, get_request, get_request_with_auth, json_request,
    json_request_with_auth, parse_response_body, TestContext,
};
use domain::models::{MemberRole, PlatformRole};
use domain::services::MockIdentityProvider;
use domain::services::MockObjectStorage;
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

// ============================================================================
// Invites
// ============================================================================

#[tokio::test]
async fn test_committee_creates_and_lists_invites() {
    let ctx = TestContext::new();
    let committee = ctx.sign_in("committee@example.com", PlatformRole::Committee).await;
    let building = ctx.store.seed_building("Herzl 12").await;
    ctx.store
        .seed_member(building.id, committee.user.id, MemberRole::Committee)
        .await;
    let uri = format!("/api/buildings/{}/invites", building.id);

    let response = ctx
        .app
        .clone()
        .oneshot(json_request_with_auth(
            Method::POST,
            &uri,
            json!({ "max_uses": 3 }),
            committee.token(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let created = parse_response_body(response).await;
    assert_eq!(created["building_id"], building.id.to_string());
    assert_eq!(created["max_uses"], 3);
    assert_eq!(created["availability"], "available");
    assert!(created["expires_at"].is_string());

    let response = ctx
        .app
        .clone()
        .oneshot(get_request_with_auth(&uri, committee.token()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_never_expiring_invite_has_no_expiry() {
    let ctx = TestContext::new();
    let admin = ctx.sign_in("admin@example.com", PlatformRole::Admin).await;
    let building = ctx.store.seed_building("Herzl 12").await;

    let response = ctx
        .app
        .clone()
        .oneshot(json_request_with_auth(
            Method::POST,
            &format!("/api/buildings/{}/invites", building.id),
            json!({ "never_expires": true }),
            admin.token(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = parse_response_body(response).await;
    assert!(body["expires_at"].is_null());
}

#[tokio::test]
async fn test_tenant_cannot_manage_invites() {
    let ctx = TestContext::new();
    let tenant = ctx.sign_in("tenant@example.com", PlatformRole::Tenant).await;
    let building = ctx.store.seed_building("Herzl 12").await;
    ctx.store
        .seed_member(building.id, tenant.user.id, MemberRole::Tenant)
        .await;

    let response = ctx
        .app
        .clone()
        .oneshot(json_request_with_auth(
            Method::POST,
            &format!("/api/buildings/{}/invites", building.id),
            json!({}),
            tenant.token(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_deactivate_invite_then_preview_reports_inactive() {
    let ctx = TestContext::new();
    let admin = ctx.sign_in("admin@example.com", PlatformRole::Admin).await;
    let building = ctx.store.seed_building("Herzl 12").await;
    let invite = ctx.seed_invite(building.id, admin.user.id).await;

    let response = ctx
        .app
        .clone()
        .oneshot(get_request(&format!("/api/invites/{}", invite.id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["building_name"], "Herzl 12");
    assert_eq!(body["is_valid"], true);

    let response = ctx
        .app
        .clone()
        .oneshot(delete_request_with_auth(
            &format!("/api/buildings/{}/invites/{}", building.id, invite.id),
            admin.token(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = ctx
        .app
        .clone()
        .oneshot(get_request(&format!("/api/invites/{}", invite.id)))
        .await
        .unwrap();
    let body = parse_response_body(response).await;
    assert_eq!(body["is_valid"], false);
    assert_eq!(body["reason"], "inactive");
}

#[tokio::test]
async fn test_deactivate_invite_of_other_building_is_not_found() {
    let ctx = TestContext::new();
    let admin = ctx.sign_in("admin@example.com", PlatformRole::Admin).await;
    let building = ctx.store.seed_building("Herzl 12").await;
    let other = ctx.store.seed_building("Bialik 3").await;
    let invite = ctx.seed_invite(other.id, admin.user.id).await;

    let response = ctx
        .app
        .clone()
        .oneshot(delete_request_with_auth(
            &format!("/api/buildings/{}/invites/{}", building.id, invite.id),
            admin.token(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(ctx.store.invite(invite.id).await.unwrap().is_active);
}

#[tokio::test]
async fn test_unknown_invite_preview_is_not_found() {
    let ctx = TestContext::new();

    let response = ctx
        .app
        .clone()
        .oneshot(get_request(&format!("/api/invites/{}", Uuid::new_v4())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_invite_preview_id_returns_error_object() {
    let ctx = TestContext::new();

    let response = ctx
        .app
        .clone()
        .oneshot(get_request("/api/invites/12345"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_response_body(response).await;
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_stage_pending_invite_checks_building() {
    let ctx = TestContext::new();
    let admin = ctx.sign_in("admin@example.com", PlatformRole::Admin).await;
    let building = ctx.store.seed_building("Herzl 12").await;
    let invite = ctx.seed_invite(building.id, admin.user.id).await;

    let response = ctx
        .app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/invites/pending",
            json!({
                "user_email": "new@example.com",
                "building_id": Uuid::new_v4(),
                "invite_id": invite.id
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(ctx.store.pending("new@example.com").await.is_none());
}

#[tokio::test]
async fn test_stage_pending_invite_normalizes_email() {
    let ctx = TestContext::new();
    let admin = ctx.sign_in("admin@example.com", PlatformRole::Admin).await;
    let building = ctx.store.seed_building("Herzl 12").await;
    let invite = ctx.seed_invite(building.id, admin.user.id).await;

    let response = ctx
        .app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/invites/pending",
            json!({
                "user_email": "New@Example.com",
                "building_id": building.id,
                "invite_id": invite.id
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["building_id"], building.id.to_string());
    assert!(ctx.store.pending("new@example.com").await.is_some());
}

// ============================================================================
// Documents
// ============================================================================

#[tokio::test]
async fn test_member_downloads_visible_document() {
    let ctx = TestContext::new();
    let tenant = ctx.sign_in("tenant@example.com", PlatformRole::Tenant).await;
    let building = ctx.store.seed_building("Herzl 12").await;
    ctx.store
        .seed_member(building.id, tenant.user.id, MemberRole::Tenant)
        .await;
    let document = ctx
        .store
        .seed_document(building.id, "herzl-12/minutes.pdf", true)
        .await;

    let response = ctx
        .app
        .clone()
        .oneshot(get_request_with_auth(
            &format!("/api/documents/{}/download", document.id),
            tenant.token(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert!(body["url"]
        .as_str()
        .unwrap()
        .contains("documents/herzl-12/minutes.pdf"));
    assert_eq!(body["expiresIn"], 3600);
}

#[tokio::test]
async fn test_hidden_document_requires_manager() {
    let ctx = TestContext::new();
    let tenant = ctx.sign_in("tenant@example.com", PlatformRole::Tenant).await;
    let committee = ctx.sign_in("committee@example.com", PlatformRole::Committee).await;
    let building = ctx.store.seed_building("Herzl 12").await;
    ctx.store
        .seed_member(building.id, tenant.user.id, MemberRole::Tenant)
        .await;
    ctx.store
        .seed_member(building.id, committee.user.id, MemberRole::Committee)
        .await;
    let document = ctx
        .store
        .seed_document(building.id, "herzl-12/budget.xlsx", false)
        .await;
    let uri = format!("/api/documents/{}/download", document.id);

    let response = ctx
        .app
        .clone()
        .oneshot(get_request_with_auth(&uri, tenant.token()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = ctx
        .app
        .clone()
        .oneshot(get_request_with_auth(&uri, committee.token()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_storage_failure_is_server_error() {
    let ctx = TestContext::with(MockIdentityProvider::new(), MockObjectStorage::failing());
    let admin = ctx.sign_in("admin@example.com", PlatformRole::Admin).await;
    let building = ctx.store.seed_building("Herzl 12").await;
    let document = ctx
        .store
        .seed_document(building.id, "herzl-12/minutes.pdf", true)
        .await;

    let response = ctx
        .app
        .clone()
        .oneshot(get_request_with_auth(
            &format!("/api/documents/{}/download", document.id),
            admin.token(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_malformed_document_id_returns_error_object() {
    let ctx = TestContext::new();
    let admin = ctx.sign_in("admin@example.com", PlatformRole::Admin).await;

    let response = ctx
        .app
        .clone()
        .oneshot(get_request_with_auth(
            "/api/documents/not-a-uuid/download",
            admin.token(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_response_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "validation_error");
}

// ============================================================================
// Profile
// ============================================================================

#[tokio::test]
async fn test_update_own_profile() {
    let ctx = TestContext::new();
    let tenant = ctx.sign_in("tenant@example.com", PlatformRole::Tenant).await;

    let response = ctx
        .app
        .clone()
        .oneshot(json_request_with_auth(
            Method::PATCH,
            "/api/profile",
            json!({ "full_name": "Dana Levi", "phone": "052-1234567" }),
            tenant.token(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let profile = ctx.store.profile(tenant.user.id).await.unwrap();
    assert_eq!(profile.full_name.as_deref(), Some("Dana Levi"));
    assert_eq!(profile.role, PlatformRole::Tenant);
}

#[tokio::test]
async fn test_me_requires_authentication() {
    let ctx = TestContext::new();

    let response = ctx.app.clone().oneshot(get_request("/api/me")).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_reports_identity_configuration() {
    let ctx = TestContext::unconfigured();

    let response = ctx
        .app
        .clone()
        .oneshot(get_request("/api/health"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["identity"]["session_configured"], true);
    assert_eq!(body["identity"]["admin_configured"], false);
}
