//! Common test utilities for integration tests.
//!
//! The router runs over the in-memory store, identity provider and object
//! storage from the domain crate, so no external services are needed.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request},
    Router,
};
use building_manager_api::{
    app::create_app,
    config::{
        Config, DatabaseConfig, IdentityConfig, LoggingConfig, OnboardingConfig, SecurityConfig,
        ServerConfig, SessionConfig, StorageConfig,
    },
};
use domain::models::{BuildingInvite, NewBuildingInvite, PlatformRole, Profile};
use domain::services::{
    BuildingStore, IdentityProvider, IdentityUser, InMemoryStore, MockIdentityProvider,
    MockObjectStorage, ObjectStorage, Session,
};
use fake::faker::name::en::Name;
use fake::Fake;
use uuid::Uuid;

pub const ACCESS_COOKIE: &str = "bm-access-token";
pub const REFRESH_COOKIE: &str = "bm-refresh-token";

/// Test configuration pointing at no real services.
pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            request_timeout_secs: 30,
            app_base_url: "http://localhost:3000".to_string(),
        },
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout_secs: 5,
            idle_timeout_secs: 60,
        },
        logging: LoggingConfig {
            level: "warn".to_string(),
            format: "compact".to_string(),
        },
        security: SecurityConfig {
            cors_origins: vec![],
        },
        identity: IdentityConfig {
            url: "http://identity.test".to_string(),
            anon_key: "anon".to_string(),
            service_key: Some("service".to_string()),
            timeout_ms: 1000,
        },
        storage: StorageConfig::default(),
        session: SessionConfig {
            secure: false,
            ..SessionConfig::default()
        },
        onboarding: OnboardingConfig::default(),
    }
}

/// Router plus handles on its backends for seeding and assertions.
pub struct TestContext {
    pub app: Router,
    pub store: Arc<InMemoryStore>,
    pub identity: Arc<MockIdentityProvider>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with(MockIdentityProvider::new(), MockObjectStorage::new())
    }

    /// Identity provider without the admin service key.
    pub fn unconfigured() -> Self {
        Self::with(MockIdentityProvider::unconfigured(), MockObjectStorage::new())
    }

    pub fn with(identity: MockIdentityProvider, storage: MockObjectStorage) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let identity = Arc::new(identity);
        let app = create_app(
            test_config(),
            store.clone() as Arc<dyn BuildingStore>,
            identity.clone() as Arc<dyn IdentityProvider>,
            Arc::new(storage) as Arc<dyn ObjectStorage>,
        );
        Self {
            app,
            store,
            identity,
        }
    }

    /// Account, profile and live session for a user with `role`.
    pub async fn sign_in(&self, email: &str, role: PlatformRole) -> SignedInUser {
        let user = self.identity.seed_user(email).await;
        let profile = self.store.seed_profile_for(user.id, role).await;
        let session = self
            .identity
            .issue_session(user.id)
            .await
            .expect("seeded user has a session");
        SignedInUser {
            user,
            profile,
            session,
        }
    }

    /// Open-ended invite link for `building_id`.
    pub async fn seed_invite(&self, building_id: Uuid, created_by: Uuid) -> BuildingInvite {
        self.store
            .insert_building_invite(NewBuildingInvite {
                building_id,
                expires_at: None,
                max_uses: None,
                created_by,
            })
            .await
            .expect("invite inserted")
    }
}

pub struct SignedInUser {
    pub user: IdentityUser,
    pub profile: Profile,
    pub session: Session,
}

impl SignedInUser {
    pub fn token(&self) -> &str {
        &self.session.access_token
    }

    pub fn cookie_header(&self) -> String {
        format!(
            "{}={}; {}={}",
            ACCESS_COOKIE, self.session.access_token, REFRESH_COOKIE, self.session.refresh_token
        )
    }
}

/// Random display name for request bodies.
pub fn fake_full_name() -> String {
    Name().fake()
}

/// Build a JSON request with authentication.
pub fn json_request_with_auth(
    method: Method,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

/// Build a JSON request without credentials.
pub fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

/// Build a GET request with authentication.
pub fn get_request_with_auth(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

/// Build a DELETE request with authentication.
pub fn delete_request_with_auth(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

/// Build a request carrying a raw `Cookie` header.
pub fn request_with_cookies(method: Method, uri: &str, cookies: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::COOKIE, cookies)
        .body(Body::empty())
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Helper to parse JSON response body.
pub async fn parse_response_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null)
}

/// All `Set-Cookie` values of a response.
pub fn set_cookies(response: &axum::response::Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok().map(str::to_string))
        .collect()
}

pub fn location(response: &axum::response::Response) -> Option<String> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
