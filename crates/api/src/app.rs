use axum::{
    middleware,
    routing::{delete, get, patch, post},
    Router,
};
use domain::services::{
    BuildingStore, IdentityProvider, ObjectStorage, Onboarding, OnboardingSettings,
};
use shared::locale::{localized, Locale};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{metrics_handler, metrics_middleware, session_middleware, trace_id};
use crate::routes::{admin_users, auth, documents, health, invites, profile};
use crate::services::CookieHelper;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn BuildingStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub storage: Arc<dyn ObjectStorage>,
    pub cookies: CookieHelper,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        store: Arc<dyn BuildingStore>,
        identity: Arc<dyn IdentityProvider>,
        storage: Arc<dyn ObjectStorage>,
    ) -> Self {
        let cookies = CookieHelper::new(config.session.clone());
        Self {
            config,
            store,
            identity,
            storage,
            cookies,
        }
    }

    /// Orchestrator bound to this state's store and identity provider.
    pub fn onboarding(&self) -> Onboarding<'_> {
        Onboarding::new(
            self.store.as_ref(),
            self.identity.as_ref(),
            onboarding_settings(&self.config),
        )
    }
}

/// Settings derived from configuration for the onboarding flows.
pub fn onboarding_settings(config: &Config) -> OnboardingSettings {
    OnboardingSettings {
        temp_password_length: config.onboarding.temp_password_length,
        recovery_redirect_url: format!(
            "{}{}",
            config.server.app_base_url.trim_end_matches('/'),
            localized(Locale::default(), "/reset-password")
        ),
    }
}

pub fn create_app(
    config: Config,
    store: Arc<dyn BuildingStore>,
    identity: Arc<dyn IdentityProvider>,
    storage: Arc<dyn ObjectStorage>,
) -> Router {
    let config = Arc::new(config);
    let state = AppState::new(config.clone(), store, identity, storage);

    let cors = if config.security.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Admin endpoints; authorization happens in the `Authorized` extractor.
    let admin_routes = Router::new()
        .route("/api/admin/create-user", post(admin_users::create_user))
        .route("/api/admin/delete-user", delete(admin_users::delete_user))
        .route("/api/admin/update-role", post(admin_users::update_role))
        .route("/api/admin/sagas", get(admin_users::list_sagas));

    let member_routes = Router::new()
        .route("/api/me", get(profile::get_me))
        .route("/api/profile", patch(profile::update_profile))
        .route(
            "/api/buildings/:building_id/invites",
            post(invites::create_building_invite).get(invites::list_building_invites),
        )
        .route(
            "/api/buildings/:building_id/invites/:invite_id",
            delete(invites::deactivate_building_invite),
        )
        .route(
            "/api/documents/:document_id/download",
            get(documents::download_document),
        );

    let public_routes = Router::new()
        .route("/api/invites/pending", post(invites::stage_pending_invite))
        .route("/api/invites/:invite_id", get(invites::get_public_invite))
        .route("/auth/callback", get(auth::callback))
        .route("/auth/signout", post(auth::signout))
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(member_routes)
        .merge(admin_routes)
        // Page paths are served elsewhere; unmatched requests still pass the
        // session guard so protected pages redirect.
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
