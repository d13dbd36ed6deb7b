//! HTTP client for the hosted identity provider (GoTrue-compatible REST API).
//!
//! Session endpoints authenticate with the public anon key; `/admin`
//! endpoints require the service key.

use std::time::Duration;

use async_trait::async_trait;
use domain::services::{IdentityError, IdentityProvider, IdentityUser, NewIdentityUser, Session};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::IdentityConfig;

/// Page size used when scanning accounts by email.
const USERS_PAGE_SIZE: u32 = 200;

/// Upper bound on pages scanned in one lookup.
const MAX_USER_PAGES: u32 = 500;

pub struct HostedIdentityClient {
    client: Client,
    base_url: String,
    anon_key: String,
    service_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserList {
    #[serde(default)]
    users: Vec<IdentityUser>,
}

#[derive(Debug, Serialize)]
struct CreateUserBody<'a> {
    email: &'a str,
    password: &'a str,
    email_confirm: bool,
    user_metadata: &'a serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(alias = "msg", alias = "error_description", alias = "message")]
    msg: Option<String>,
}

impl HostedIdentityClient {
    pub fn new(config: &IdentityConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            service_key: config.service_key.clone().filter(|k| !k.is_empty()),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.base_url, path)
    }

    fn public(&self, builder: RequestBuilder) -> Result<RequestBuilder, IdentityError> {
        if self.base_url.is_empty() || self.anon_key.is_empty() {
            return Err(IdentityError::NotConfigured("identity url or anon key".into()));
        }
        Ok(builder.header("apikey", &self.anon_key))
    }

    fn admin(&self, builder: RequestBuilder) -> Result<RequestBuilder, IdentityError> {
        let key = self
            .service_key
            .as_deref()
            .filter(|_| !self.base_url.is_empty())
            .ok_or_else(|| IdentityError::NotConfigured("identity service key".into()))?;
        Ok(builder.header("apikey", key).bearer_auth(key))
    }

    async fn send(builder: RequestBuilder) -> Result<Response, IdentityError> {
        builder
            .send()
            .await
            .map_err(|e| IdentityError::Upstream(e.to_string()))
    }

    /// Maps non-success statuses onto [`IdentityError`].
    async fn check(response: Response) -> Result<Response, IdentityError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let detail = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|b| b.msg)
            .unwrap_or_else(|| status.to_string());

        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => IdentityError::InvalidCredentials,
            StatusCode::BAD_REQUEST if detail.to_lowercase().contains("refresh token") => {
                IdentityError::InvalidCredentials
            }
            StatusCode::NOT_FOUND => IdentityError::NotFound,
            StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY
                if detail.to_lowercase().contains("already") =>
            {
                IdentityError::AlreadyExists(detail)
            }
            _ => IdentityError::Upstream(format!("{}: {}", status, detail)),
        })
    }

    async fn json<T: for<'de> Deserialize<'de>>(response: Response) -> Result<T, IdentityError> {
        response
            .json::<T>()
            .await
            .map_err(|e| IdentityError::Upstream(format!("Malformed provider response: {}", e)))
    }

    async fn token_grant(
        &self,
        grant_type: &str,
        body: serde_json::Value,
    ) -> Result<Session, IdentityError> {
        let request = self.public(
            self.client
                .post(self.url("/token"))
                .query(&[("grant_type", grant_type)])
                .json(&body),
        )?;
        let response = Self::check(Self::send(request).await?).await?;
        Self::json(response).await
    }
}

#[async_trait]
impl IdentityProvider for HostedIdentityClient {
    fn admin_configured(&self) -> bool {
        !self.base_url.is_empty() && self.service_key.is_some()
    }

    async fn get_user(&self, access_token: &str) -> Result<IdentityUser, IdentityError> {
        let request = self.public(self.client.get(self.url("/user")).bearer_auth(access_token))?;
        let response = Self::check(Self::send(request).await?).await?;
        Self::json(response).await
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, IdentityError> {
        self.token_grant(
            "refresh_token",
            serde_json::json!({ "refresh_token": refresh_token }),
        )
        .await
    }

    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: Option<&str>,
    ) -> Result<Session, IdentityError> {
        self.token_grant(
            "pkce",
            serde_json::json!({ "auth_code": code, "code_verifier": code_verifier }),
        )
        .await
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError> {
        let request =
            self.public(self.client.post(self.url("/logout")).bearer_auth(access_token))?;
        Self::check(Self::send(request).await?).await?;
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<IdentityUser>, IdentityError> {
        let wanted = shared::validation::normalize_email(email);

        for page in 1..=MAX_USER_PAGES {
            let request = self.admin(
                self.client
                    .get(self.url("/admin/users"))
                    .query(&[("page", page), ("per_page", USERS_PAGE_SIZE)]),
            )?;
            let response = Self::check(Self::send(request).await?).await?;
            let list: UserList = Self::json(response).await?;

            let found = list.users.iter().find(|u| {
                u.email
                    .as_deref()
                    .is_some_and(|e| shared::validation::normalize_email(e) == wanted)
            });
            if let Some(user) = found {
                return Ok(Some(user.clone()));
            }
            if list.users.len() < USERS_PAGE_SIZE as usize {
                return Ok(None);
            }
        }

        warn!(pages = MAX_USER_PAGES, "Account scan hit page limit");
        Ok(None)
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> Result<Option<IdentityUser>, IdentityError> {
        let request = self.admin(self.client.get(self.url(&format!("/admin/users/{}", user_id))))?;
        match Self::check(Self::send(request).await?).await {
            Ok(response) => Self::json(response).await.map(Some),
            Err(IdentityError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn create_user(&self, user: NewIdentityUser) -> Result<IdentityUser, IdentityError> {
        let body = CreateUserBody {
            email: &user.email,
            password: &user.password,
            email_confirm: user.email_confirmed,
            user_metadata: &user.user_metadata,
        };
        let request = self.admin(self.client.post(self.url("/admin/users")).json(&body))?;
        let response = Self::check(Self::send(request).await?).await?;
        let created: IdentityUser = Self::json(response).await?;
        debug!(user_id = %created.id, "Identity account created");
        Ok(created)
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<(), IdentityError> {
        let request =
            self.admin(self.client.delete(self.url(&format!("/admin/users/{}", user_id))))?;
        Self::check(Self::send(request).await?).await?;
        Ok(())
    }

    async fn send_recovery_email(&self, email: &str, redirect_to: &str) -> Result<(), IdentityError> {
        let request = self.admin(
            self.client
                .post(self.url("/recover"))
                .query(&[("redirect_to", redirect_to)])
                .json(&serde_json::json!({ "email": email })),
        )?;
        Self::check(Self::send(request).await?).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(service_key: Option<&str>) -> IdentityConfig {
        IdentityConfig {
            url: "https://auth.example.com/".to_string(),
            anon_key: "anon".to_string(),
            service_key: service_key.map(str::to_string),
            timeout_ms: 1000,
        }
    }

    #[test]
    fn test_url_building_trims_slash() {
        let client = HostedIdentityClient::new(&config(None)).unwrap();
        assert_eq!(client.url("/user"), "https://auth.example.com/auth/v1/user");
    }

    #[test]
    fn test_admin_configured_requires_service_key() {
        assert!(!HostedIdentityClient::new(&config(None)).unwrap().admin_configured());
        assert!(!HostedIdentityClient::new(&config(Some(""))).unwrap().admin_configured());
        assert!(HostedIdentityClient::new(&config(Some("svc"))).unwrap().admin_configured());
    }

    #[tokio::test]
    async fn test_admin_call_without_key_is_not_configured() {
        let client = HostedIdentityClient::new(&config(None)).unwrap();
        let err = client.delete_user(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, IdentityError::NotConfigured(_)));
    }

    #[tokio::test]
    async fn test_session_call_without_anon_key_is_not_configured() {
        let client = HostedIdentityClient::new(&IdentityConfig {
            anon_key: String::new(),
            ..config(None)
        })
        .unwrap();
        let err = client.get_user("token").await.unwrap_err();
        assert!(matches!(err, IdentityError::NotConfigured(_)));
    }
}
