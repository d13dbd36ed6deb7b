//! HTTP client for the hosted object store's signed-URL endpoint.

use std::time::Duration;

use async_trait::async_trait;
use domain::services::{ObjectStorage, StorageError};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::config::IdentityConfig;

/// Storage client sharing the identity provider's project URL and service key.
pub struct HostedStorageClient {
    client: Client,
    base_url: String,
    service_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SignedUrlResponse {
    #[serde(rename = "signedURL", alias = "signedUrl")]
    signed_url: String,
}

impl HostedStorageClient {
    pub fn new(config: &IdentityConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            service_key: config.service_key.clone().filter(|k| !k.is_empty()),
        })
    }

    fn encode_path(path: &str) -> String {
        path.trim_start_matches('/')
            .split('/')
            .map(|segment| {
                segment
                    .bytes()
                    .map(|b| match b {
                        b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                            (b as char).to_string()
                        }
                        other => format!("%{:02X}", other),
                    })
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("/")
    }
}

#[async_trait]
impl ObjectStorage for HostedStorageClient {
    async fn create_signed_url(
        &self,
        bucket: &str,
        path: &str,
        expires_in_secs: u64,
    ) -> Result<String, StorageError> {
        let key = self
            .service_key
            .as_deref()
            .filter(|_| !self.base_url.is_empty())
            .ok_or_else(|| StorageError::NotConfigured("storage service key".into()))?;

        let url = format!(
            "{}/storage/v1/object/sign/{}/{}",
            self.base_url,
            bucket,
            Self::encode_path(path)
        );

        let response = self
            .client
            .post(&url)
            .header("apikey", key)
            .bearer_auth(key)
            .json(&serde_json::json!({ "expiresIn": expires_in_secs }))
            .send()
            .await
            .map_err(|e| StorageError::Upstream(e.to_string()))?;

        match response.status() {
            status if status.is_success() => {}
            // The storage API reports missing objects as 400 or 404.
            StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST => {
                return Err(StorageError::NotFound(path.to_string()))
            }
            status => return Err(StorageError::Upstream(status.to_string())),
        }

        let body: SignedUrlResponse = response
            .json()
            .await
            .map_err(|e| StorageError::Upstream(format!("Malformed storage response: {}", e)))?;

        // The API returns a path relative to the storage root.
        if body.signed_url.starts_with("http") {
            Ok(body.signed_url)
        } else {
            Ok(format!("{}/storage/v1{}", self.base_url, body.signed_url))
        }
    }
}
