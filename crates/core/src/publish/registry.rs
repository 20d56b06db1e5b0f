//! Sticker registry client.
//!
//! The registry records which sticker sets were built for which
//! (source id, option flags) pair.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::error::RegistryError;
use crate::job::{OptionFlags, RequesterId, SourceId};

/// Registry API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Base URL, e.g. `http://localhost:9000`
    pub base_url: String,
    /// Attempts per request (default: 3)
    #[serde(default = "default_retries")]
    pub retries: u32,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_retries() -> u32 {
    3
}

fn default_timeout() -> u64 {
    30
}

impl RegistryConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            retries: default_retries(),
            timeout_secs: default_timeout(),
        }
    }
}

/// A published set as stored by the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StickerRecord {
    pub sticker_id: SourceId,
    pub sticker_option_flag: u8,
    pub sticker_title: String,
    #[serde(rename = "registedDateTime")]
    pub registered_at: NaiveDateTime,
    /// Public `https://t.me/addstickers/...` link.
    pub url: String,
    pub user_id: RequesterId,
    pub user_name: String,
}

/// Lookup and registration of published sets.
#[async_trait]
pub trait StickerRegistry: Send + Sync {
    /// Returns the name of this registry implementation.
    fn name(&self) -> &str;

    /// Whether a set exists for `(source_id, flags)`.
    async fn exists(&self, source_id: SourceId, flags: OptionFlags) -> Result<bool, RegistryError>;

    /// Public URL of the set for `(source_id, flags)`.
    async fn sticker_url(
        &self,
        source_id: SourceId,
        flags: OptionFlags,
    ) -> Result<Option<String>, RegistryError>;

    /// Whether a set name is already in use.
    async fn name_taken(&self, name: &str) -> Result<bool, RegistryError>;

    /// Stores a newly published set.
    async fn register(&self, record: &StickerRecord) -> Result<(), RegistryError>;

    /// URL of an existing set, or `None` if there is none.
    async fn existing_url(
        &self,
        source_id: SourceId,
        flags: OptionFlags,
    ) -> Result<Option<String>, RegistryError> {
        if self.exists(source_id, flags).await? {
            self.sticker_url(source_id, flags).await
        } else {
            Ok(None)
        }
    }
}

#[derive(Debug, Deserialize)]
struct ExistsResponse {
    #[serde(default)]
    exists: bool,
}

#[derive(Debug, Deserialize)]
struct UrlResponse {
    url: Option<String>,
}

/// Registry client over its HTTP JSON API.
pub struct HttpRegistry {
    client: Client,
    config: RegistryConfig,
}

impl HttpRegistry {
    pub fn new(config: RegistryConfig) -> Result<Self, RegistryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    fn base(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    fn sticker_endpoint(&self, source_id: SourceId, flags: OptionFlags, endpoint: &str) -> String {
        format!(
            "{}/stickers/{}/{}/{}",
            self.base(),
            source_id,
            flags.bits(),
            endpoint
        )
    }

    /// Sends the request built by `build`, retrying transport errors and
    /// server errors. A 404 yields `None`.
    async fn send_with_retry<F>(&self, build: F) -> Result<Option<Response>, RegistryError>
    where
        F: Fn(&Client) -> reqwest::RequestBuilder,
    {
        let attempts = self.config.retries.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            let result = match build(&self.client).send().await {
                Ok(response) if response.status() == StatusCode::NOT_FOUND => Ok(None),
                Ok(response) if response.status().is_success() => Ok(Some(response)),
                Ok(response) => {
                    let status = response.status().as_u16();
                    let message = response.text().await.unwrap_or_default();
                    Err(RegistryError::ApiError { status, message })
                }
                Err(e) => Err(RegistryError::Http(e)),
            };
            match result {
                Err(e) if e.is_retryable() && attempt < attempts => {
                    warn!(attempt, attempts, error = %e, "Registry request failed, retrying");
                }
                other => return other,
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>, RegistryError> {
        debug!(url, "Registry GET");
        match self.send_with_retry(|c| c.get(url)).await? {
            Some(response) => Ok(Some(response.json().await?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl StickerRegistry for HttpRegistry {
    fn name(&self) -> &str {
        "http"
    }

    async fn exists(&self, source_id: SourceId, flags: OptionFlags) -> Result<bool, RegistryError> {
        let url = self.sticker_endpoint(source_id, flags, "exists");
        Ok(self
            .get_json::<ExistsResponse>(&url)
            .await?
            .map(|r| r.exists)
            .unwrap_or(false))
    }

    async fn sticker_url(
        &self,
        source_id: SourceId,
        flags: OptionFlags,
    ) -> Result<Option<String>, RegistryError> {
        let url = self.sticker_endpoint(source_id, flags, "url");
        Ok(self.get_json::<UrlResponse>(&url).await?.and_then(|r| r.url))
    }

    async fn name_taken(&self, name: &str) -> Result<bool, RegistryError> {
        let url = format!("{}/stickers/checkurl", self.base());
        debug!(name, "Registry name check");
        let response = self
            .send_with_retry(|c| c.get(&url).query(&[("url", name)]))
            .await?;
        match response {
            Some(response) => Ok(response.json::<ExistsResponse>().await?.exists),
            None => Ok(false),
        }
    }

    async fn register(&self, record: &StickerRecord) -> Result<(), RegistryError> {
        let url = format!("{}/stickers/", self.base());
        debug!(source_id = record.sticker_id, url = %record.url, "Registering sticker set");
        match self.send_with_retry(|c| c.post(&url).json(record)).await? {
            Some(_) => Ok(()),
            None => Err(RegistryError::ApiError {
                status: 404,
                message: "registration endpoint not found".to_string(),
            }),
        }
    }
}
