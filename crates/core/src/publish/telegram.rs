//! Telegram Bot API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use super::error::PublishError;
use super::traits::{StickerInput, StickerPublisher};
use crate::job::RequesterId;
use crate::notify::{Notice, Notifier};

/// Telegram bot configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// User that owns every created set.
    pub owner_user_id: i64,
    /// Bot username; set names end in `_by_<tag>`.
    pub sticker_tag: String,
    /// Appended to every set title.
    #[serde(default)]
    pub title_suffix: String,
    /// Emoji attached to every sticker (default: 🌸)
    #[serde(default = "default_emoji")]
    pub emoji: String,
    /// Chat that receives an announcement per published set.
    #[serde(default)]
    pub announce_chat_id: Option<i64>,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Upload timeout in seconds (default: 60)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_emoji() -> String {
    "\u{1F338}".to_string()
}

fn default_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_timeout() -> u64 {
    60
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    error_code: Option<i64>,
    #[serde(default)]
    description: Option<String>,
}

/// Bot API client used for sticker sets and chat messages.
pub struct TelegramClient {
    client: Client,
    config: TelegramConfig,
}

impl TelegramClient {
    pub fn new(config: TelegramConfig) -> Result<Self, PublishError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.bot_token,
            method
        )
    }

    async fn call(&self, method: &str, form: Form) -> Result<(), PublishError> {
        debug!(method, "Bot API call");
        let response = self
            .client
            .post(self.method_url(method))
            .multipart(form)
            .send()
            .await?;
        let status = response.status();
        let body: ApiResponse = response.json().await?;
        if body.ok {
            return Ok(());
        }
        Err(PublishError::api(
            body.error_code.unwrap_or(status.as_u16() as i64),
            body.description.unwrap_or_default(),
        ))
    }

    /// Attaches the sticker file as `field` and returns its InputSticker JSON.
    async fn attach(
        form: Form,
        field: &str,
        sticker: &StickerInput,
    ) -> Result<(Form, serde_json::Value), PublishError> {
        let bytes = tokio::fs::read(&sticker.path).await?;
        let file_name = sticker
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| field.to_string());
        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(sticker.format.mime())?;
        let input = json!({
            "sticker": format!("attach://{}", field),
            "format": sticker.format.as_str(),
            "emoji_list": [sticker.emoji],
        });
        Ok((form.part(field.to_string(), part), input))
    }

    /// Sends a plain text message to `chat_id`.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), PublishError> {
        let form = Form::new()
            .text("chat_id", chat_id.to_string())
            .text("text", text.to_string());
        self.call("sendMessage", form).await
    }
}

#[async_trait]
impl StickerPublisher for TelegramClient {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn create_set(
        &self,
        owner_id: i64,
        name: &str,
        title: &str,
        stickers: &[StickerInput],
    ) -> Result<(), PublishError> {
        let mut form = Form::new()
            .text("user_id", owner_id.to_string())
            .text("name", name.to_string())
            .text("title", title.to_string());
        let mut inputs = Vec::with_capacity(stickers.len());
        for (i, sticker) in stickers.iter().enumerate() {
            let (next, input) = Self::attach(form, &format!("file{}", i), sticker).await?;
            form = next;
            inputs.push(input);
        }
        let form = form.text("stickers", serde_json::Value::Array(inputs).to_string());
        self.call("createNewStickerSet", form).await
    }

    async fn add_sticker(
        &self,
        owner_id: i64,
        name: &str,
        sticker: &StickerInput,
    ) -> Result<(), PublishError> {
        let form = Form::new()
            .text("user_id", owner_id.to_string())
            .text("name", name.to_string());
        let (form, input) = Self::attach(form, "file0", sticker).await?;
        let form = form.text("sticker", input.to_string());
        self.call("addStickerToSet", form).await
    }

    async fn delete_set(&self, name: &str) -> Result<(), PublishError> {
        let form = Form::new().text("name", name.to_string());
        self.call("deleteStickerSet", form).await
    }
}

#[async_trait]
impl Notifier for TelegramClient {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn notify(&self, requester_id: RequesterId, notice: &Notice) {
        if let Err(e) = self.send_message(requester_id, &notice.to_string()).await {
            warn!(requester_id, error = %e, "Failed to deliver notice");
        }
    }

    async fn announce(&self, text: &str) {
        let Some(chat_id) = self.config.announce_chat_id else {
            return;
        };
        if let Err(e) = self.send_message(chat_id, text).await {
            warn!(chat_id, error = %e, "Failed to post announcement");
        }
    }
}
