//! Delivery of rendered artifacts to the messaging channel

use crate::{
    config::TelegramConfig,
    constants::USER_AGENT,
    error::{ConfigError, PublishError},
    render::Artifact,
};
use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, StatusCode,
};
use std::time::Duration;

/// Trait for artifact sinks
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Delivers `artifact` with `caption`.
    ///
    /// Returns `false` on any failure; failures are logged here and the
    /// caller must not treat the post as done.
    async fn publish(&self, artifact: &Artifact, caption: &str) -> bool;

    /// Returns the name of this publisher
    fn publisher_name(&self) -> &'static str;
}

/// Posts to a chat through the Telegram Bot API
pub struct TelegramPublisher {
    client: Client,
    api_url: String,
    bot_token: String,
    chat_id: String,
    parse_mode: String,
}

impl TelegramPublisher {
    pub fn new(config: &TelegramConfig, timeout: Duration) -> Result<Self, ConfigError> {
        let bot_token = config
            .bot_token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingField {
                field: "TELEGRAM_BOT_TOKEN",
            })?;
        let chat_id = config
            .chat_id
            .clone()
            .filter(|c| !c.is_empty())
            .ok_or(ConfigError::MissingField {
                field: "TELEGRAM_CHAT_ID",
            })?;

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ConfigError::invalid("telegram", e.to_string()))?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            bot_token,
            chat_id,
            parse_mode: config.parse_mode.clone(),
        })
    }

    /// Contains the bot token; never log it
    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.bot_token, method)
    }

    async fn send(&self, artifact: &Artifact, caption: &str) -> Result<(), PublishError> {
        let request = match artifact {
            Artifact::Text(_) => self.client.post(self.method_url("sendMessage")).form(&[
                ("chat_id", self.chat_id.as_str()),
                ("text", caption),
                ("parse_mode", self.parse_mode.as_str()),
            ]),
            Artifact::Image { png, .. } => {
                let photo = Part::bytes(png.clone())
                    .file_name("price.png")
                    .mime_str("image/png")?;
                let form = Form::new()
                    .text("chat_id", self.chat_id.clone())
                    .text("caption", caption.to_string())
                    .text("parse_mode", self.parse_mode.clone())
                    .part("photo", photo);
                self.client.post(self.method_url("sendPhoto")).multipart(form)
            }
        };

        // strip the URL, it carries the token
        let response = request.send().await.map_err(|e| e.without_url())?;

        if response.status() != StatusCode::OK {
            return Err(PublishError::Status {
                status: response.status().as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl Publisher for TelegramPublisher {
    async fn publish(&self, artifact: &Artifact, caption: &str) -> bool {
        match self.send(artifact, caption).await {
            Ok(()) => {
                tracing::info!(kind = artifact.kind(), "Message sent to Telegram");
                true
            }
            Err(e) => {
                tracing::error!(kind = artifact.kind(), error = %e, "Telegram delivery failed");
                false
            }
        }
    }

    fn publisher_name(&self) -> &'static str {
        "telegram"
    }
}

/// Logs artifacts instead of sending them
#[derive(Debug, Default)]
pub struct DryRunPublisher;

#[async_trait]
impl Publisher for DryRunPublisher {
    async fn publish(&self, artifact: &Artifact, caption: &str) -> bool {
        let bytes = match artifact {
            Artifact::Text(_) => 0,
            Artifact::Image { png, .. } => png.len(),
        };
        tracing::info!(kind = artifact.kind(), bytes, caption, "Dry run, not sending");
        true
    }

    fn publisher_name(&self) -> &'static str {
        "dry-run"
    }
}
