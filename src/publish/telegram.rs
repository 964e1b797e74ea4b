//! Telegram Bot API `sendDocument`.

use super::{check_status, Messenger};
use crate::config::MessagingConfig;
use crate::error::{ReleaseError, Result};
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

/// Caption markup dialect matching the restricted changelog
const PARSE_MODE: &str = "MarkdownV2";

#[derive(Deserialize)]
struct BotResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

pub struct TelegramMessenger {
    client: Client,
    api_url: String,
    chat_id: String,
    token: SecretString,
}

impl TelegramMessenger {
    pub fn new(client: Client, config: &MessagingConfig, token: SecretString) -> Self {
        TelegramMessenger {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            chat_id: config.chat_id.clone(),
            token,
        }
    }
}

impl Messenger for TelegramMessenger {
    fn send_document(&self, file_name: &str, data: Vec<u8>, caption: &str) -> Result<()> {
        debug!(chat = %self.chat_id, document = file_name, "sending document");

        // The token is part of the path; keep it out of error messages.
        let url = format!(
            "{}/bot{}/sendDocument",
            self.api_url,
            self.token.expose_secret()
        );
        let form = Form::new()
            .text("chat_id", self.chat_id.clone())
            .text("caption", caption.to_string())
            .text("parse_mode", PARSE_MODE)
            .part("document", Part::bytes(data).file_name(file_name.to_string()));

        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .map_err(|e| e.without_url())?;
        let reply: BotResponse = check_status(response, "sendDocument")?
            .json()
            .map_err(|e| e.without_url())?;

        if !reply.ok {
            return Err(ReleaseError::publish(format!(
                "sendDocument rejected: {}",
                reply.description.unwrap_or_default()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_parsing() {
        let reply: BotResponse =
            serde_json::from_str(r#"{"ok":false,"error_code":400,"description":"Bad Request: can't parse entities"}"#)
                .unwrap();
        assert!(!reply.ok);
        assert!(reply.description.unwrap().contains("can't parse"));

        let reply: BotResponse = serde_json::from_str(r#"{"ok":true,"result":{}}"#).unwrap();
        assert!(reply.ok);
    }
}
