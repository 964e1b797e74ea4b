//! Flarum discussions over its JSON:API.

use super::{check_status, Forum};
use crate::config::ForumConfig;
use crate::error::{ReleaseError, Result};
use reqwest::blocking::Client;
use reqwest::header::AUTHORIZATION;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use tracing::debug;

/// JSON:API document creating a discussion with the given tags
pub fn discussion_body(title: &str, content: &str, tag_ids: &[String]) -> Value {
    let tags: Vec<Value> = tag_ids
        .iter()
        .map(|id| json!({ "type": "tags", "id": id }))
        .collect();

    json!({
        "data": {
            "type": "discussions",
            "attributes": {
                "title": title,
                "content": content,
            },
            "relationships": {
                "tags": { "data": tags },
            },
        }
    })
}

pub struct FlarumForum {
    client: Client,
    url: String,
    tag_ids: Vec<String>,
    token: SecretString,
}

impl FlarumForum {
    pub fn new(client: Client, config: &ForumConfig, token: SecretString) -> Self {
        FlarumForum {
            client,
            url: config.url.trim_end_matches('/').to_string(),
            tag_ids: config.tag_ids.clone(),
            token,
        }
    }
}

impl Forum for FlarumForum {
    fn create_discussion(&self, title: &str, content: &str) -> Result<()> {
        if self.url.is_empty() {
            return Err(ReleaseError::publish("forum.url is not configured"));
        }

        let url = format!("{}/api/discussions", self.url);
        debug!(url = %url, title, "creating discussion");

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, format!("Token {}", self.token.expose_secret()))
            .json(&discussion_body(title, content, &self.tag_ids))
            .send()?;
        check_status(response, "create discussion")?;
        Ok(())
    }
}
