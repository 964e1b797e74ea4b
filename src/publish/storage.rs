//! AList-compatible object storage (`PUT /api/fs/put`).

use super::{check_status, ObjectStore};
use crate::config::StorageConfig;
use crate::error::{ReleaseError, Result};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::blocking::Client;
use reqwest::header::AUTHORIZATION;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

/// Everything except unreserved characters is encoded, `/` included.
const FILE_PATH: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

#[derive(Deserialize)]
struct PutResponse {
    code: i64,
    #[serde(default)]
    message: String,
}

/// Encoded `File-Path` header value for `path` under `root`
pub fn encode_file_path(root: &str, path: &str) -> String {
    let root = root.trim_end_matches('/');
    let full = if root.is_empty() {
        format!("/{}", path.trim_start_matches('/'))
    } else {
        format!("{}/{}", root, path.trim_start_matches('/'))
    };
    utf8_percent_encode(&full, FILE_PATH).to_string()
}

pub struct AlistStorage {
    client: Client,
    endpoint: String,
    root: String,
    token: SecretString,
}

impl AlistStorage {
    pub fn new(client: Client, config: &StorageConfig, token: SecretString) -> Self {
        AlistStorage {
            client,
            endpoint: config.endpoint.clone(),
            root: config.root.clone(),
            token,
        }
    }
}

impl ObjectStore for AlistStorage {
    fn put(&self, path: &str, data: Vec<u8>) -> Result<()> {
        let file_path = encode_file_path(&self.root, path);
        debug!(endpoint = %self.endpoint, file_path = %file_path, bytes = data.len(), "storing");

        let response = self
            .client
            .put(&self.endpoint)
            .header(AUTHORIZATION, self.token.expose_secret())
            .header("File-Path", file_path)
            .header("As-Task", "true")
            .body(data)
            .send()?;
        let ack: PutResponse = check_status(response, "storage put")?.json()?;

        if ack.code != 200 {
            return Err(ReleaseError::publish(format!(
                "storage put {} rejected ({}): {}",
                path, ack.code, ack.message
            )));
        }
        Ok(())
    }
}
