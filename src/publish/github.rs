//! GitHub Releases over the REST API.

use super::{check_status, CreatedRelease, ReleaseHost, ReleaseRequest};
use crate::config::GitHubConfig;
use crate::error::Result;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";

#[derive(Serialize)]
struct CreateReleaseBody<'a> {
    tag_name: &'a str,
    name: &'a str,
    body: &'a str,
    draft: bool,
    prerelease: bool,
}

#[derive(Deserialize)]
struct ReleaseResponse {
    id: u64,
    html_url: String,
    upload_url: String,
}

#[derive(Deserialize)]
struct AssetResponse {
    browser_download_url: String,
}

/// Drop the `{?name,label}` URI template GitHub appends to upload URLs
pub fn strip_upload_template(url: &str) -> &str {
    match url.find('{') {
        Some(index) => &url[..index],
        None => url,
    }
}

pub struct GitHubReleases {
    client: Client,
    api_url: String,
    repo: String,
    token: SecretString,
}

impl GitHubReleases {
    pub fn new(client: Client, config: &GitHubConfig, repo: impl Into<String>, token: SecretString) -> Self {
        GitHubReleases {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            repo: repo.into(),
            token,
        }
    }

    fn authorization(&self) -> String {
        format!("token {}", self.token.expose_secret())
    }
}

impl ReleaseHost for GitHubReleases {
    fn create_release(&self, request: &ReleaseRequest) -> Result<CreatedRelease> {
        let url = format!("{}/repos/{}/releases", self.api_url, self.repo);
        debug!(url = %url, tag = %request.tag_name, "creating release");

        let body = CreateReleaseBody {
            tag_name: &request.tag_name,
            name: &request.name,
            body: &request.body,
            draft: request.draft,
            prerelease: request.prerelease,
        };
        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, self.authorization())
            .header(ACCEPT, GITHUB_ACCEPT)
            .json(&body)
            .send()?;
        let release: ReleaseResponse = check_status(response, "create release")?.json()?;

        Ok(CreatedRelease {
            id: release.id,
            html_url: release.html_url,
            upload_url: strip_upload_template(&release.upload_url).to_string(),
        })
    }

    fn upload_asset(&self, release: &CreatedRelease, name: &str, data: Vec<u8>) -> Result<String> {
        debug!(release = release.id, asset = name, bytes = data.len(), "uploading asset");

        let response = self
            .client
            .post(&release.upload_url)
            .query(&[("name", name)])
            .header(AUTHORIZATION, self.authorization())
            .header(ACCEPT, GITHUB_ACCEPT)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(data)
            .send()?;
        let asset: AssetResponse = check_status(response, "upload asset")?.json()?;

        Ok(asset.browser_download_url)
    }
}
