//! Distribution of a signed release to every target.
//!
//! Each target sits behind a small trait so the coordinator can be driven by
//! in-memory fakes:
//! - [`ReleaseHost`] - code-hosting release plus its assets
//! - [`ObjectStore`] - flat file storage for the feed, document and binaries
//! - [`Messenger`] - chat announcement carrying one binary per message
//! - [`Forum`] - discussion thread, stable channel only
//!
//! Failures of a single call are recorded in the [`PublishReport`] and the
//! coordinator moves on. Nothing here aborts the run.

pub mod forum;
pub mod github;
pub mod storage;
pub mod telegram;

pub use forum::FlarumForum;
pub use github::GitHubReleases;
pub use storage::AlistStorage;
pub use telegram::TelegramMessenger;

use crate::changelog::{to_restricted_markdown, RenderedChangelog};
use crate::domain::{ReleaseArtifact, ReleaseVersion};
use crate::error::{ReleaseError, Result};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Release creation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseRequest {
    pub tag_name: String,
    pub name: String,
    pub body: String,
    pub draft: bool,
    pub prerelease: bool,
}

/// Release returned by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedRelease {
    pub id: u64,
    pub html_url: String,
    /// Upload endpoint with any URI template already stripped
    pub upload_url: String,
}

pub trait ReleaseHost {
    fn create_release(&self, request: &ReleaseRequest) -> Result<CreatedRelease>;

    /// Upload one asset, returning its download URL
    fn upload_asset(&self, release: &CreatedRelease, name: &str, data: Vec<u8>) -> Result<String>;
}

pub trait ObjectStore {
    /// Store `data` at `path`, relative to the store's configured root
    fn put(&self, path: &str, data: Vec<u8>) -> Result<()>;
}

pub trait Messenger {
    fn send_document(&self, file_name: &str, data: Vec<u8>, caption: &str) -> Result<()>;
}

pub trait Forum {
    fn create_discussion(&self, title: &str, content: &str) -> Result<()>;
}

/// Blocking HTTP client shared by the production targets
pub fn http_client(timeout: Duration) -> Result<reqwest::blocking::Client> {
    Ok(reqwest::blocking::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("flavor-release/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Turn a non-success response into a publish error carrying the body
pub(crate) fn check_status(
    response: reqwest::blocking::Response,
    what: &str,
) -> Result<reqwest::blocking::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(ReleaseError::publish(format!("{} returned {}: {}", what, status, body)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishTarget {
    ReleaseHost,
    ObjectStore,
    Messenger,
    Forum,
}

impl fmt::Display for PublishTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PublishTarget::ReleaseHost => "release host",
            PublishTarget::ObjectStore => "object store",
            PublishTarget::Messenger => "messenger",
            PublishTarget::Forum => "forum",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Succeeded { url: Option<String> },
    Failed { reason: String },
    Skipped { reason: String },
}

/// Outcome of one call against one target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRecord {
    pub target: PublishTarget,
    /// What was published: the release, an asset name, a storage path
    pub item: String,
    pub outcome: PublishOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub records: Vec<PublishRecord>,
}

impl PublishReport {
    fn push(&mut self, target: PublishTarget, item: impl Into<String>, outcome: PublishOutcome) {
        let item = item.into();
        match &outcome {
            PublishOutcome::Succeeded { url } => {
                info!(target_name = %target, item = %item, url = url.as_deref().unwrap_or(""), "published")
            }
            PublishOutcome::Failed { reason } => {
                warn!(target_name = %target, item = %item, reason = %reason, "publish failed")
            }
            PublishOutcome::Skipped { reason } => {
                info!(target_name = %target, item = %item, reason = %reason, "skipped")
            }
        }
        self.records.push(PublishRecord {
            target,
            item,
            outcome,
        });
    }

    fn record(&mut self, target: PublishTarget, item: impl Into<String>, result: Result<Option<String>>) {
        let outcome = match result {
            Ok(url) => PublishOutcome::Succeeded { url },
            Err(e) => PublishOutcome::Failed {
                reason: e.to_string(),
            },
        };
        self.push(target, item, outcome);
    }

    pub fn extend(&mut self, other: PublishReport) {
        self.records.extend(other.records);
    }

    pub fn for_target(&self, target: PublishTarget) -> impl Iterator<Item = &PublishRecord> {
        self.records.iter().filter(move |r| r.target == target)
    }

    pub fn failures(&self) -> impl Iterator<Item = &PublishRecord> {
        self.records
            .iter()
            .filter(|r| matches!(r.outcome, PublishOutcome::Failed { .. }))
    }

    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// Everything the coordinator distributes for one release
#[derive(Debug, Clone)]
pub struct ReleaseBundle {
    pub version: ReleaseVersion,
    pub stable: bool,
    pub changelog: RenderedChangelog,
    /// Rendered feed and document files in the dist directory
    pub documents: Vec<PathBuf>,
    pub artifacts: Vec<ReleaseArtifact>,
}

pub struct PublishCoordinator<'a> {
    release_host: &'a dyn ReleaseHost,
    store: &'a dyn ObjectStore,
    messenger: &'a dyn Messenger,
    forum: &'a dyn Forum,
    max_caption_chars: usize,
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| ReleaseError::publish(format!("Cannot read {}: {}", path.display(), e)))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn published_name(bundle: &ReleaseBundle, artifact: &ReleaseArtifact) -> String {
    artifact
        .flavor
        .published_file_name(&bundle.version.to_string(), &artifact.extension())
}

impl<'a> PublishCoordinator<'a> {
    pub fn new(
        release_host: &'a dyn ReleaseHost,
        store: &'a dyn ObjectStore,
        messenger: &'a dyn Messenger,
        forum: &'a dyn Forum,
        max_caption_chars: usize,
    ) -> Self {
        PublishCoordinator {
            release_host,
            store,
            messenger,
            forum,
            max_caption_chars,
        }
    }

    /// Create the hosted release with its assets, then mirror everything to storage.
    pub fn publish(&self, bundle: &ReleaseBundle) -> PublishReport {
        let mut report = PublishReport::default();
        let tag = bundle.version.to_string();

        let request = ReleaseRequest {
            tag_name: tag.clone(),
            name: tag.clone(),
            body: bundle.changelog.feed.log.clone(),
            draft: false,
            prerelease: !bundle.stable,
        };

        match self.release_host.create_release(&request) {
            Ok(release) => {
                report.push(
                    PublishTarget::ReleaseHost,
                    &tag,
                    PublishOutcome::Succeeded {
                        url: Some(release.html_url.clone()),
                    },
                );
                for artifact in &bundle.artifacts {
                    let name = artifact.file_name();
                    let result = read_file(&artifact.path)
                        .and_then(|data| self.release_host.upload_asset(&release, &name, data))
                        .map(Some);
                    report.record(PublishTarget::ReleaseHost, name, result);
                }
            }
            Err(e) => {
                report.push(
                    PublishTarget::ReleaseHost,
                    &tag,
                    PublishOutcome::Failed {
                        reason: e.to_string(),
                    },
                );
                for artifact in &bundle.artifacts {
                    report.push(
                        PublishTarget::ReleaseHost,
                        artifact.file_name(),
                        PublishOutcome::Skipped {
                            reason: "release was not created".to_string(),
                        },
                    );
                }
            }
        }

        let channel = &bundle.version.channel;
        let mut uploads: Vec<(String, &Path)> = bundle
            .documents
            .iter()
            .map(|path| (format!("{}/{}", channel, file_name(path)), path.as_path()))
            .collect();
        uploads.extend(bundle.artifacts.iter().map(|artifact| {
            (
                format!("{}/{}", channel, published_name(bundle, artifact)),
                artifact.path.as_path(),
            )
        }));

        for (remote, local) in uploads {
            let result = read_file(local)
                .and_then(|data| self.store.put(&remote, data))
                .map(|_| None);
            report.record(PublishTarget::ObjectStore, remote, result);
        }

        report
    }

    /// Announce the release on the forum (stable only) and the messenger.
    pub fn notify(&self, bundle: &ReleaseBundle) -> PublishReport {
        let mut report = PublishReport::default();
        let title = bundle.version.to_string();

        if bundle.stable {
            let result = self
                .forum
                .create_discussion(&title, &bundle.changelog.document)
                .map(|_| None);
            report.record(PublishTarget::Forum, &title, result);
        } else {
            report.push(
                PublishTarget::Forum,
                &title,
                PublishOutcome::Skipped {
                    reason: format!("channel '{}' is not stable", bundle.version.channel),
                },
            );
        }

        let caption = to_restricted_markdown(&bundle.changelog.document, self.max_caption_chars);
        for artifact in &bundle.artifacts {
            let name = published_name(bundle, artifact);
            let result = read_file(&artifact.path)
                .and_then(|data| self.messenger.send_document(&name, data, &caption))
                .map(|_| None);
            report.record(PublishTarget::Messenger, name, result);
        }

        report
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    //! In-memory targets recording every call.

    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct FakeReleaseHost {
        pub fail_create: bool,
        pub fail_asset: Option<String>,
        pub requests: Mutex<Vec<ReleaseRequest>>,
        pub assets: Mutex<Vec<(String, Vec<u8>)>>,
    }

    impl ReleaseHost for FakeReleaseHost {
        fn create_release(&self, request: &ReleaseRequest) -> Result<CreatedRelease> {
            self.requests.lock().unwrap().push(request.clone());
            if self.fail_create {
                return Err(ReleaseError::publish("release host unavailable"));
            }
            Ok(CreatedRelease {
                id: 1,
                html_url: format!("https://host.test/releases/{}", request.tag_name),
                upload_url: "https://uploads.host.test/releases/1/assets".to_string(),
            })
        }

        fn upload_asset(&self, _release: &CreatedRelease, name: &str, data: Vec<u8>) -> Result<String> {
            if self.fail_asset.as_deref() == Some(name) {
                return Err(ReleaseError::publish(format!("{} rejected", name)));
            }
            self.assets.lock().unwrap().push((name.to_string(), data));
            Ok(format!("https://host.test/download/{}", name))
        }
    }

    #[derive(Default)]
    pub struct FakeStore {
        pub fail_path: Option<String>,
        pub puts: Mutex<Vec<String>>,
    }

    impl ObjectStore for FakeStore {
        fn put(&self, path: &str, _data: Vec<u8>) -> Result<()> {
            if self.fail_path.as_deref() == Some(path) {
                return Err(ReleaseError::publish("storage quota exceeded"));
            }
            self.puts.lock().unwrap().push(path.to_string());
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct FakeMessenger {
        pub sent: Mutex<Vec<(String, String)>>,
    }

    impl Messenger for FakeMessenger {
        fn send_document(&self, file_name: &str, _data: Vec<u8>, caption: &str) -> Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push((file_name.to_string(), caption.to_string()));
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct FakeForum {
        pub discussions: Mutex<Vec<(String, String)>>,
    }

    impl Forum for FakeForum {
        fn create_discussion(&self, title: &str, content: &str) -> Result<()> {
            self.discussions
                .lock()
                .unwrap()
                .push((title.to_string(), content.to_string()));
            Ok(())
        }
    }
}
