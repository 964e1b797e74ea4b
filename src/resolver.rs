//! Base tag selection and next version derivation.

use crate::boundary::BoundaryWarning;
use crate::config::{ReleaseConfig, TagFallbackPolicy};
use crate::domain::{ChannelTagPattern, ParsedCommit, ReleaseVersion, Tag};
use crate::error::{ReleaseError, Result};
use crate::git::{CommitInfo, HistoryProvider};
use chrono::NaiveDateTime;
use tracing::{debug, info};

/// Outcome of resolving a channel against history
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Tag the release is computed from; `None` when the repository has no tags
    pub base_tag: Option<Tag>,
    /// Coded commits since the base tag, newest first. Commits whose subject
    /// carries no classification code are dropped here.
    pub commits: Vec<CommitInfo>,
    pub should_build: bool,
    /// Set only when `should_build` is true
    pub new_version: Option<ReleaseVersion>,
    /// A sensitive path changed since the base tag
    pub restart_required: bool,
    pub warnings: Vec<BoundaryWarning>,
}

impl Resolution {
    pub fn base_tag_name(&self) -> Option<&str> {
        self.base_tag.as_ref().map(|t| t.name.as_str())
    }
}

/// Finds the base tag for a channel and decides whether a release is due.
pub struct VersionResolver<'a, R: HistoryProvider> {
    history: &'a R,
    tag_fallback: TagFallbackPolicy,
    sensitive_paths: Vec<String>,
}

impl<'a, R: HistoryProvider> VersionResolver<'a, R> {
    pub fn new(history: &'a R, config: &ReleaseConfig) -> Self {
        VersionResolver {
            history,
            tag_fallback: config.tag_fallback,
            sensitive_paths: config.sensitive_paths.clone(),
        }
    }

    /// Select the newest channel tag, applying the fallback policy when none matches.
    pub fn select_base(&self, channel: &str) -> Result<(Option<Tag>, Vec<BoundaryWarning>)> {
        let pattern = ChannelTagPattern::new(channel)?;
        let tags = self.history.list_tags_by_creation()?;
        debug!(count = tags.len(), channel, "listed tags");

        if let Some(tag) = pattern.newest_match(&tags) {
            return Ok((Some(tag.clone()), Vec::new()));
        }

        let Some(latest) = tags.last() else {
            return Ok((None, vec![BoundaryWarning::NoTags]));
        };

        match self.tag_fallback {
            TagFallbackPolicy::Latest => {
                let warning = BoundaryWarning::ChannelTagFallback {
                    channel: channel.to_string(),
                    fallback: latest.name.clone(),
                };
                Ok((Some(latest.clone()), vec![warning]))
            }
            TagFallbackPolicy::Error => Err(ReleaseError::tag(format!(
                "No tag matches channel '{}' and tag_fallback is 'error'",
                channel
            ))),
        }
    }

    /// Whether any path under a sensitive prefix changed since `base_tag`
    pub fn restart_required(&self, base_tag: Option<&str>) -> Result<bool> {
        let changed = self.history.changed_paths_since(base_tag)?;
        Ok(changed.iter().any(|path| {
            self.sensitive_paths
                .iter()
                .any(|prefix| path.starts_with(prefix.as_str()))
        }))
    }

    /// Resolve `channel` against history.
    ///
    /// Pure with respect to the workspace: the new version is computed from
    /// `base_version` but nothing is written.
    pub fn resolve(
        &self,
        channel: &str,
        base_version: &semver::Version,
        now: NaiveDateTime,
    ) -> Result<Resolution> {
        let (base_tag, mut warnings) = self.select_base(channel)?;
        let base_name = base_tag.as_ref().map(|t| t.name.as_str());

        let all_commits = self.history.commits_since(base_name)?;
        let total = all_commits.len();
        let commits: Vec<CommitInfo> = all_commits
            .into_iter()
            .filter(|c| ParsedCommit::parse(&c.message).is_some())
            .collect();
        info!(
            base = base_name.unwrap_or("<none>"),
            commits = total,
            coded = commits.len(),
            "resolved base tag"
        );

        if commits.is_empty() {
            let base_tag_name = base_name.unwrap_or("<none>").to_string();
            warnings.push(if total == 0 {
                BoundaryWarning::NoNewCommits {
                    base_tag: base_tag_name,
                    current_commit_hash: self.history.head_hash()?,
                }
            } else {
                BoundaryWarning::NoCodedCommits {
                    base_tag: base_tag_name,
                    skipped: total,
                }
            });
            return Ok(Resolution {
                base_tag,
                commits,
                should_build: false,
                new_version: None,
                restart_required: false,
                warnings,
            });
        }

        let restart_required = self.restart_required(base_name)?;
        let new_version = ReleaseVersion::next(base_version, channel, now)?;

        Ok(Resolution {
            base_tag,
            commits,
            should_build: true,
            new_version: Some(new_version),
            restart_required,
            warnings,
        })
    }
}
