//! Stage sequencing for one release run.
//!
//! Resolve, then stop early when there is nothing new. Otherwise commit the
//! version to the manifest, classify, render, build and sign, optionally tag,
//! then publish and notify. Fatal errors bubble up as [`ReleaseError`]; publish
//! failures are only recorded in the report.

use crate::boundary::BoundaryWarning;
use crate::build::{ArtifactSigner, BuildDriver, BuildExecutor};
use crate::changelog::ChangelogRenderer;
use crate::classifier::{Changelog, CommitClassifier};
use crate::config::Config;
use crate::credentials::{Credentials, FORUM_TOKEN, GITHUB_TOKEN, MESSAGING_TOKEN, STORAGE_TOKEN};
use crate::domain::{Flavor, ParsedCommit, ReleaseArtifact, ReleaseVersion};
use crate::error::{ReleaseError, Result};
use crate::git::HistoryProvider;
use crate::manifest::BuildManifest;
use crate::publish::{PublishCoordinator, PublishReport, ReleaseBundle};
use crate::resolver::{Resolution, VersionResolver};
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Remote the release tag is pushed to
pub const TAG_REMOTE: &str = "origin";

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub channel: String,
    /// Render into the dist directory only
    pub dry_run: bool,
    /// Tag HEAD with the version and push it before publishing
    pub push_tag: bool,
    pub now: NaiveDateTime,
}

/// What a run produced
#[derive(Debug, Clone)]
pub struct ReleaseSummary {
    pub version: ReleaseVersion,
    pub base_tag: Option<String>,
    pub commit_count: usize,
    pub changelog: Changelog,
    pub restart_required: bool,
    pub documents: Vec<PathBuf>,
    pub artifacts: Vec<ReleaseArtifact>,
    pub report: PublishReport,
    pub tagged: bool,
    pub warnings: Vec<BoundaryWarning>,
}

#[derive(Debug, Clone)]
pub enum RunOutcome {
    NothingToRelease {
        base_tag: Option<String>,
        warnings: Vec<BoundaryWarning>,
    },
    DryRun(ReleaseSummary),
    Released(ReleaseSummary),
}

/// Everything a run needs, injected at construction.
pub struct Pipeline<'a, R: HistoryProvider> {
    config: &'a Config,
    workspace: PathBuf,
    history: &'a R,
    credentials: &'a Credentials,
    builder: &'a dyn BuildExecutor,
    signer: &'a dyn ArtifactSigner,
    publisher: PublishCoordinator<'a>,
}

impl<'a, R: HistoryProvider> Pipeline<'a, R> {
    pub fn new(
        config: &'a Config,
        workspace: impl Into<PathBuf>,
        history: &'a R,
        credentials: &'a Credentials,
        builder: &'a dyn BuildExecutor,
        signer: &'a dyn ArtifactSigner,
        publisher: PublishCoordinator<'a>,
    ) -> Self {
        Pipeline {
            config,
            workspace: workspace.into(),
            history,
            credentials,
            builder,
            signer,
            publisher,
        }
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    fn dist_dir(&self) -> PathBuf {
        self.workspace.join(&self.config.build.dist_dir)
    }

    /// Tokens every publish target needs; checked before the manifest is touched.
    fn check_credentials(&self, stable: bool) -> Result<()> {
        let mut required = vec![GITHUB_TOKEN, STORAGE_TOKEN, MESSAGING_TOKEN];
        if stable && !self.config.forum.url.is_empty() {
            required.push(FORUM_TOKEN);
        }
        for name in required {
            self.credentials.require(name)?;
        }
        self.credentials.signing()?;
        Ok(())
    }

    pub fn run(&self, options: &RunOptions) -> Result<RunOutcome> {
        self.config.changelog.validate()?;

        let mut manifest = BuildManifest::load(self.workspace.join(&self.config.build.manifest))?;
        let base_version = manifest.base_version()?;

        info!(stage = "resolve", channel = %options.channel, "starting");
        let resolution = VersionResolver::new(self.history, &self.config.release).resolve(
            &options.channel,
            &base_version,
            options.now,
        )?;
        for warning in &resolution.warnings {
            warn!("{}", warning);
        }

        let version = match (&resolution.new_version, resolution.should_build) {
            (Some(version), true) => version.clone(),
            _ => {
                info!(stage = "resolve", "nothing to release");
                return Ok(RunOutcome::NothingToRelease {
                    base_tag: resolution.base_tag_name().map(str::to_string),
                    warnings: resolution.warnings,
                });
            }
        };
        info!(stage = "resolve", version = %version, commits = resolution.commits.len(), "release due");

        if options.dry_run {
            let summary = self.render_only(&resolution, &version)?;
            return Ok(RunOutcome::DryRun(summary));
        }

        let stable = self.config.is_stable(&options.channel);
        self.config.validate_for_release()?;
        self.check_credentials(stable)?;

        info!(stage = "commit-manifest", manifest = %manifest.path().display(), "writing version");
        manifest.commit_version(&version)?;

        match self.release(&resolution, &version, stable, options) {
            Ok(summary) => Ok(RunOutcome::Released(summary)),
            Err(e) => {
                let bumped = BoundaryWarning::ManifestLeftBumped {
                    manifest: manifest.path().display().to_string(),
                    version: version.to_string(),
                };
                warn!("{}", bumped);
                Err(e)
            }
        }
    }

    fn classify(&self, resolution: &Resolution, warnings: &mut Vec<BoundaryWarning>) -> Changelog {
        let parsed = ParsedCommit::parse_all(resolution.commits.iter().map(|c| c.message.as_str()));
        let classification = CommitClassifier::new(&self.config.changelog.categories).classify(&parsed);

        if classification.unmatched > 0 {
            let warning = BoundaryWarning::UnclassifiedCommits {
                count: classification.unmatched,
            };
            warn!("{}", warning);
            warnings.push(warning);
        }
        info!(
            stage = "classify",
            parsed = parsed.len(),
            entries = classification.changelog.entry_count(),
            "classified commits"
        );
        classification.changelog
    }

    fn summary(
        &self,
        resolution: &Resolution,
        version: &ReleaseVersion,
        warnings: Vec<BoundaryWarning>,
        changelog: Changelog,
        documents: Vec<PathBuf>,
    ) -> ReleaseSummary {
        ReleaseSummary {
            version: version.clone(),
            base_tag: resolution.base_tag_name().map(str::to_string),
            commit_count: resolution.commits.len(),
            changelog,
            restart_required: resolution.restart_required,
            documents,
            artifacts: Vec::new(),
            report: PublishReport::default(),
            tagged: false,
            warnings,
        }
    }

    fn render_only(&self, resolution: &Resolution, version: &ReleaseVersion) -> Result<ReleaseSummary> {
        let mut warnings = resolution.warnings.clone();
        let changelog = self.classify(resolution, &mut warnings);

        let flavors = Flavor::from_names(&self.config.build.flavors);
        let rendered = ChangelogRenderer::new(self.config, flavors).render(
            &changelog,
            version,
            version.timestamp,
            resolution.restart_required,
        );
        let (feed, document) = rendered.write_to(&self.dist_dir())?;
        info!(stage = "render", dist = %self.dist_dir().display(), "dry run rendered");

        Ok(self.summary(resolution, version, warnings, changelog, vec![feed, document]))
    }

    fn release(
        &self,
        resolution: &Resolution,
        version: &ReleaseVersion,
        stable: bool,
        options: &RunOptions,
    ) -> Result<ReleaseSummary> {
        let mut warnings = resolution.warnings.clone();
        let changelog = self.classify(resolution, &mut warnings);

        let flavors = Flavor::from_names(&self.config.build.flavors);
        let rendered = ChangelogRenderer::new(self.config, flavors.clone()).render(
            &changelog,
            version,
            options.now,
            resolution.restart_required,
        );
        let (feed, document) = rendered.write_to(&self.dist_dir())?;
        info!(stage = "render", "changelog written");

        info!(stage = "build", flavors = flavors.len(), "building");
        let artifacts = BuildDriver::new(
            self.builder,
            self.signer,
            self.credentials,
            &self.workspace,
            &self.config.build,
        )
        .build_and_sign(&flavors)?;

        let bundle = ReleaseBundle {
            version: version.clone(),
            stable,
            changelog: rendered,
            documents: vec![feed, document],
            artifacts,
        };

        // The tag must be on the remote before the release host sees the version.
        let tagged = if options.push_tag {
            let name = version.to_string();
            info!(stage = "tag", tag = %name, remote = TAG_REMOTE, "tagging release");
            self.history.create_tag(&name)?;
            self.history
                .push_tag(TAG_REMOTE, &name)
                .map_err(|e| ReleaseError::tag(format!("Cannot push tag '{}': {}", name, e)))?;
            true
        } else {
            false
        };

        info!(stage = "publish", "publishing");
        let mut report = self.publisher.publish(&bundle);
        info!(stage = "notify", "notifying");
        report.extend(self.publisher.notify(&bundle));

        let mut summary = self.summary(resolution, version, warnings, changelog, bundle.documents);
        summary.artifacts = bundle.artifacts;
        summary.report = report;
        summary.tagged = tagged;
        Ok(summary)
    }
}
