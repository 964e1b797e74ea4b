//! Build manifest access: the `versionName "<value>"` declaration in the
//! Gradle build script.

use crate::domain::ReleaseVersion;
use crate::error::{ReleaseError, Result};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

const VERSION_NAME_PATTERN: &str = r#"versionName\s+"([^"]*)""#;

/// A build script loaded into memory.
#[derive(Debug, Clone)]
pub struct BuildManifest {
    path: PathBuf,
    content: String,
}

fn version_name_regex() -> Result<Regex> {
    Regex::new(VERSION_NAME_PATTERN)
        .map_err(|e| ReleaseError::manifest(format!("Invalid versionName pattern: {}", e)))
}

impl BuildManifest {
    /// Read the manifest from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ReleaseError::manifest(format!("Cannot read {}: {}", path.display(), e))
        })?;

        Ok(BuildManifest {
            path: path.to_path_buf(),
            content,
        })
    }

    /// Wrap already loaded content
    pub fn from_content(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        BuildManifest {
            path: path.into(),
            content: content.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// The first declared `versionName` value
    pub fn version_name(&self) -> Result<String> {
        version_name_regex()?
            .captures(&self.content)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| {
                ReleaseError::manifest(format!(
                    "No versionName declaration in {}",
                    self.path.display()
                ))
            })
    }

    /// The declared base semantic version
    pub fn base_version(&self) -> Result<semver::Version> {
        ReleaseVersion::parse_base(&self.version_name()?)
    }

    /// Manifest text with every `versionName` replaced by `version`
    pub fn render_with(&self, version: &ReleaseVersion) -> Result<String> {
        let re = version_name_regex()?;
        if !re.is_match(&self.content) {
            return Err(ReleaseError::manifest(format!(
                "No versionName declaration in {}",
                self.path.display()
            )));
        }

        let replacement = format!("versionName \"{}\"", version);
        Ok(re
            .replace_all(&self.content, regex::NoExpand(&replacement))
            .into_owned())
    }

    /// Rewrite the manifest in place with `version`.
    ///
    /// Not undone if a later stage fails.
    pub fn commit_version(&mut self, version: &ReleaseVersion) -> Result<()> {
        let updated = self.render_with(version)?;
        fs::write(&self.path, &updated)?;
        self.content = updated;
        Ok(())
    }
}
