use crate::error::{ReleaseError, Result};
use chrono::NaiveDateTime;
use std::fmt;

/// Timestamp layout appended to every release version.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M";

/// A channel release version: `<major.minor.patch>-<channel>.<YYYYMMDD_HHMM>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseVersion {
    pub base: semver::Version,
    pub channel: String,
    pub timestamp: NaiveDateTime,
}

impl ReleaseVersion {
    /// Derive the next version from the declared base version.
    ///
    /// Any pre-release or build metadata on `base` is dropped, so a manifest
    /// left bumped by an earlier failed run yields the same base again.
    pub fn next(base: &semver::Version, channel: &str, now: NaiveDateTime) -> Result<Self> {
        if channel.is_empty() {
            return Err(ReleaseError::version("channel must not be empty"));
        }

        Ok(ReleaseVersion {
            base: semver::Version::new(base.major, base.minor, base.patch),
            channel: channel.to_string(),
            timestamp: now,
        })
    }

    /// Parse the declared base version (e.g. a manifest `versionName`).
    pub fn parse_base(declared: &str) -> Result<semver::Version> {
        semver::Version::parse(declared.trim()).map_err(|e| {
            ReleaseError::version(format!("Invalid base version '{}': {}", declared, e))
        })
    }

    /// The `YYYYMMDD_HHMM` suffix.
    pub fn stamp(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}.{}", self.base, self.channel, self.stamp())
    }
}
