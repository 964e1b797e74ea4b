//! Rendering of the classified changelog into the feed record, the long-form
//! document and the restricted caption variant.

use crate::classifier::Changelog;
use crate::config::Config;
use crate::domain::{Flavor, ReleaseVersion};
use crate::error::{ReleaseError, Result};
use chrono::NaiveDateTime;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Date layout used in the feed record and the document.
pub const RELEASE_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const FEED_FILE_NAME: &str = "index.json";
pub const DOCUMENT_FILE_NAME: &str = "README.md";

/// Characters escaped in the restricted variant.
const MARKUP_CHARS: &[char] = &['#'];
const TRUNCATION_MARKER: &str = "...";

/// Update feed consumed by the in-app update checker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedRecord {
    pub version: String,
    /// Always 0
    pub code: i32,
    pub log: String,
    pub date: String,
}

impl FeedRecord {
    /// Serialize with four-space indentation
    pub fn to_json(&self) -> Result<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut serializer)?;
        String::from_utf8(buf).map_err(|e| {
            ReleaseError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })
    }
}

/// Both rendered forms of one release's changelog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedChangelog {
    pub feed: FeedRecord,
    pub document: String,
}

impl RenderedChangelog {
    /// Write `index.json` and `README.md` into `dist_dir`, creating it if needed.
    pub fn write_to(&self, dist_dir: &Path) -> Result<(PathBuf, PathBuf)> {
        fs::create_dir_all(dist_dir)?;

        let feed_path = dist_dir.join(FEED_FILE_NAME);
        fs::write(&feed_path, self.feed.to_json()?)?;

        let document_path = dist_dir.join(DOCUMENT_FILE_NAME);
        fs::write(&document_path, &self.document)?;

        Ok((feed_path, document_path))
    }
}

/// Renders changelogs for one repository and flavor set.
#[derive(Debug, Clone)]
pub struct ChangelogRenderer {
    repo: String,
    github_web_url: String,
    storage_public_url: String,
    flavors: Vec<Flavor>,
    extension: String,
    restart_notice: String,
}

impl ChangelogRenderer {
    pub fn new(config: &Config, flavors: Vec<Flavor>) -> Self {
        ChangelogRenderer {
            repo: config.release.repo.clone(),
            github_web_url: config.github.web_url.trim_end_matches('/').to_string(),
            storage_public_url: config.storage.public_url.trim_end_matches('/').to_string(),
            flavors,
            extension: config.build.artifact_extension.clone(),
            restart_notice: config.changelog.restart_notice.clone(),
        }
    }

    /// Section listing shared by the feed record and the document
    pub fn log_body(changelog: &Changelog) -> String {
        let mut out = String::new();
        for section in &changelog.sections {
            let _ = writeln!(out, "## {}", section.title);
            for entry in &section.entries {
                let _ = writeln!(out, "- {}", entry);
            }
        }
        out
    }

    pub fn github_download_url(&self, version: &ReleaseVersion, flavor: &Flavor) -> String {
        format!(
            "{}/{}/releases/download/{}/{}",
            self.github_web_url,
            self.repo,
            version,
            flavor.signed_file_name(&self.extension)
        )
    }

    pub fn storage_download_url(&self, version: &ReleaseVersion, flavor: &Flavor) -> String {
        format!(
            "{}/{}/{}",
            self.storage_public_url,
            version.channel,
            flavor.published_file_name(&version.to_string(), &self.extension)
        )
    }

    pub fn render(
        &self,
        changelog: &Changelog,
        version: &ReleaseVersion,
        released_at: NaiveDateTime,
        restart_required: bool,
    ) -> RenderedChangelog {
        let log = Self::log_body(changelog);
        let date = released_at.format(RELEASE_DATE_FORMAT).to_string();

        let mut document = String::from("# Downloads\n");
        for flavor in &self.flavors {
            let _ = writeln!(
                document,
                " - [GitHub {}]({})",
                flavor,
                self.github_download_url(version, flavor)
            );
            let _ = writeln!(
                document,
                " - [Cloud {}]({})",
                flavor,
                self.storage_download_url(version, flavor)
            );
        }
        if restart_required {
            document.push_str("# Restart required\n");
            let _ = writeln!(document, " - {}", self.restart_notice);
        }
        document.push_str("# Changelog\n");
        let _ = writeln!(document, " - Version: {}", version);
        let _ = writeln!(document, " - Released: {}", date);
        document.push_str(&log);

        RenderedChangelog {
            feed: FeedRecord {
                version: version.to_string(),
                code: 0,
                log,
                date,
            },
            document,
        }
    }
}

fn heading_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^##[ \t]*(.+)$").ok()).as_ref()
}

fn bullet_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^- (.*)$").ok()).as_ref()
}

/// Escape markup characters in one pass; already escaped ones are kept as-is.
///
/// A markup character counts as escaped only when an odd run of backslashes
/// precedes it, so `\\#` (an escaped backslash) still gets its `#` escaped.
pub fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut backslashes = 0usize;

    for c in text.chars() {
        if c == '\\' {
            backslashes += 1;
        } else {
            if MARKUP_CHARS.contains(&c) && backslashes % 2 == 0 {
                out.push('\\');
            }
            backslashes = 0;
        }
        out.push(c);
    }

    out
}

/// Cut `text` to at most `max_chars` characters, ending with `...` when cut.
///
/// Limits shorter than the marker cut without it.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars < TRUNCATION_MARKER.len() {
        return text.chars().take(max_chars).collect();
    }

    let keep = max_chars - TRUNCATION_MARKER.len();
    let mut out: String = text.chars().take(keep).collect();
    // An odd trailing run of backslashes would escape the marker.
    let trailing = out.chars().rev().take_while(|&c| c == '\\').count();
    if trailing % 2 == 1 {
        out.pop();
    }
    out.push_str(TRUNCATION_MARKER);
    out
}

/// Variant of the long-form document for targets with stricter markup rules.
///
/// Second-level headings become bold, bullets become block quotes, `#` is
/// escaped, and the result is capped at `max_chars` characters.
pub fn to_restricted_markdown(text: &str, max_chars: usize) -> String {
    let mut out = text.to_string();

    if let Some(heading) = heading_regex() {
        out = heading.replace_all(&out, "**${1}**").into_owned();
    }
    if let Some(bullet) = bullet_regex() {
        out = bullet.replace_all(&out, "> ${1}").into_owned();
    }

    truncate_chars(&escape_markup(&out), max_chars)
}
